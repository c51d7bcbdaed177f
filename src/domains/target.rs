//! `Target` domain: discovery and session attachment.
//!
//! Attaching with `flatten: true` yields a [`SessionId`] that every other
//! facade accepts through `with_session`.

// ============================================================================
// Imports
// ============================================================================

use serde::{Deserialize, Serialize};

use crate::client::{Connection, Subscription};
use crate::error::Result;
use crate::identifiers::{SessionId, TargetId};

use super::Domain;

// ============================================================================
// Types
// ============================================================================

/// Description of a debuggable target.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TargetInfo {
    pub target_id: TargetId,

    /// `page`, `iframe`, `worker`, `browser` and so on.
    #[serde(rename = "type")]
    pub kind: String,

    pub title: String,
    pub url: String,

    /// Whether some client is attached.
    pub attached: bool,

    pub opener_id: Option<TargetId>,
    pub browser_context_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct GetTargetsResult {
    target_infos: Vec<TargetInfo>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AttachToTargetParams<'a> {
    target_id: &'a TargetId,
    flatten: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct AttachToTargetResult {
    session_id: SessionId,
}

/// Payload of `Target.attachedToTarget`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AttachedToTarget {
    pub session_id: SessionId,
    pub target_info: TargetInfo,
    pub waiting_for_debugger: bool,
}

/// Payload of `Target.detachedFromTarget`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DetachedFromTarget {
    pub session_id: SessionId,
    pub target_id: Option<TargetId>,
}

/// Payload of `Target.targetCreated`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TargetCreated {
    pub target_info: TargetInfo,
}

// ============================================================================
// Target
// ============================================================================

/// `Target` domain facade.
#[derive(Debug, Clone)]
pub struct Target {
    domain: Domain,
}

impl Target {
    /// Domain name on the wire.
    pub const NAME: &'static str = "Target";

    /// Creates an unscoped facade.
    #[must_use]
    pub fn new(connection: &Connection) -> Self {
        Self {
            domain: Domain::new(connection.clone(), Self::NAME),
        }
    }

    /// Returns a copy bound to `session`.
    #[must_use]
    pub fn with_session(&self, session: impl Into<Option<SessionId>>) -> Self {
        Self {
            domain: self.domain.with_session(session),
        }
    }

    /// Returns the underlying domain helper.
    #[inline]
    #[must_use]
    pub fn domain(&self) -> &Domain {
        &self.domain
    }
}

// ============================================================================
// Target - Commands
// ============================================================================

impl Target {
    /// Turns `targetCreated` and related notifications on or off.
    ///
    /// # Errors
    ///
    /// Propagates connection and protocol errors.
    pub async fn set_discover_targets(&self, discover: bool) -> Result<()> {
        self.domain
            .exec_with("setDiscoverTargets", &serde_json::json!({ "discover": discover }))
            .await
    }

    /// Lists available targets.
    ///
    /// # Errors
    ///
    /// Propagates connection and protocol errors.
    pub async fn get_targets(&self) -> Result<Vec<TargetInfo>> {
        let result: GetTargetsResult = self.domain.call("getTargets").await?;
        Ok(result.target_infos)
    }

    /// Attaches to `target_id` in flat mode and returns the new session.
    ///
    /// # Errors
    ///
    /// Propagates connection and protocol errors.
    pub async fn attach_to_target(&self, target_id: &TargetId) -> Result<SessionId> {
        let params = AttachToTargetParams {
            target_id,
            flatten: true,
        };
        let result: AttachToTargetResult = self.domain.call_with("attachToTarget", &params).await?;
        Ok(result.session_id)
    }

    /// Detaches `session_id`.
    ///
    /// # Errors
    ///
    /// Propagates connection and protocol errors.
    pub async fn detach_from_target(&self, session_id: &SessionId) -> Result<()> {
        self.domain
            .exec_with("detachFromTarget", &serde_json::json!({ "sessionId": session_id }))
            .await
    }
}

// ============================================================================
// Target - Events
// ============================================================================

impl Target {
    /// Subscribes to `Target.attachedToTarget`.
    pub fn on_attached_to_target<F>(&self, handler: F) -> Subscription
    where
        F: Fn(AttachedToTarget) + Send + Sync + 'static,
    {
        self.domain.on("attachedToTarget", handler)
    }

    /// Subscribes to `Target.detachedFromTarget`.
    pub fn on_detached_from_target<F>(&self, handler: F) -> Subscription
    where
        F: Fn(DetachedFromTarget) + Send + Sync + 'static,
    {
        self.domain.on("detachedFromTarget", handler)
    }

    /// Subscribes to `Target.targetCreated`.
    pub fn on_target_created<F>(&self, handler: F) -> Subscription
    where
        F: Fn(TargetCreated) + Send + Sync + 'static,
    {
        self.domain.on("targetCreated", handler)
    }
}

// ============================================================================
// Tests
// ============================================================================
