//! `Page` domain: navigation and document lifecycle.

// ============================================================================
// Imports
// ============================================================================

use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::client::{Connection, Subscription};
use crate::error::Result;
use crate::identifiers::SessionId;

use super::Domain;

// ============================================================================
// Types
// ============================================================================

/// Parameters for `Page.navigate`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NavigateParams {
    /// URL to navigate to.
    pub url: String,

    /// Referrer URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub referrer: Option<String>,

    /// Intended transition type, e.g. `typed` or `link`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transition_type: Option<String>,

    /// Frame to navigate; the main frame if absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frame_id: Option<String>,
}

impl NavigateParams {
    /// Navigates the main frame to `url`.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }
}

/// Result of `Page.navigate`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NavigateResult {
    /// Frame that navigated.
    pub frame_id: String,

    /// Loader id; absent for same-document navigations.
    pub loader_id: Option<String>,

    /// Set when the navigation failed, e.g. `net::ERR_NAME_NOT_RESOLVED`.
    pub error_text: Option<String>,
}

/// Parameters for `Page.reload`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ReloadParams {
    /// Bypass the cache.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ignore_cache: Option<bool>,

    /// Script injected into every frame after reload.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub script_to_evaluate_on_load: Option<String>,
}

/// A frame in the page's frame tree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Frame {
    pub id: String,
    pub parent_id: Option<String>,
    pub loader_id: String,
    pub name: Option<String>,
    pub url: String,
    pub security_origin: String,
    pub mime_type: String,
}

/// Payload of `Page.loadEventFired`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadEventFired {
    /// Monotonic time in seconds.
    pub timestamp: f64,
}

/// Payload of `Page.domContentEventFired`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DomContentEventFired {
    /// Monotonic time in seconds.
    pub timestamp: f64,
}

/// Payload of `Page.frameNavigated`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameNavigated {
    pub frame: Frame,

    /// `Navigation` or `BackForwardCacheRestore`.
    #[serde(rename = "type")]
    pub kind: String,
}

// ============================================================================
// Page
// ============================================================================

/// `Page` domain facade.
#[derive(Debug, Clone)]
pub struct Page {
    domain: Domain,
}

impl Page {
    /// Domain name on the wire.
    pub const NAME: &'static str = "Page";

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
// Page - Commands
// ============================================================================

impl Page {
    /// Enables page notifications.
    ///
    /// # Errors
    ///
    /// Propagates connection and protocol errors.
    pub async fn enable(&self) -> Result<()> {
        self.domain.exec("enable").await
    }

    /// Navigates the main frame to `url`.
    ///
    /// A failed load is reported through [`NavigateResult::error_text`],
    /// not as an error.
    ///
    /// # Errors
    ///
    /// Propagates connection and protocol errors.
    pub async fn navigate(&self, url: impl Into<String>) -> Result<NavigateResult> {
        self.navigate_with(&NavigateParams::new(url)).await
    }

    /// Navigates with full control over the parameters.
    ///
    /// # Errors
    ///
    /// Propagates connection and protocol errors.
    pub async fn navigate_with(&self, params: &NavigateParams) -> Result<NavigateResult> {
        self.domain.call_with("navigate", params).await
    }

    /// Reloads the page.
    ///
    /// # Errors
    ///
    /// Propagates connection and protocol errors.
    pub async fn reload(&self, params: &ReloadParams) -> Result<()> {
        self.domain.exec_with("reload", params).await
    }
}

// ============================================================================
// Page - Events
// ============================================================================

impl Page {
    /// Subscribes to `Page.loadEventFired`.
    pub fn on_load_event_fired<F>(&self, handler: F) -> Subscription
    where
        F: Fn(LoadEventFired) + Send + Sync + 'static,
    {
        self.domain.on("loadEventFired", handler)
    }

    /// Subscribes to `Page.domContentEventFired`.
    pub fn on_dom_content_event_fired<F>(&self, handler: F) -> Subscription
    where
        F: Fn(DomContentEventFired) + Send + Sync + 'static,
    {
        self.domain.on("domContentEventFired", handler)
    }

    /// Subscribes to `Page.frameNavigated`.
    pub fn on_frame_navigated<F>(&self, handler: F) -> Subscription
    where
        F: Fn(FrameNavigated) + Send + Sync + 'static,
    {
        self.domain.on("frameNavigated", handler)
    }

    /// Resolves with the next `Page.loadEventFired`.
    ///
    /// Create this before navigating so the event cannot be missed.
    pub fn next_load_event(&self) -> impl Future<Output = Result<LoadEventFired>> + Send + 'static {
        self.domain.next_event("loadEventFired")
    }
}

// ============================================================================
// Tests
// ============================================================================
