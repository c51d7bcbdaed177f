//! `Runtime` domain: script evaluation and console output.

// ============================================================================
// Imports
// ============================================================================

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::client::{Connection, Subscription};
use crate::error::Result;
use crate::identifiers::SessionId;

use super::Domain;

// ============================================================================
// Types
// ============================================================================

/// Parameters for `Runtime.evaluate`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EvaluateParams {
    pub expression: String,

    /// Serialize the result into [`RemoteObject::value`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_by_value: Option<bool>,

    /// Wait for a returned promise to settle.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub await_promise: Option<bool>,
}

impl EvaluateParams {
    /// Evaluates `expression` and returns the result by value.
    #[must_use]
    pub fn new(expression: impl Into<String>) -> Self {
        Self {
            expression: expression.into(),
            return_by_value: Some(true),
            await_promise: None,
        }
    }
}

/// Mirror of a script value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RemoteObject {
    /// `object`, `string`, `number`, `undefined` and so on.
    #[serde(rename = "type")]
    pub kind: String,

    pub subtype: Option<String>,
    pub class_name: Option<String>,

    /// Present for primitives and for by-value results.
    pub value: Option<Value>,

    pub description: Option<String>,
    pub object_id: Option<String>,
}

/// Details of an exception thrown during evaluation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ExceptionDetails {
    pub exception_id: i64,
    pub text: String,
    pub line_number: i64,
    pub column_number: i64,
}

/// Result of `Runtime.evaluate`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EvaluateResult {
    pub result: RemoteObject,

    /// Set when the script threw.
    pub exception_details: Option<ExceptionDetails>,
}

/// Payload of `Runtime.consoleAPICalled`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ConsoleApiCalled {
    /// `log`, `warning`, `error` and so on.
    #[serde(rename = "type")]
    pub kind: String,

    pub args: Vec<RemoteObject>,
    pub execution_context_id: i64,
    pub timestamp: f64,
}

// ============================================================================
// Runtime
// ============================================================================

/// `Runtime` domain facade.
#[derive(Debug, Clone)]
pub struct Runtime {
    domain: Domain,
}

impl Runtime {
    /// Domain name on the wire.
    pub const NAME: &'static str = "Runtime";

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

    /// Enables runtime notifications.
    ///
    /// # Errors
    ///
    /// Propagates connection and protocol errors.
    pub async fn enable(&self) -> Result<()> {
        self.domain.exec("enable").await
    }

    /// Evaluates `expression` in the global scope, returning by value.
    ///
    /// Script exceptions land in [`EvaluateResult::exception_details`].
    ///
    /// # Errors
    ///
    /// Propagates connection and protocol errors.
    pub async fn evaluate(&self, expression: impl Into<String>) -> Result<EvaluateResult> {
        self.evaluate_with(&EvaluateParams::new(expression)).await
    }

    /// Evaluates with full control over the parameters.
    ///
    /// # Errors
    ///
    /// Propagates connection and protocol errors.
    pub async fn evaluate_with(&self, params: &EvaluateParams) -> Result<EvaluateResult> {
        self.domain.call_with("evaluate", params).await
    }

    /// Subscribes to `Runtime.consoleAPICalled`.
    pub fn on_console_api_called<F>(&self, handler: F) -> Subscription
    where
        F: Fn(ConsoleApiCalled) + Send + Sync + 'static,
    {
        self.domain.on("consoleAPICalled", handler)
    }
}

// ============================================================================
// Tests
// ============================================================================
