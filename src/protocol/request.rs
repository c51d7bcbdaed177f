//! Command envelope, request and response message types.
//!
//! Defines the message format for command requests and responses
//! between the local end (this crate) and the remote debuggee.

// ============================================================================
// Imports
// ============================================================================

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::convert::convert;
use crate::error::{Error, Result};
use crate::identifiers::{CommandId, SessionId};

// ============================================================================
// CommandEnvelope
// ============================================================================

/// A command addressed to one remote operation, before it gets an id.
///
/// `domain` and `method` together name the operation (`Page` + `navigate`
/// is `Page.navigate` on the wire).
#[derive(Debug, Clone, PartialEq)]
pub struct CommandEnvelope {
    /// Protocol domain, e.g. `Page`.
    pub domain: String,
    /// Command name within the domain, e.g. `navigate`.
    pub method: String,
    /// Parameter record, absent for argument-less commands.
    pub params: Option<Value>,
    /// Session the command is routed to.
    pub session_id: Option<SessionId>,
}

impl CommandEnvelope {
    /// Creates an envelope after validating the names.
    ///
    /// An empty session id is normalized to "no session".
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if `domain` or `method` is empty
    /// or contains a `.`.
    pub fn new(
        domain: impl Into<String>,
        method: impl Into<String>,
        params: Option<Value>,
        session_id: Option<SessionId>,
    ) -> Result<Self> {
        let domain = domain.into();
        let method = method.into();

        validate_name("domain", &domain)?;
        validate_name("method", &method)?;

        Ok(Self {
            domain,
            method,
            params,
            session_id: session_id.filter(|s| !s.is_empty()),
        })
    }

    /// Returns the wire method name `Domain.method`.
    #[inline]
    #[must_use]
    pub fn wire_method(&self) -> String {
        format!("{}.{}", self.domain, self.method)
    }
}

fn validate_name(kind: &str, name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::invalid_argument(format!("{kind} name is empty")));
    }
    if name.contains('.') {
        return Err(Error::invalid_argument(format!(
            "{kind} name must not contain '.': {name}"
        )));
    }
    Ok(())
}

// ============================================================================
// Request
// ============================================================================

/// A command request from local end to remote end.
///
/// # Format
///
/// ```json
/// {
///   "id": 1,
///   "method": "Domain.method",
///   "params": { ... },
///   "sessionId": "..."
/// }
/// ```
///
/// `params` and `sessionId` are omitted when absent.
#[derive(Debug, Clone, Serialize)]
pub struct Request {
    /// Correlation id.
    pub id: CommandId,

    /// Wire method name.
    pub method: String,

    /// Parameter record.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,

    /// Target session.
    #[serde(rename = "sessionId", skip_serializing_if = "Option::is_none")]
    pub session_id: Option<SessionId>,
}

impl Request {
    /// Assigns `id` to an envelope.
    #[must_use]
    pub fn from_envelope(id: CommandId, envelope: CommandEnvelope) -> Self {
        Self {
            id,
            method: envelope.wire_method(),
            params: envelope.params,
            session_id: envelope.session_id,
        }
    }
}

// ============================================================================
// Response
// ============================================================================

/// A response from remote end to local end.
///
/// # Format
///
/// Success:
/// ```json
/// { "id": 1, "result": { ... } }
/// ```
///
/// Error:
/// ```json
/// { "id": 1, "error": { "code": -32000, "message": "...", "data": ... } }
/// ```
///
/// Read with [`Response::from_value`], which tolerates odd member types so
/// that a reply with a known id always completes its command.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    /// Matches the request `id`.
    pub id: CommandId,

    /// Result data (if success).
    pub result: Option<Value>,

    /// Error details (if error).
    pub error: Option<ProtocolError>,

    /// Session the response came from.
    pub session_id: Option<SessionId>,
}

impl Response {
    /// Reads the members of a message already known to carry `id`.
    ///
    /// `result` is taken as-is. The `error` object is converted leniently
    /// and a non-string `sessionId` is ignored.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Protocol`] if `error` is present but not an object.
    pub fn from_value(id: CommandId, message: &Value) -> Result<Self> {
        let error = match message.get("error") {
            None | Some(Value::Null) => None,
            Some(error @ Value::Object(_)) => Some(convert(error.clone())),
            Some(other) => {
                return Err(Error::protocol(format!(
                    "Response {id} has a malformed error member: {other}"
                )));
            }
        };

        Ok(Self {
            id,
            result: message.get("result").cloned(),
            error,
            session_id: message
                .get("sessionId")
                .and_then(Value::as_str)
                .map(SessionId::from),
        })
    }

    /// Returns `true` if this is an error response.
    #[inline]
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    /// Extracts the result value, returning error if response was error.
    ///
    /// A success without a `result` member yields `Value::Null`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CommandFailed`] if the remote end reported an error.
    pub fn into_result(self, method: &str) -> Result<Value> {
        match self.error {
            Some(error) => {
                let message = match error.data {
                    None | Some(Value::Null) => error.message,
                    Some(Value::String(data)) => format!("{} ({data})", error.message),
                    Some(data) => format!("{} ({data})", error.message),
                };
                Err(Error::command_failed(method, error.code, message))
            }
            None => Ok(self.result.unwrap_or(Value::Null)),
        }
    }
}

// ============================================================================
// ProtocolError
// ============================================================================

/// Error object carried by a failed response.
///
/// Members of the wrong type fall back to their defaults.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ProtocolError {
    /// JSON-RPC style error code.
    pub code: i64,
    /// Human readable message.
    pub message: String,
    /// Optional extra detail, usually a string.
    pub data: Option<Value>,
}

// ============================================================================
// Tests
// ============================================================================
