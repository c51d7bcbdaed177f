//! Error types for devtools-link.
//!
//! This module defines all error types used throughout the crate.
//!
//! # Usage
//!
//! All fallible operations return [`Result<T>`] which uses [`Error`]:
//!
//! ```ignore
//! use devtools_link::{Connection, Result};
//!
//! async fn example(connection: &Connection) -> Result<()> {
//!     connection.send("Page", "enable", None, None).await?;
//!     Ok(())
//! }
//! ```
//!
//! # Error Categories
//!
//! | Category | Variants |
//! |----------|----------|
//! | Configuration | [`Error::Config`] |
//! | Connection | [`Error::Connection`], [`Error::ConnectionClosed`] |
//! | Protocol | [`Error::InvalidArgument`], [`Error::Protocol`], [`Error::CommandFailed`], [`Error::TooManyPending`] |
//! | Execution | [`Error::RequestTimeout`] |
//! | External | [`Error::Json`], [`Error::WebSocket`], [`Error::Url`] |
//!
//! A payload that does not match the requested type is never an error:
//! see [`convert`](crate::convert::convert).

// ============================================================================
// Imports
// ============================================================================

use std::result::Result as StdResult;

use thiserror::Error;
use tokio_tungstenite::tungstenite::Error as WsError;

use crate::identifiers::CommandId;

// ============================================================================
// Result Alias
// ============================================================================

/// Result type alias using crate [`enum@Error`].
///
/// All fallible operations in this crate return this type.
pub type Result<T> = StdResult<T, Error>;

// ============================================================================
// Error Enum
// ============================================================================

/// Main error type for the crate.
///
/// Each variant includes relevant context for debugging.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Configuration error.
    ///
    /// Returned when connection options are invalid.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },

    // ========================================================================
    // Connection Errors
    // ========================================================================
    /// Transport connection failed.
    ///
    /// Returned when the transport cannot be established or a write fails.
    #[error("Connection failed: {message}")]
    Connection {
        /// Description of the connection error.
        message: String,
    },

    /// Connection closed before the operation could complete.
    ///
    /// Every pending command fails with this when the transport goes away.
    #[error("Connection closed")]
    ConnectionClosed,

    // ========================================================================
    // Protocol Errors
    // ========================================================================
    /// Invalid argument passed to a core operation.
    ///
    /// Returned for empty or dotted domain and method names.
    #[error("Invalid argument: {message}")]
    InvalidArgument {
        /// Description of the invalid argument.
        message: String,
    },

    /// Protocol violation or unexpected message.
    #[error("Protocol error: {message}")]
    Protocol {
        /// Description of the protocol violation.
        message: String,
    },

    /// The remote end answered a command with an error.
    #[error("Command {method} failed ({code}): {message}")]
    CommandFailed {
        /// Wire method name, e.g. `Page.navigate`.
        method: String,
        /// Protocol error code.
        code: i64,
        /// Error message from the remote end.
        message: String,
    },

    /// Pending-request limit reached.
    #[error("Too many pending requests: {pending}/{max}")]
    TooManyPending {
        /// Commands currently awaiting a response.
        pending: usize,
        /// Configured limit.
        max: usize,
    },

    // ========================================================================
    // Execution Errors
    // ========================================================================
    /// Command request timeout.
    ///
    /// Only returned when a timeout was configured or passed explicitly.
    #[error("Request {id} ({method}) timed out after {timeout_ms}ms")]
    RequestTimeout {
        /// The correlation id that timed out.
        id: CommandId,
        /// Wire method name.
        method: String,
        /// Milliseconds waited before timeout.
        timeout_ms: u64,
    },

    // ========================================================================
    // External Errors
    // ========================================================================
    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// WebSocket error.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] WsError),

    /// Endpoint URL could not be parsed.
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),
}

// ============================================================================
// Error Constructors
// ============================================================================

impl Error {
    /// Creates a configuration error.
    #[inline]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates a connection error.
    #[inline]
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Creates a protocol error.
    #[inline]
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol {
            message: message.into(),
        }
    }

    /// Creates an invalid argument error.
    #[inline]
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Creates a remote command failure.
    #[inline]
    pub fn command_failed(method: impl Into<String>, code: i64, message: impl Into<String>) -> Self {
        Self::CommandFailed {
            method: method.into(),
            code,
            message: message.into(),
        }
    }

    /// Creates a pending-limit error.
    #[inline]
    pub fn too_many_pending(pending: usize, max: usize) -> Self {
        Self::TooManyPending { pending, max }
    }

    /// Creates a request timeout error.
    #[inline]
    pub fn request_timeout(id: CommandId, method: impl Into<String>, timeout_ms: u64) -> Self {
        Self::RequestTimeout {
            id,
            method: method.into(),
            timeout_ms,
        }
    }
}

// ============================================================================
// Error Predicates
// ============================================================================

impl Error {
    /// Returns `true` if this is a timeout error.
    #[inline]
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::RequestTimeout { .. })
    }

    /// Returns `true` if this is a connection error.
    #[inline]
    #[must_use]
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            Self::Connection { .. } | Self::ConnectionClosed | Self::WebSocket(_)
        )
    }

    /// Returns `true` if the remote end rejected the command.
    #[inline]
    #[must_use]
    pub fn is_remote_error(&self) -> bool {
        matches!(self, Self::CommandFailed { .. })
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::connection("failed to connect");
        assert_eq!(err.to_string(), "Connection failed: failed to connect");
    }

    #[test]
    fn test_command_failed_display() {
        let err = Error::command_failed("Page.navigate", -32000, "Cannot navigate to invalid URL");
        assert_eq!(
            err.to_string(),
            "Command Page.navigate failed (-32000): Cannot navigate to invalid URL"
        );
        assert!(err.is_remote_error());
        assert!(!err.is_connection_error());
    }

    #[test]
    fn test_is_timeout() {
        let timeout_err = Error::request_timeout(CommandId::new(7), "Page.reload", 50);
        let other_err = Error::connection("test");

        assert!(timeout_err.is_timeout());
        assert!(!other_err.is_timeout());
        assert_eq!(
            timeout_err.to_string(),
            "Request 7 (Page.reload) timed out after 50ms"
        );
    }

    #[test]
    fn test_socket_io_failure_is_connection_error() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset by peer");
        let err: Error = WsError::Io(io).into();

        assert!(matches!(err, Error::WebSocket(WsError::Io(_))));
        assert!(err.is_connection_error());
    }

    #[test]
    fn test_is_connection_error() {
        let conn_err = Error::connection("test");
        let closed_err = Error::ConnectionClosed;
        let other_err = Error::config("test");

        assert!(conn_err.is_connection_error());
        assert!(closed_err.is_connection_error());
        assert!(!other_err.is_connection_error());
    }

    #[test]
    fn test_too_many_pending_display() {
        let err = Error::too_many_pending(4, 4);
        assert_eq!(err.to_string(), "Too many pending requests: 4/4");
    }

    #[test]
    fn test_from_json_error() {
        let json_err = serde_json::from_str::<String>("invalid").unwrap_err();
        let err: Error = json_err.into();
        assert!(matches!(err, Error::Json(_)));
    }

    #[test]
    fn test_from_url_error() {
        let url_err = url::Url::parse("not a url").unwrap_err();
        let err: Error = url_err.into();
        assert!(matches!(err, Error::Url(_)));
    }
}
