//! Builder pattern for connection configuration.
//!
//! Provides a fluent API for configuring and creating [`Connection`]
//! instances.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use devtools_link::Connection;
//!
//! # async fn example() -> devtools_link::Result<()> {
//! let connection = Connection::builder()
//!     .command_timeout(Duration::from_secs(30))
//!     .connect("ws://127.0.0.1:9222/devtools/browser/abc")
//!     .await?;
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use crate::error::Result;
use crate::transport::{Transport, WebSocketTransport};

use super::connection::Connection;
use super::options::ConnectionOptions;

// ============================================================================
// ConnectionBuilder
// ============================================================================

/// Builder for configuring a [`Connection`].
///
/// Use [`Connection::builder()`] to create a new builder.
#[derive(Debug, Default, Clone)]
pub struct ConnectionBuilder {
    options: ConnectionOptions,
}

// ============================================================================
// ConnectionBuilder Implementation
// ============================================================================

impl ConnectionBuilder {
    /// Creates a builder with default options.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fails commands that get no response within `timeout`.
    ///
    /// Without this, commands wait indefinitely.
    #[inline]
    #[must_use]
    pub fn command_timeout(mut self, timeout: Duration) -> Self {
        self.options.command_timeout = Some(timeout);
        self
    }

    /// Caps the number of commands awaiting a response.
    #[inline]
    #[must_use]
    pub fn max_pending(mut self, max: usize) -> Self {
        self.options.max_pending = Some(max);
        self
    }

    /// Replaces all options at once.
    #[inline]
    #[must_use]
    pub fn options(mut self, options: ConnectionOptions) -> Self {
        self.options = options;
        self
    }

    /// Builds a connection over an existing transport.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`](crate::Error::Config) if the options are invalid.
    pub fn build<T: Transport>(self, transport: T) -> Result<Connection> {
        Connection::with_options(transport, self.options)
    }

    /// Connects to a WebSocket endpoint and builds a connection over it.
    ///
    /// # Errors
    ///
    /// - [`Error::Config`](crate::Error::Config) if the options or the URL scheme are invalid
    /// - [`Error::Url`](crate::Error::Url) if `endpoint` does not parse
    /// - [`Error::Connection`](crate::Error::Connection) if the WebSocket handshake fails
    pub async fn connect(self, endpoint: &str) -> Result<Connection> {
        self.options.validate()?;
        let transport = WebSocketTransport::connect(endpoint).await?;
        Connection::with_options(transport, self.options)
    }
}

// ============================================================================
// Tests
// ============================================================================
