//! Connection options.
//!
//! # Example
//!
//! ```ignore
//! use std::time::Duration;
//! use devtools_link::ConnectionOptions;
//!
//! let options = ConnectionOptions::new()
//!     .with_command_timeout(Duration::from_secs(30))
//!     .with_max_pending(256);
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use crate::error::{Error, Result};

// ============================================================================
// ConnectionOptions
// ============================================================================

/// Tunables applied to every command sent over a connection.
///
/// The default waits forever for each response and puts no bound on the
/// number of commands in flight.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConnectionOptions {
    /// Time to wait for a response before failing the command.
    pub command_timeout: Option<Duration>,

    /// Maximum number of commands awaiting a response.
    pub max_pending: Option<usize>,
}

// ============================================================================
// Constructors
// ============================================================================

impl ConnectionOptions {
    /// Creates options with default settings.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            command_timeout: None,
            max_pending: None,
        }
    }
}

// ============================================================================
// Builder Methods
// ============================================================================

impl ConnectionOptions {
    /// Sets the per-command timeout.
    #[inline]
    #[must_use]
    pub const fn with_command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = Some(timeout);
        self
    }

    /// Sets the pending-command limit.
    #[inline]
    #[must_use]
    pub const fn with_max_pending(mut self, max: usize) -> Self {
        self.max_pending = Some(max);
        self
    }
}

// ============================================================================
// Validation
// ============================================================================

impl ConnectionOptions {
    /// Checks that the options can drive a connection.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for a zero timeout or a zero pending limit.
    pub fn validate(&self) -> Result<()> {
        if self.command_timeout == Some(Duration::ZERO) {
            return Err(Error::config(
                "Command timeout must be greater than zero. Omit it to wait indefinitely.",
            ));
        }

        if self.max_pending == Some(0) {
            return Err(Error::config(
                "Pending limit must be at least 1. Omit it for no limit.",
            ));
        }

        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
