//! Connection core: command correlation and event routing.
//!
//! # Components
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Connection`] | Sends commands, awaits correlated responses |
//! | [`EventRouter`] | Session-scoped handler registry |
//! | [`Subscription`] | Unsubscribe handle |
//! | [`ConnectionBuilder`] | Fluent configuration builder |
//! | [`ConnectionOptions`] | Timeout and pending limit |

// ============================================================================
// Submodules
// ============================================================================

/// Fluent builder for connection configuration.
pub mod builder;

/// Connection event loop and command correlation.
pub mod connection;

/// Connection options.
pub mod options;

/// Event routing and subscriptions.
pub mod router;

// ============================================================================
// Re-exports
// ============================================================================

pub use builder::ConnectionBuilder;
pub use connection::Connection;
pub use options::ConnectionOptions;
pub use router::{EventRouter, RawHandler, Subscription};
