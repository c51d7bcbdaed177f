//! devtools-link - Command correlation and event routing for DevTools-style
//! protocols.
//!
//! The remote end speaks JSON over a single message stream. Commands carry
//! an integer `id` and are answered by a response echoing it; notifications
//! carry a `Domain.event` method and, in flat session mode, a `sessionId`.
//!
//! # Architecture
//!
//! - **Correlator**: [`Connection`] numbers every command, parks the caller
//!   and completes it when the response with the same id arrives
//! - **Router**: [`EventRouter`] delivers notifications to handlers keyed by
//!   domain, event and session
//! - **Converter**: [`convert()`] turns loose payloads into typed records
//!   without failing
//!
//! A background event loop owns the transport. Responses may arrive in any
//! order; events are dispatched in arrival order.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::time::Duration;
//! use devtools_link::{Connection, Result};
//! use devtools_link::domains::Page;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let connection = Connection::builder()
//!         .command_timeout(Duration::from_secs(30))
//!         .connect("ws://127.0.0.1:9222/devtools/page/ABC")
//!         .await?;
//!
//!     let page = Page::new(&connection);
//!     let _sub = page.on_load_event_fired(|event| {
//!         println!("loaded at {}", event.timestamp);
//!     });
//!
//!     page.enable().await?;
//!     page.navigate("https://example.com").await?;
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`client`] | [`Connection`], [`EventRouter`], builder and options |
//! | [`convert`] | Lenient payload conversion |
//! | [`domains`] | Typed facades: `Page`, `Runtime`, `Target` |
//! | [`error`] | Error types and [`Result`] alias |
//! | [`identifiers`] | Type-safe ID wrappers |
//! | [`protocol`] | Wire message types |
//! | [`transport`] | WebSocket and in-memory transports |

// ============================================================================
// Modules
// ============================================================================

/// Command correlation and event routing.
///
/// Use [`Connection::builder()`] to configure and open a connection.
pub mod client;

/// Lenient conversion of raw payloads into typed records.
pub mod convert;

/// Typed domain facades built on [`Connection`].
pub mod domains;

/// Error types and result aliases.
///
/// All fallible operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// Type-safe identifiers.
///
/// Newtype wrappers keep command ids, sessions and targets apart.
pub mod identifiers;

/// Wire message types.
pub mod protocol;

/// Message transports.
///
/// [`Connection`] is generic over [`Transport`]; a WebSocket and an
/// in-memory implementation are provided.
pub mod transport;

// ============================================================================
// Re-exports
// ============================================================================

// Client types
pub use client::{
    Connection, ConnectionBuilder, ConnectionOptions, EventRouter, RawHandler, Subscription,
};

// Conversion
pub use convert::convert;

// Domain helper
pub use domains::Domain;

// Error types
pub use error::{Error, Result};

// Identifier types
pub use identifiers::{CommandId, SessionId, TargetId};

// Protocol types
pub use protocol::{CommandEnvelope, EventIdentity};

// Transport types
pub use transport::{
    MemoryTransport, RemoteEnd, Transport, TransportSink, TransportStream, WebSocketTransport,
};
