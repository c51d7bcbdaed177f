//! Transport layer.
//!
//! The connection core only needs to write and read whole text messages.
//! This module defines that boundary and ships two implementations.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐                              ┌─────────────────┐
//! │  Connection     │        Transport             │  Debuggee       │
//! │  (event loop)   │◄────────────────────────────►│  (browser)      │
//! │                 │   sink: requests             │                 │
//! │                 │   stream: responses, events  │                 │
//! └─────────────────┘                              └─────────────────┘
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `traits` | `Transport`, `TransportSink`, `TransportStream` |
//! | `websocket` | `tokio-tungstenite` adapter |
//! | `memory` | In-process pair for tests and scripted remotes |

// ============================================================================
// Submodules
// ============================================================================

/// In-process transport pair.
pub mod memory;

/// Transport traits.
pub mod traits;

/// WebSocket transport.
pub mod websocket;

// ============================================================================
// Re-exports
// ============================================================================

pub use memory::{MemoryTransport, RemoteEnd};
pub use traits::{Transport, TransportSink, TransportStream};
pub use websocket::WebSocketTransport;
