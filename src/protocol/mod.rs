//! Wire protocol message types.
//!
//! This module defines the message format for communication between
//! the local end (this crate) and the remote debuggee.
//!
//! # Protocol Overview
//!
//! | Message Type | Direction | Purpose |
//! |--------------|-----------|---------|
//! | `Request` | Local → Remote | Command request |
//! | `Response` | Remote → Local | Command response (result or error) |
//! | `Event` | Remote → Local | Unsolicited notification |
//!
//! # Naming
//!
//! Commands and events follow `Domain.name` format:
//!
//! - `Page.navigate`
//! - `Target.attachToTarget`
//! - `Page.loadEventFired`
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `event` | Event and EventIdentity types |
//! | `request` | CommandEnvelope, Request and Response types |

// ============================================================================
// Submodules
// ============================================================================

/// Event message types and subscription identity.
pub mod event;

/// Request and Response message types.
pub mod request;

// ============================================================================
// Re-exports
// ============================================================================

pub use event::{Event, EventIdentity};
pub use request::{CommandEnvelope, ProtocolError, Request, Response};
