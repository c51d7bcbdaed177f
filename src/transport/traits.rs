//! Transport abstraction consumed by the connection event loop.
//!
//! A transport moves whole text messages. Framing, handshakes and
//! reconnection belong to the implementation, not to this crate's core.

// ============================================================================
// Imports
// ============================================================================

use async_trait::async_trait;

use crate::error::Result;

// ============================================================================
// Traits
// ============================================================================

/// A bidirectional message transport that can be split into halves.
///
/// The event loop owns both halves and drives them from a single task.
pub trait Transport: Send + 'static {
    /// Outbound half.
    type Sink: TransportSink;
    /// Inbound half.
    type Stream: TransportStream;

    /// Splits the transport into independently usable halves.
    fn split(self) -> (Self::Sink, Self::Stream);
}

/// Outbound half of a [`Transport`].
#[async_trait]
pub trait TransportSink: Send + 'static {
    /// Writes one serialized message.
    async fn send_text(&mut self, text: String) -> Result<()>;

    /// Closes the outbound direction.
    async fn close(&mut self) -> Result<()>;
}

/// Inbound half of a [`Transport`].
#[async_trait]
pub trait TransportStream: Send + 'static {
    /// Returns the next inbound message, or `None` once closed.
    ///
    /// Must be cancel-safe: the event loop polls it inside `select!`.
    async fn next_text(&mut self) -> Option<Result<String>>;
}
