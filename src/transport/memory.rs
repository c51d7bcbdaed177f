//! In-process transport for tests and scripted remotes.
//!
//! [`MemoryTransport::pair`] returns the local transport plus a
//! [`RemoteEnd`] that plays the debuggee: it reads the requests the
//! connection writes and answers them (in any order) or emits events.
//!
//! # Example
//!
//! ```ignore
//! let (transport, mut remote) = MemoryTransport::pair();
//! let connection = Connection::new(transport);
//!
//! let call = tokio::spawn({
//!     let connection = connection.clone();
//!     async move { connection.send("Page", "enable", None, None).await }
//! });
//!
//! let request = remote.next_request().await.unwrap();
//! remote.respond(&request, json!({}));
//! call.await??;
//! ```

// ============================================================================
// Imports
// ============================================================================

use async_trait::async_trait;
use serde_json::{Map, Value, json};
use tokio::sync::mpsc;
use tracing::warn;

use crate::error::{Error, Result};

use super::{Transport, TransportSink, TransportStream};

// ============================================================================
// MemoryTransport
// ============================================================================

/// Local half of an in-memory transport pair.
pub struct MemoryTransport {
    outbound: mpsc::UnboundedSender<String>,
    inbound: mpsc::UnboundedReceiver<String>,
}

impl MemoryTransport {
    /// Creates a connected transport / remote pair.
    #[must_use]
    pub fn pair() -> (Self, RemoteEnd) {
        let (outbound, requests) = mpsc::unbounded_channel();
        let (messages, inbound) = mpsc::unbounded_channel();

        let transport = Self { outbound, inbound };
        let remote = RemoteEnd {
            requests,
            messages: Some(messages),
        };

        (transport, remote)
    }
}

impl Transport for MemoryTransport {
    type Sink = MemorySink;
    type Stream = MemorySource;

    fn split(self) -> (Self::Sink, Self::Stream) {
        (
            MemorySink {
                outbound: Some(self.outbound),
            },
            MemorySource {
                inbound: self.inbound,
            },
        )
    }
}

/// Outbound half of a [`MemoryTransport`].
pub struct MemorySink {
    outbound: Option<mpsc::UnboundedSender<String>>,
}

#[async_trait]
impl TransportSink for MemorySink {
    async fn send_text(&mut self, text: String) -> Result<()> {
        let outbound = self.outbound.as_ref().ok_or(Error::ConnectionClosed)?;
        outbound
            .send(text)
            .map_err(|_| Error::connection("Remote end dropped"))
    }

    async fn close(&mut self) -> Result<()> {
        self.outbound = None;
        Ok(())
    }
}

/// Inbound half of a [`MemoryTransport`].
pub struct MemorySource {
    inbound: mpsc::UnboundedReceiver<String>,
}

#[async_trait]
impl TransportStream for MemorySource {
    async fn next_text(&mut self) -> Option<Result<String>> {
        self.inbound.recv().await.map(Ok)
    }
}

// ============================================================================
// RemoteEnd
// ============================================================================

/// The debuggee side of a [`MemoryTransport`].
pub struct RemoteEnd {
    requests: mpsc::UnboundedReceiver<String>,
    messages: Option<mpsc::UnboundedSender<String>>,
}

impl RemoteEnd {
    /// Waits for the next request written by the connection.
    ///
    /// Returns `None` once the connection side is gone.
    pub async fn next_request(&mut self) -> Option<Value> {
        loop {
            let text = self.requests.recv().await?;
            match serde_json::from_str(&text) {
                Ok(value) => return Some(value),
                Err(e) => warn!(error = %e, "Remote end received malformed request"),
            }
        }
    }

    /// Answers `request` with a success result.
    pub fn respond(&self, request: &Value, result: Value) {
        self.send(json!({ "id": request["id"], "result": result }));
    }

    /// Answers `request` with a protocol error.
    pub fn fail(&self, request: &Value, code: i64, message: &str) {
        self.send(json!({
            "id": request["id"],
            "error": { "code": code, "message": message }
        }));
    }

    /// Emits a notification, optionally scoped to a session.
    pub fn emit(&self, method: &str, params: Value, session_id: Option<&str>) {
        let mut event = Map::new();
        event.insert("method".into(), Value::from(method));
        event.insert("params".into(), params);
        if let Some(session_id) = session_id {
            event.insert("sessionId".into(), Value::from(session_id));
        }
        self.send(Value::Object(event));
    }

    /// Writes a raw message as-is.
    pub fn send_raw(&self, text: impl Into<String>) {
        if let Some(messages) = &self.messages {
            let _ = messages.send(text.into());
        }
    }

    /// Closes the inbound direction; the connection sees end-of-stream.
    pub fn close(&mut self) {
        self.messages = None;
    }

    fn send(&self, message: Value) {
        self.send_raw(message.to_string());
    }
}

// ============================================================================
// Tests
// ============================================================================
