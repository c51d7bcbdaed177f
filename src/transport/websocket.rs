//! WebSocket transport over `tokio-tungstenite`.
//!
//! # Example
//!
//! ```ignore
//! use devtools_link::transport::WebSocketTransport;
//!
//! let transport = WebSocketTransport::connect("ws://127.0.0.1:9222/devtools/browser/abc").await?;
//! let connection = devtools_link::Connection::new(transport);
//! ```

// ============================================================================
// Imports
// ============================================================================

use async_trait::async_trait;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, trace, warn};
use url::Url;

use crate::error::{Error, Result};

use super::{Transport, TransportSink, TransportStream};

// ============================================================================
// WebSocketTransport
// ============================================================================

/// A [`Transport`] backed by an established WebSocket stream.
///
/// Works for client streams from [`connect`](Self::connect) and for any
/// stream accepted with `tokio_tungstenite::accept_async`.
pub struct WebSocketTransport<S> {
    stream: WebSocketStream<S>,
}

impl WebSocketTransport<MaybeTlsStream<TcpStream>> {
    /// Connects to a DevTools WebSocket endpoint.
    ///
    /// # Errors
    ///
    /// - [`Error::Url`] if `endpoint` is not a URL
    /// - [`Error::Config`] if the scheme is not `ws` or `wss`
    /// - [`Error::Connection`] if the handshake fails
    pub async fn connect(endpoint: &str) -> Result<Self> {
        let url = Url::parse(endpoint)?;

        if !matches!(url.scheme(), "ws" | "wss") {
            return Err(Error::config(format!(
                "Expected a ws:// or wss:// endpoint, got {}://",
                url.scheme()
            )));
        }

        let (stream, _response) = tokio_tungstenite::connect_async(url.as_str())
            .await
            .map_err(|e| Error::connection(format!("WebSocket handshake failed: {e}")))?;

        info!(endpoint = %url, "WebSocket connection established");

        Ok(Self { stream })
    }
}

impl<S> WebSocketTransport<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    /// Wraps an already established stream.
    #[inline]
    #[must_use]
    pub fn from_stream(stream: WebSocketStream<S>) -> Self {
        Self { stream }
    }
}

impl<S> Transport for WebSocketTransport<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    type Sink = WebSocketSink<S>;
    type Stream = WebSocketSource<S>;

    fn split(self) -> (Self::Sink, Self::Stream) {
        let (write, read) = self.stream.split();
        (WebSocketSink { write }, WebSocketSource { read })
    }
}

// ============================================================================
// Halves
// ============================================================================

/// Outbound half of a [`WebSocketTransport`].
pub struct WebSocketSink<S> {
    write: SplitSink<WebSocketStream<S>, Message>,
}

#[async_trait]
impl<S> TransportSink for WebSocketSink<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    async fn send_text(&mut self, text: String) -> Result<()> {
        self.write.send(Message::Text(text.into())).await?;
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        self.write.close().await?;
        Ok(())
    }
}

/// Inbound half of a [`WebSocketTransport`].
pub struct WebSocketSource<S> {
    read: SplitStream<WebSocketStream<S>>,
}

#[async_trait]
impl<S> TransportStream for WebSocketSource<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    async fn next_text(&mut self) -> Option<Result<String>> {
        loop {
            match self.read.next().await? {
                Ok(Message::Text(text)) => return Some(Ok(text.to_string())),

                Ok(Message::Binary(bytes)) => match String::from_utf8(bytes.to_vec()) {
                    Ok(text) => return Some(Ok(text)),
                    Err(e) => warn!(error = %e, len = bytes.len(), "Skipping non-UTF-8 binary frame"),
                },

                Ok(Message::Close(frame)) => {
                    debug!(?frame, "WebSocket closed by remote");
                    return None;
                }

                // Ping, Pong, raw frames
                Ok(other) => trace!(kind = ?other, "Skipping control frame"),

                Err(e) => return Some(Err(Error::WebSocket(e))),
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
