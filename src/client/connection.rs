//! Connection event loop and command correlation.
//!
//! This module owns the transport, correlates command responses by id and
//! routes notifications to the [`EventRouter`].
//!
//! # Event Loop
//!
//! The connection spawns a tokio task that handles:
//!
//! - Incoming messages from the remote end (responses, events)
//! - Outgoing commands from the Rust API
//! - Request/response correlation by integer id
//! - Event dispatch by session-qualified identity
//!
//! Responses are handed to their waiter over a oneshot channel, so a slow
//! command never holds up another command or an event.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use serde_json::{Value, from_str, from_value, to_string};
use tokio::sync::{mpsc, oneshot};
use tokio::time::timeout;
use tracing::{debug, error, trace, warn};

use crate::error::{Error, Result};
use crate::identifiers::{CommandId, CommandIdGenerator, SessionId};
use crate::protocol::{CommandEnvelope, Event, EventIdentity, Request, Response};
use crate::transport::{Transport, TransportSink, TransportStream};

use super::builder::ConnectionBuilder;
use super::options::ConnectionOptions;
use super::router::{EventRouter, RawHandler, Subscription};

// ============================================================================
// Types
// ============================================================================

/// A command awaiting its response.
struct PendingCommand {
    /// Wire method, kept for error context.
    method: String,
    /// Waiter.
    response_tx: oneshot::Sender<Result<Value>>,
}

/// Map of correlation ids to waiters.
type CorrelationMap = FxHashMap<CommandId, PendingCommand>;

// ============================================================================
// ConnectionCommand
// ============================================================================

/// Internal commands for the event loop.
enum ConnectionCommand {
    /// Write a request and register its waiter.
    Send {
        request: Request,
        response_tx: oneshot::Sender<Result<Value>>,
    },
    /// Forget a timed-out or abandoned correlation entry.
    RemoveCorrelation(CommandId),
    /// Close the transport and stop.
    Shutdown,
}

// ============================================================================
// Connection
// ============================================================================

/// Client side of one debugging connection.
///
/// Cheap to clone; all clones share the same event loop, pending table
/// and event router.
///
/// # Thread Safety
///
/// `Connection` is `Send + Sync`. Any number of tasks may have commands in
/// flight at once; responses are matched by id, not by arrival order.
#[derive(Clone)]
pub struct Connection {
    /// Channel for sending commands to the event loop.
    command_tx: mpsc::UnboundedSender<ConnectionCommand>,
    /// Correlation map (shared with event loop).
    correlation: Arc<Mutex<CorrelationMap>>,
    /// Event router (shared with event loop).
    router: Arc<EventRouter>,
    /// Correlation id source.
    ids: Arc<CommandIdGenerator>,
    /// Applied to every `send`.
    options: ConnectionOptions,
}

impl Connection {
    /// Creates a connection with default options over `transport`.
    ///
    /// Spawns the event loop, so it must be called inside a tokio runtime.
    #[must_use]
    pub fn new<T: Transport>(transport: T) -> Self {
        Self::spawn(transport, ConnectionOptions::default())
    }

    /// Creates a connection with explicit options.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the options are invalid.
    pub fn with_options<T: Transport>(transport: T, options: ConnectionOptions) -> Result<Self> {
        options.validate()?;
        Ok(Self::spawn(transport, options))
    }

    fn spawn<T: Transport>(transport: T, options: ConnectionOptions) -> Self {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let correlation = Arc::new(Mutex::new(CorrelationMap::default()));
        let router = Arc::new(EventRouter::new());

        tokio::spawn(Self::run_event_loop(
            transport,
            command_rx,
            Arc::clone(&correlation),
            Arc::clone(&router),
        ));

        Self {
            command_tx,
            correlation,
            router,
            ids: Arc::new(CommandIdGenerator::new()),
            options,
        }
    }

    /// Returns a builder for configuring a connection.
    #[inline]
    #[must_use]
    pub fn builder() -> ConnectionBuilder {
        ConnectionBuilder::new()
    }

    /// Returns the options this connection was created with.
    #[inline]
    #[must_use]
    pub fn options(&self) -> &ConnectionOptions {
        &self.options
    }
}

// ============================================================================
// Connection - Commands
// ============================================================================

impl Connection {
    /// Sends `Domain.method` and waits for its result.
    ///
    /// Waits for the configured command timeout, or forever if none is
    /// set. Dropping the returned future abandons the command.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidArgument`] if `domain` or `method` is malformed
    /// - [`Error::CommandFailed`] if the remote end reports an error
    /// - [`Error::ConnectionClosed`] if the connection ends first
    /// - [`Error::RequestTimeout`] if a timeout is configured and expires
    /// - [`Error::TooManyPending`] if the pending limit is reached
    pub async fn send(
        &self,
        domain: &str,
        method: &str,
        params: Option<Value>,
        session_id: Option<&SessionId>,
    ) -> Result<Value> {
        let envelope = CommandEnvelope::new(domain, method, params, session_id.cloned())?;
        self.send_envelope(envelope, self.options.command_timeout)
            .await
    }

    /// Sends `Domain.method` with an explicit timeout for this call.
    ///
    /// # Errors
    ///
    /// Same as [`send`](Self::send).
    pub async fn send_with_timeout(
        &self,
        domain: &str,
        method: &str,
        params: Option<Value>,
        session_id: Option<&SessionId>,
        request_timeout: Duration,
    ) -> Result<Value> {
        let envelope = CommandEnvelope::new(domain, method, params, session_id.cloned())?;
        self.send_envelope(envelope, Some(request_timeout)).await
    }

    /// Sends a prepared envelope. `None` waits indefinitely.
    ///
    /// # Errors
    ///
    /// Same as [`send`](Self::send).
    pub async fn send_envelope(
        &self,
        envelope: CommandEnvelope,
        request_timeout: Option<Duration>,
    ) -> Result<Value> {
        if let Some(max) = self.options.max_pending {
            let pending = self.correlation.lock().len();
            if pending >= max {
                warn!(pending, max, "Too many pending requests");
                return Err(Error::too_many_pending(pending, max));
            }
        }

        let id = self.ids.next();
        let method = envelope.wire_method();
        let request = Request::from_envelope(id, envelope);
        let (response_tx, response_rx) = oneshot::channel();

        self.command_tx
            .send(ConnectionCommand::Send {
                request,
                response_tx,
            })
            .map_err(|_| Error::ConnectionClosed)?;

        let guard = CorrelationGuard::new(id, &self.command_tx);

        let received = match request_timeout {
            None => response_rx.await,
            Some(limit) => match timeout(limit, response_rx).await {
                Ok(received) => received,
                Err(_) => {
                    debug!(%id, %method, "Request timed out");
                    let timeout_ms = u64::try_from(limit.as_millis()).unwrap_or(u64::MAX);
                    return Err(Error::request_timeout(id, method, timeout_ms));
                }
            },
        };

        guard.disarm();

        match received {
            Ok(result) => result,
            Err(_) => Err(Error::ConnectionClosed),
        }
    }

    /// Returns the number of commands awaiting a response.
    #[inline]
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.correlation.lock().len()
    }

    /// Returns `true` once the event loop has stopped.
    #[inline]
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.command_tx.is_closed()
    }

    /// Closes the transport, fails pending commands and drops all event
    /// handlers.
    pub fn shutdown(&self) {
        let _ = self.command_tx.send(ConnectionCommand::Shutdown);
    }
}

// ============================================================================
// Connection - Events
// ============================================================================

impl Connection {
    /// Registers a raw handler for `identity`.
    #[inline]
    pub fn on(&self, identity: EventIdentity, handler: RawHandler) {
        self.router.on(identity, handler);
    }

    /// Removes one registration of `handler` for `identity`.
    ///
    /// Unknown pairs are ignored.
    #[inline]
    pub fn remove(&self, identity: &EventIdentity, handler: &RawHandler) -> bool {
        self.router.remove(identity, handler)
    }

    /// Registers a raw handler and returns its unsubscribe handle.
    #[inline]
    pub fn subscribe(&self, identity: EventIdentity, handler: RawHandler) -> Subscription {
        self.router.subscribe(identity, handler)
    }

    /// Returns the shared event router.
    #[inline]
    #[must_use]
    pub fn router(&self) -> &Arc<EventRouter> {
        &self.router
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("pending", &self.pending_count())
            .field("closed", &self.is_closed())
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Connection - Event Loop
// ============================================================================

impl Connection {
    /// Event loop that drives the transport.
    async fn run_event_loop<T: Transport>(
        transport: T,
        mut command_rx: mpsc::UnboundedReceiver<ConnectionCommand>,
        correlation: Arc<Mutex<CorrelationMap>>,
        router: Arc<EventRouter>,
    ) {
        let (mut sink, mut stream) = transport.split();

        loop {
            tokio::select! {
                // Incoming messages from the remote end
                message = stream.next_text() => {
                    match message {
                        Some(Ok(text)) => {
                            Self::handle_incoming_message(&text, &correlation, &router);
                        }

                        Some(Err(e)) => {
                            error!(error = %e, "Transport error");
                            break;
                        }

                        None => {
                            debug!("Transport stream ended");
                            break;
                        }
                    }
                }

                // Commands from Rust API
                command = command_rx.recv() => {
                    match command {
                        Some(ConnectionCommand::Send { request, response_tx }) => {
                            Self::handle_send_command(
                                request,
                                response_tx,
                                &mut sink,
                                &correlation,
                            ).await;
                        }

                        Some(ConnectionCommand::RemoveCorrelation(id)) => {
                            if correlation.lock().remove(&id).is_some() {
                                debug!(%id, "Removed abandoned correlation");
                            }
                        }

                        Some(ConnectionCommand::Shutdown) => {
                            debug!("Shutdown command received");
                            if let Err(e) = sink.close().await {
                                warn!(error = %e, "Failed to close transport");
                            }
                            break;
                        }

                        None => {
                            debug!("Command channel closed");
                            break;
                        }
                    }
                }
            }
        }

        // Queued sends are dropped with the receiver; their waiters see
        // a closed channel.
        command_rx.close();
        Self::fail_pending_requests(&correlation);
        router.clear();

        debug!("Event loop terminated");
    }

    /// Handles an incoming text message from the remote end.
    ///
    /// A message with an `id` is a response and always completes its
    /// waiter, even when its body is malformed. Anything else with a
    /// `method` is an event.
    fn handle_incoming_message(
        text: &str,
        correlation: &Mutex<CorrelationMap>,
        router: &EventRouter,
    ) {
        let message: Value = match from_str(text) {
            Ok(message) => message,
            Err(e) => {
                warn!(error = %e, text = %text, "Failed to parse incoming message");
                return;
            }
        };

        // Responses carry an id
        if let Some(raw_id) = message.get("id") {
            match raw_id.as_u64() {
                Some(id) => Self::complete_request(CommandId::new(id), &message, correlation),
                None => warn!(id = %raw_id, "Response with non-integer id"),
            }
            return;
        }

        // Events carry a method
        match from_value::<Event>(message) {
            Ok(event) => match event.identity() {
                Some(identity) => {
                    let count = router.dispatch(&identity, &event.params);
                    trace!(%identity, count, "Event dispatched");
                }
                None => warn!(method = %event.method, "Event with malformed method"),
            },
            Err(e) => warn!(error = %e, text = %text, "Message is neither response nor event"),
        }
    }

    /// Completes the waiter registered under `id`.
    fn complete_request(id: CommandId, message: &Value, correlation: &Mutex<CorrelationMap>) {
        let Some(pending) = correlation.lock().remove(&id) else {
            debug!(%id, "Response for unknown or abandoned request");
            return;
        };

        let result = Response::from_value(id, message)
            .and_then(|response| response.into_result(&pending.method));

        if let Err(e) = &result {
            debug!(%id, method = %pending.method, error = %e, "Request failed");
        }

        let _ = pending.response_tx.send(result);
    }

    /// Handles a send command from the Rust API.
    async fn handle_send_command<S: TransportSink>(
        request: Request,
        response_tx: oneshot::Sender<Result<Value>>,
        sink: &mut S,
        correlation: &Mutex<CorrelationMap>,
    ) {
        let id = request.id;

        // Serialize request
        let json = match to_string(&request) {
            Ok(j) => j,
            Err(e) => {
                let _ = response_tx.send(Err(Error::Json(e)));
                return;
            }
        };

        // Store correlation before sending
        correlation.lock().insert(
            id,
            PendingCommand {
                method: request.method,
                response_tx,
            },
        );

        // Write to transport
        if let Err(e) = sink.send_text(json).await {
            // Remove correlation and notify caller
            if let Some(pending) = correlation.lock().remove(&id) {
                let _ = pending
                    .response_tx
                    .send(Err(Error::connection(e.to_string())));
            }
            return;
        }

        trace!(%id, "Request sent");
    }

    /// Fails all pending requests with ConnectionClosed error.
    fn fail_pending_requests(correlation: &Mutex<CorrelationMap>) {
        let pending: Vec<_> = correlation.lock().drain().collect();
        let count = pending.len();

        for (_, command) in pending {
            let _ = command.response_tx.send(Err(Error::ConnectionClosed));
        }

        if count > 0 {
            debug!(count, "Failed pending requests on shutdown");
        }
    }
}

// ============================================================================
// CorrelationGuard
// ============================================================================

/// Removes the correlation entry if the waiting future is dropped or times
/// out before a response arrives.
struct CorrelationGuard<'a> {
    id: CommandId,
    command_tx: &'a mpsc::UnboundedSender<ConnectionCommand>,
    armed: bool,
}

impl<'a> CorrelationGuard<'a> {
    fn new(id: CommandId, command_tx: &'a mpsc::UnboundedSender<ConnectionCommand>) -> Self {
        Self {
            id,
            command_tx,
            armed: true,
        }
    }

    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for CorrelationGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            let _ = self
                .command_tx
                .send(ConnectionCommand::RemoveCorrelation(self.id));
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;
    use tokio_test::{assert_err, assert_ok};

    use crate::transport::{MemoryTransport, RemoteEnd};

    fn connect() -> (Connection, RemoteEnd) {
        let (transport, remote) = MemoryTransport::pair();
        (Connection::new(transport), remote)
    }

    async fn wait_until(mut condition: impl FnMut() -> bool) {
        for _ in 0..400 {
            if condition() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("condition not reached in time");
    }

    /// Round trip used as a barrier: every message the remote wrote before
    /// the response has been handled once it resolves.
    async fn barrier(connection: &Connection, remote: &mut RemoteEnd) {
        let call = tokio::spawn({
            let connection = connection.clone();
            async move { connection.send("Runtime", "runIfWaitingForDebugger", None, None).await }
        });
        let request = remote.next_request().await.expect("barrier request");
        remote.respond(&request, json!({}));
        assert_ok!(call.await.expect("barrier task"));
    }

    #[tokio::test]
    async fn test_correlation_with_shuffled_responses() {
        let (connection, mut remote) = connect();
        let count = 16;

        let calls: Vec<_> = (0..count)
            .map(|n| {
                let connection = connection.clone();
                tokio::spawn(async move {
                    connection
                        .send("Runtime", "evaluate", Some(json!({ "n": n })), None)
                        .await
                })
            })
            .collect();

        let mut requests = Vec::new();
        for _ in 0..count {
            requests.push(remote.next_request().await.expect("request"));
        }

        let mut ids: Vec<_> = requests.iter().map(|r| r["id"].as_u64()).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), count);

        // Reverse, then odd positions before even ones.
        requests.reverse();
        let (odd, even): (Vec<_>, Vec<_>) =
            requests.into_iter().enumerate().partition(|(i, _)| i % 2 == 1);
        for (_, request) in odd.into_iter().chain(even) {
            remote.respond(&request, json!({ "n": request["params"]["n"] }));
        }

        for (n, call) in calls.into_iter().enumerate() {
            let result = call.await.expect("task").expect("result");
            assert_eq!(result, json!({ "n": n }));
        }
        assert_eq!(connection.pending_count(), 0);
    }

    #[tokio::test]
    async fn test_request_wire_shape_with_session() {
        let (connection, mut remote) = connect();
        let session = SessionId::new("S-7");

        let call = tokio::spawn({
            let connection = connection.clone();
            let session = session.clone();
            async move {
                connection
                    .send("Page", "navigate", Some(json!({ "url": "about:blank" })), Some(&session))
                    .await
            }
        });

        let request = remote.next_request().await.expect("request");
        assert_eq!(request["id"], 1);
        assert_eq!(request["method"], "Page.navigate");
        assert_eq!(request["params"]["url"], "about:blank");
        assert_eq!(request["sessionId"], "S-7");

        remote.respond(&request, json!({ "frameId": "F" }));
        assert_eq!(call.await.expect("task").expect("result")["frameId"], "F");
    }

    #[tokio::test]
    async fn test_protocol_error_fails_call() {
        let (connection, mut remote) = connect();

        let call = tokio::spawn({
            let connection = connection.clone();
            async move { connection.send("Page", "navigate", None, None).await }
        });

        let request = remote.next_request().await.expect("request");
        remote.fail(&request, -32602, "Invalid parameters");

        match call.await.expect("task") {
            Err(Error::CommandFailed { method, code, .. }) => {
                assert_eq!(method, "Page.navigate");
                assert_eq!(code, -32602);
            }
            other => panic!("expected CommandFailed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_replies_with_odd_members_still_complete() {
        let (connection, mut remote) = connect();

        let calls: Vec<_> = (0..3)
            .map(|_| {
                let connection = connection.clone();
                tokio::spawn(async move { connection.send("Page", "navigate", None, None).await })
            })
            .collect();

        let mut requests = Vec::new();
        for _ in 0..3 {
            requests.push(remote.next_request().await.expect("request"));
        }
        requests.sort_by_key(|r| r["id"].as_u64());
        let (first, second, third) = (
            requests[0]["id"].clone(),
            requests[1]["id"].clone(),
            requests[2]["id"].clone(),
        );

        remote.send_raw(
            json!({
                "id": first,
                "error": { "code": -32000, "message": "boom", "data": { "detail": 1 } }
            })
            .to_string(),
        );
        remote.send_raw(json!({ "id": second, "result": { "frameId": "F" }, "sessionId": 7 }).to_string());
        remote.send_raw(json!({ "id": third, "error": "boom" }).to_string());

        let mut results = Vec::new();
        for call in calls {
            results.push(call.await.expect("task"));
        }
        results.sort_by_key(|r| match r {
            Err(Error::CommandFailed { .. }) => 0,
            Ok(_) => 1,
            Err(_) => 2,
        });

        assert!(matches!(&results[0], Err(Error::CommandFailed { code: -32000, .. })));
        assert_eq!(results[1].as_ref().expect("success")["frameId"], "F");
        assert!(matches!(&results[2], Err(Error::Protocol { .. })));
        assert_eq!(connection.pending_count(), 0);
        assert!(!connection.is_closed());
    }

    #[tokio::test]
    async fn test_transport_close_fails_pending() {
        let (connection, mut remote) = connect();

        let call = tokio::spawn({
            let connection = connection.clone();
            async move { connection.send("Page", "enable", None, None).await }
        });

        let _request = remote.next_request().await.expect("request");
        remote.close();

        assert!(matches!(
            call.await.expect("task"),
            Err(Error::ConnectionClosed)
        ));
        assert!(connection.is_closed());
        assert!(matches!(
            connection.send("Page", "enable", None, None).await,
            Err(Error::ConnectionClosed)
        ));
    }

    #[tokio::test]
    async fn test_configured_timeout() {
        let (transport, mut remote) = MemoryTransport::pair();
        let options = ConnectionOptions::new().with_command_timeout(Duration::from_millis(50));
        let connection = Connection::with_options(transport, options).expect("valid options");

        let call = tokio::spawn({
            let connection = connection.clone();
            async move { connection.send("Page", "reload", None, None).await }
        });

        let request = remote.next_request().await.expect("request");
        let err = assert_err!(call.await.expect("task"));
        assert!(err.is_timeout());

        wait_until(|| connection.pending_count() == 0).await;

        // A late answer is discarded.
        remote.respond(&request, json!({}));
        barrier(&connection, &mut remote).await;
    }

    #[tokio::test]
    async fn test_with_options_rejects_zero_limits() {
        let (transport, _remote) = MemoryTransport::pair();
        let zero_timeout = ConnectionOptions::new().with_command_timeout(Duration::ZERO);
        assert!(matches!(
            Connection::with_options(transport, zero_timeout),
            Err(Error::Config { .. })
        ));

        let (transport, _remote) = MemoryTransport::pair();
        let zero_pending = ConnectionOptions::new().with_max_pending(0);
        assert!(matches!(
            Connection::with_options(transport, zero_pending),
            Err(Error::Config { .. })
        ));
    }

    #[tokio::test]
    async fn test_timeout_reports_whole_millis() {
        let (connection, mut remote) = connect();

        let call = tokio::spawn({
            let connection = connection.clone();
            async move {
                connection
                    .send_with_timeout("Page", "reload", None, None, Duration::from_micros(1500))
                    .await
            }
        });

        let _request = remote.next_request().await.expect("request");
        assert!(matches!(
            call.await.expect("task"),
            Err(Error::RequestTimeout { timeout_ms: 1, .. })
        ));
    }

    #[tokio::test]
    async fn test_per_call_timeout() {
        let (connection, mut remote) = connect();

        let call = tokio::spawn({
            let connection = connection.clone();
            async move {
                connection
                    .send_with_timeout("Page", "reload", None, None, Duration::from_millis(30))
                    .await
            }
        });

        let _request = remote.next_request().await.expect("request");
        assert!(matches!(
            call.await.expect("task"),
            Err(Error::RequestTimeout { ref method, .. }) if method == "Page.reload"
        ));
    }

    #[tokio::test]
    async fn test_dropped_call_removes_correlation() {
        let (connection, mut remote) = connect();

        let call = tokio::spawn({
            let connection = connection.clone();
            async move { connection.send("Page", "enable", None, None).await }
        });

        let _request = remote.next_request().await.expect("request");
        wait_until(|| connection.pending_count() == 1).await;

        call.abort();
        wait_until(|| connection.pending_count() == 0).await;
    }

    #[tokio::test]
    async fn test_pending_limit() {
        let (transport, mut remote) = MemoryTransport::pair();
        let options = ConnectionOptions::new().with_max_pending(1);
        let connection = Connection::with_options(transport, options).expect("valid options");

        let first = tokio::spawn({
            let connection = connection.clone();
            async move { connection.send("Page", "enable", None, None).await }
        });
        let request = remote.next_request().await.expect("request");
        wait_until(|| connection.pending_count() == 1).await;

        assert!(matches!(
            connection.send("Page", "enable", None, None).await,
            Err(Error::TooManyPending { pending: 1, max: 1 })
        ));

        remote.respond(&request, json!({}));
        assert_ok!(first.await.expect("task"));
    }

    #[tokio::test]
    async fn test_invalid_names_are_not_sent() {
        let (connection, _remote) = connect();

        assert!(matches!(
            connection.send("", "enable", None, None).await,
            Err(Error::InvalidArgument { .. })
        ));
        assert!(matches!(
            connection.send("Page", "", None, None).await,
            Err(Error::InvalidArgument { .. })
        ));
        assert_eq!(connection.pending_count(), 0);
    }

    #[tokio::test]
    async fn test_events_routed_by_session() {
        let (connection, mut remote) = connect();
        let (tx, mut rx) = mpsc::unbounded_channel::<String>();

        let record = |tag: &'static str| -> RawHandler {
            let tx = tx.clone();
            Arc::new(move |payload: &Value| {
                let _ = tx.send(format!("{tag}:{}", payload["n"]));
            })
        };

        connection.on(
            EventIdentity::unscoped("Target", "targetInfoChanged"),
            record("browser"),
        );
        connection.on(
            EventIdentity::scoped("Target", "targetInfoChanged", "X"),
            record("x"),
        );
        connection.on(
            EventIdentity::scoped("Target", "targetInfoChanged", "Y"),
            record("y"),
        );

        remote.emit("Target.targetInfoChanged", json!({ "n": 1 }), None);
        remote.emit("Target.targetInfoChanged", json!({ "n": 2 }), Some("X"));
        remote.emit("Target.targetInfoChanged", json!({ "n": 3 }), Some("Y"));
        remote.emit("Target.targetInfoChanged", json!({ "n": 4 }), Some("Z"));
        barrier(&connection, &mut remote).await;

        drop(tx);
        connection.shutdown();

        let mut seen = Vec::new();
        while let Some(entry) = rx.recv().await {
            seen.push(entry);
        }
        assert_eq!(seen, vec!["browser:1", "x:2", "y:3"]);
    }

    #[tokio::test]
    async fn test_empty_inbound_session_is_unscoped() {
        let (connection, mut remote) = connect();
        let (tx, mut rx) = mpsc::unbounded_channel::<&'static str>();

        let record = |tag: &'static str| -> RawHandler {
            let tx = tx.clone();
            Arc::new(move |_: &Value| {
                let _ = tx.send(tag);
            })
        };

        connection.on(EventIdentity::unscoped("Page", "loadEventFired"), record("unscoped"));
        connection.on(EventIdentity::scoped("Page", "loadEventFired", "S"), record("scoped"));

        remote.send_raw(r#"{"method":"Page.loadEventFired","params":{},"sessionId":""}"#);
        barrier(&connection, &mut remote).await;

        drop(tx);
        connection.shutdown();

        let mut seen = Vec::new();
        while let Some(tag) = rx.recv().await {
            seen.push(tag);
        }
        assert_eq!(seen, vec!["unscoped"]);
    }

    #[tokio::test]
    async fn test_unsubscribed_handler_stops_receiving() {
        let (connection, mut remote) = connect();
        let hits = Arc::new(Mutex::new(0_u32));

        let subscription = connection.subscribe(EventIdentity::unscoped("Page", "loadEventFired"), {
            let hits = Arc::clone(&hits);
            Arc::new(move |_: &Value| *hits.lock() += 1)
        });

        remote.emit("Page.loadEventFired", json!({}), None);
        barrier(&connection, &mut remote).await;

        subscription.unsubscribe();
        subscription.unsubscribe();

        remote.emit("Page.loadEventFired", json!({}), None);
        barrier(&connection, &mut remote).await;

        assert_eq!(*hits.lock(), 1);
    }

    #[tokio::test]
    async fn test_malformed_messages_are_ignored() {
        let (connection, mut remote) = connect();

        remote.send_raw("not json");
        remote.send_raw(r#"{"unexpected": true}"#);
        remote.send_raw(r#"{"id": 999, "result": {}}"#);
        remote.emit("NoSeparator", json!({}), None);

        barrier(&connection, &mut remote).await;
        assert!(!connection.is_closed());
    }

    #[tokio::test]
    async fn test_shutdown() {
        let (connection, mut remote) = connect();
        connection.on(
            EventIdentity::unscoped("Page", "loadEventFired"),
            Arc::new(|_: &Value| {}),
        );

        let call = tokio::spawn({
            let connection = connection.clone();
            async move { connection.send("Page", "enable", None, None).await }
        });
        let _request = remote.next_request().await.expect("request");

        connection.shutdown();

        assert!(matches!(call.await.expect("task"), Err(Error::ConnectionClosed)));
        wait_until(|| connection.is_closed()).await;
        assert_eq!(connection.router().identity_count(), 0);
        assert!(remote.next_request().await.is_none());
    }
}
