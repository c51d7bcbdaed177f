//! Typed domain facades.
//!
//! Every facade is a thin wrapper over [`Domain`], which implements the two
//! shapes a protocol binding needs:
//!
//! | Shape | Flow |
//! |-------|------|
//! | Command | params → [`Connection::send`] → [`convert`] → typed result |
//! | Event | typed handler → raw wrapper → [`EventRouter`](crate::EventRouter) → [`Subscription`] |
//!
//! The facades here (`Page`, `Runtime`, `Target`) cover the commands needed
//! to attach to a target and drive it. Further domains follow the same
//! pattern.
//!
//! # Example
//!
//! ```no_run
//! use devtools_link::domains::{Page, Target};
//! use devtools_link::Connection;
//!
//! # async fn example(connection: Connection) -> devtools_link::Result<()> {
//! let target = Target::new(&connection);
//! let page_target = target.get_targets().await?.into_iter().find(|t| t.kind == "page");
//!
//! if let Some(info) = page_target {
//!     let session = target.attach_to_target(&info.target_id).await?;
//!     let page = Page::new(&connection).with_session(session);
//!
//!     let loaded = page.next_load_event();
//!     page.navigate("https://example.com").await?;
//!     loaded.await?;
//! }
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Submodules
// ============================================================================

/// `Page` domain.
pub mod page;

/// `Runtime` domain.
pub mod runtime;

/// `Target` domain.
pub mod target;

// ============================================================================
// Re-exports
// ============================================================================

pub use page::Page;
pub use runtime::Runtime;
pub use target::Target;

// ============================================================================
// Imports
// ============================================================================

use std::future::Future;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::oneshot;

use crate::client::{Connection, RawHandler, Subscription};
use crate::convert::convert;
use crate::error::{Error, Result};
use crate::identifiers::SessionId;
use crate::protocol::EventIdentity;

// ============================================================================
// Domain
// ============================================================================

/// Shared plumbing for one protocol domain, optionally bound to a session.
#[derive(Debug, Clone)]
pub struct Domain {
    connection: Connection,
    name: &'static str,
    session: Option<SessionId>,
}

impl Domain {
    /// Creates an unscoped facade for domain `name`.
    #[inline]
    #[must_use]
    pub fn new(connection: Connection, name: &'static str) -> Self {
        Self {
            connection,
            name,
            session: None,
        }
    }

    /// Returns a copy bound to `session` (or unscoped for `None`).
    ///
    /// Commands are routed to the session and event accessors listen on the
    /// session-qualified identity.
    #[must_use]
    pub fn with_session(&self, session: impl Into<Option<SessionId>>) -> Self {
        Self {
            connection: self.connection.clone(),
            name: self.name,
            session: session.into().filter(|s| !s.is_empty()),
        }
    }

    /// Returns the domain name.
    #[inline]
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Returns the bound session.
    #[inline]
    #[must_use]
    pub fn session(&self) -> Option<&SessionId> {
        self.session.as_ref()
    }

    /// Returns the underlying connection.
    #[inline]
    #[must_use]
    pub fn connection(&self) -> &Connection {
        &self.connection
    }

    /// Returns the identity `event` is subscribed under.
    #[must_use]
    pub fn identity(&self, event: &str) -> EventIdentity {
        EventIdentity::new(self.name, event, self.session.clone())
    }
}

// ============================================================================
// Domain - Commands
// ============================================================================

impl Domain {
    /// Sends a parameterless command and converts its result.
    ///
    /// # Errors
    ///
    /// Propagates [`Connection::send`] failures.
    pub async fn call<R>(&self, method: &str) -> Result<R>
    where
        R: DeserializeOwned + Default,
    {
        let raw = self.raw(method, None).await?;
        Ok(convert(raw))
    }

    /// Sends a command with `params` and converts its result.
    ///
    /// # Errors
    ///
    /// [`Error::Json`] if `params` cannot be serialized, otherwise
    /// propagates [`Connection::send`] failures.
    pub async fn call_with<P, R>(&self, method: &str, params: &P) -> Result<R>
    where
        P: Serialize + ?Sized,
        R: DeserializeOwned + Default,
    {
        let params = serde_json::to_value(params)?;
        let raw = self.raw(method, Some(params)).await?;
        Ok(convert(raw))
    }

    /// Sends a parameterless command whose result carries nothing.
    ///
    /// # Errors
    ///
    /// Propagates [`Connection::send`] failures.
    pub async fn exec(&self, method: &str) -> Result<()> {
        self.raw(method, None).await.map(drop)
    }

    /// Sends a command with `params` whose result carries nothing.
    ///
    /// # Errors
    ///
    /// Same as [`call_with`](Self::call_with).
    pub async fn exec_with<P>(&self, method: &str, params: &P) -> Result<()>
    where
        P: Serialize + ?Sized,
    {
        let params = serde_json::to_value(params)?;
        self.raw(method, Some(params)).await.map(drop)
    }

    async fn raw(&self, method: &str, params: Option<Value>) -> Result<Value> {
        self.connection
            .send(self.name, method, params, self.session.as_ref())
            .await
    }
}

// ============================================================================
// Domain - Events
// ============================================================================

impl Domain {
    /// Calls `handler` with every `event` notification, converted to `E`.
    pub fn on<E, F>(&self, event: &str, handler: F) -> Subscription
    where
        E: DeserializeOwned + Default,
        F: Fn(E) + Send + Sync + 'static,
    {
        let raw: RawHandler = Arc::new(move |payload: &Value| handler(convert(payload.clone())));
        self.connection.subscribe(self.identity(event), raw)
    }

    /// Resolves with the next `event` notification.
    ///
    /// The subscription is made when this is called, not when the future is
    /// first polled, so it can be created before the command that triggers
    /// the event. It is removed once the event arrives or the future is
    /// dropped.
    ///
    /// # Errors
    ///
    /// [`Error::ConnectionClosed`] if the connection ends first.
    pub fn next_event<E>(&self, event: &str) -> impl Future<Output = Result<E>> + Send + 'static
    where
        E: DeserializeOwned + Default + Send + 'static,
    {
        let (tx, rx) = oneshot::channel::<Value>();
        let slot = Mutex::new(Some(tx));

        let raw: RawHandler = Arc::new(move |payload: &Value| {
            if let Some(tx) = slot.lock().take() {
                let _ = tx.send(payload.clone());
            }
        });

        let guard = UnsubscribeOnDrop(self.connection.subscribe(self.identity(event), raw));
        let closed = self.connection.is_closed();

        async move {
            let _guard = guard;
            if closed {
                return Err(Error::ConnectionClosed);
            }
            let payload = rx.await.map_err(|_| Error::ConnectionClosed)?;
            Ok(convert(payload))
        }
    }
}

/// Scope guard used by [`Domain::next_event`].
struct UnsubscribeOnDrop(Subscription);

impl Drop for UnsubscribeOnDrop {
    fn drop(&mut self) {
        self.0.unsubscribe();
    }
}

// ============================================================================
// Tests
// ============================================================================
