//! Session-scoped event routing.
//!
//! The [`EventRouter`] maps an [`EventIdentity`] to the ordered list of
//! handlers registered for it. The event loop dispatches every inbound
//! notification under the identity built from its method and session, so
//! a handler registered for one session never sees another session's
//! events, and an unscoped handler sees only unscoped ones.
//!
//! # Unsubscription
//!
//! [`EventRouter::subscribe`] returns a [`Subscription`] holding the exact
//! (identity, handler) pair. Calling [`Subscription::unsubscribe`] any
//! number of times is safe, including after the router is gone.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use serde_json::Value;
use tracing::{debug, error, trace};

use crate::protocol::EventIdentity;

// ============================================================================
// Types
// ============================================================================

/// Raw event handler, called with the notification's `params`.
///
/// Handlers are compared by pointer, so keep the `Arc` you registered if
/// you intend to [`EventRouter::remove`] it.
pub type RawHandler = Arc<dyn Fn(&Value) + Send + Sync>;

/// Handler lists keyed by identity, in registration order.
type HandlerMap = FxHashMap<EventIdentity, Vec<RawHandler>>;

// ============================================================================
// EventRouter
// ============================================================================

/// Registry of event handlers keyed by qualified identity.
///
/// # Thread Safety
///
/// All operations take `&self`. Dispatch copies the handler list before
/// calling it, so handlers may subscribe or unsubscribe from inside a
/// callback without deadlocking.
#[derive(Default)]
pub struct EventRouter {
    handlers: Mutex<HandlerMap>,
}

impl EventRouter {
    /// Creates an empty router.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `handler` to the handlers for `identity`.
    pub fn on(&self, identity: EventIdentity, handler: RawHandler) {
        trace!(%identity, "Handler registered");
        self.handlers.lock().entry(identity).or_default().push(handler);
    }

    /// Removes one registration of `handler` for `identity`.
    ///
    /// Returns `false` if the pair was not registered.
    pub fn remove(&self, identity: &EventIdentity, handler: &RawHandler) -> bool {
        let mut handlers = self.handlers.lock();

        let Some(list) = handlers.get_mut(identity) else {
            return false;
        };
        let Some(index) = list.iter().position(|h| Arc::ptr_eq(h, handler)) else {
            return false;
        };

        list.remove(index);
        if list.is_empty() {
            handlers.remove(identity);
        }

        trace!(%identity, "Handler removed");
        true
    }

    /// Registers `handler` and returns the handle that removes it again.
    pub fn subscribe(self: &Arc<Self>, identity: EventIdentity, handler: RawHandler) -> Subscription {
        self.on(identity.clone(), Arc::clone(&handler));

        Subscription {
            identity,
            handler,
            router: Arc::downgrade(self),
            active: AtomicBool::new(true),
        }
    }

    /// Invokes every handler registered for `identity`, in order.
    ///
    /// A panicking handler is logged and skipped. Returns the number of
    /// handlers invoked.
    pub fn dispatch(&self, identity: &EventIdentity, payload: &Value) -> usize {
        let snapshot = match self.handlers.lock().get(identity) {
            Some(list) => list.clone(),
            None => {
                trace!(%identity, "No handlers for event");
                return 0;
            }
        };

        for handler in &snapshot {
            if catch_unwind(AssertUnwindSafe(|| handler(payload))).is_err() {
                error!(%identity, "Event handler panicked");
            }
        }

        snapshot.len()
    }

    /// Returns the number of handlers registered for `identity`.
    #[inline]
    #[must_use]
    pub fn handler_count(&self, identity: &EventIdentity) -> usize {
        self.handlers.lock().get(identity).map_or(0, Vec::len)
    }

    /// Returns the number of identities with at least one handler.
    #[inline]
    #[must_use]
    pub fn identity_count(&self) -> usize {
        self.handlers.lock().len()
    }

    /// Drops every registration.
    pub fn clear(&self) {
        let dropped: Vec<_> = self.handlers.lock().drain().collect();
        if !dropped.is_empty() {
            debug!(count = dropped.len(), "Cleared event handlers");
        }
    }
}

impl fmt::Debug for EventRouter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventRouter")
            .field("identities", &self.identity_count())
            .finish()
    }
}

// ============================================================================
// Subscription
// ============================================================================

/// Handle to one event registration.
///
/// Dropping the handle does NOT unsubscribe: the registration lives until
/// [`unsubscribe`](Self::unsubscribe) is called or the connection closes.
pub struct Subscription {
    identity: EventIdentity,
    handler: RawHandler,
    router: Weak<EventRouter>,
    active: AtomicBool,
}

impl Subscription {
    /// Removes the registration. Later calls do nothing.
    pub fn unsubscribe(&self) {
        if !self.active.swap(false, Ordering::AcqRel) {
            return;
        }
        if let Some(router) = self.router.upgrade() {
            router.remove(&self.identity, &self.handler);
        }
    }

    /// Returns the identity this subscription listens on.
    #[inline]
    #[must_use]
    pub fn identity(&self) -> &EventIdentity {
        &self.identity
    }

    /// Returns `true` until [`unsubscribe`](Self::unsubscribe) is called.
    #[inline]
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("identity", &self.identity)
            .field("active", &self.is_active())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Tests
// ============================================================================
