//! Event message types.
//!
//! Events are notifications sent from the remote end to the local end
//! when something happens in the debuggee. They carry no correlation id
//! and may be scoped to an attached session.
//!
//! # Identity
//!
//! Handlers are keyed by [`EventIdentity`]: domain, event name and an
//! optional session. Its wire string is
//!
//! | Scope | Wire string |
//! |-------|-------------|
//! | unscoped | `Domain.eventName` |
//! | session | `Domain.eventName.sessionId` |
//!
//! The string is only a rendering. Equality and hashing use the fields,
//! so names containing `.` never collide.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde_json::Value;

use crate::identifiers::SessionId;

// ============================================================================
// EventIdentity
// ============================================================================

/// Qualified identity of an event subscription.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EventIdentity {
    domain: String,
    event: String,
    session: Option<SessionId>,
}

impl EventIdentity {
    /// Creates an identity. An empty session id means unscoped.
    #[must_use]
    pub fn new(
        domain: impl Into<String>,
        event: impl Into<String>,
        session: Option<SessionId>,
    ) -> Self {
        Self {
            domain: domain.into(),
            event: event.into(),
            session: session.filter(|s| !s.is_empty()),
        }
    }

    /// Creates an identity that matches only unscoped notifications.
    #[inline]
    #[must_use]
    pub fn unscoped(domain: impl Into<String>, event: impl Into<String>) -> Self {
        Self::new(domain, event, None)
    }

    /// Creates an identity bound to one session.
    #[inline]
    #[must_use]
    pub fn scoped(
        domain: impl Into<String>,
        event: impl Into<String>,
        session: impl Into<SessionId>,
    ) -> Self {
        Self::new(domain, event, Some(session.into()))
    }

    /// Builds the identity of an inbound notification from its wire
    /// `method` (`Domain.eventName`) and optional session.
    ///
    /// Returns `None` if `method` has no `.` separator or an empty half.
    #[must_use]
    pub fn from_method(method: &str, session: Option<SessionId>) -> Option<Self> {
        let (domain, event) = method.split_once('.')?;
        if domain.is_empty() || event.is_empty() {
            return None;
        }
        Some(Self::new(domain, event, session))
    }

    /// Returns the domain name.
    #[inline]
    #[must_use]
    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// Returns the event name.
    #[inline]
    #[must_use]
    pub fn event(&self) -> &str {
        &self.event
    }

    /// Returns the session, if scoped.
    #[inline]
    #[must_use]
    pub fn session(&self) -> Option<&SessionId> {
        self.session.as_ref()
    }

    /// Returns `true` if bound to a session.
    #[inline]
    #[must_use]
    pub fn is_scoped(&self) -> bool {
        self.session.is_some()
    }

    /// Returns the wire method `Domain.eventName`.
    #[must_use]
    pub fn wire_method(&self) -> String {
        format!("{}.{}", self.domain, self.event)
    }
}

impl fmt::Display for EventIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.domain, self.event)?;
        if let Some(session) = &self.session {
            write!(f, ".{session}")?;
        }
        Ok(())
    }
}

// ============================================================================
// Event
// ============================================================================

/// An event notification from remote end to local end.
///
/// # Format
///
/// ```json
/// {
///   "method": "Domain.eventName",
///   "params": { ... },
///   "sessionId": "..."
/// }
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct Event {
    /// Event name in `Domain.eventName` format.
    pub method: String,

    /// Event-specific data. `Null` when the member is absent.
    #[serde(default)]
    pub params: Value,

    /// Session the event belongs to; absent for browser-level events.
    #[serde(rename = "sessionId", default)]
    pub session_id: Option<SessionId>,
}

impl Event {
    /// Returns the domain name from the method.
    #[inline]
    #[must_use]
    pub fn domain(&self) -> &str {
        self.method.split('.').next().unwrap_or_default()
    }

    /// Returns the event name from the method.
    #[inline]
    #[must_use]
    pub fn event_name(&self) -> &str {
        self.method
            .split_once('.')
            .map(|(_, name)| name)
            .unwrap_or_default()
    }

    /// Returns the identity this event is dispatched under.
    #[must_use]
    pub fn identity(&self) -> Option<EventIdentity> {
        EventIdentity::from_method(&self.method, self.session_id.clone())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use proptest::prelude::*;

    #[test]
    fn test_identity_wire_strings() {
        let unscoped = EventIdentity::unscoped("Page", "loadEventFired");
        assert_eq!(unscoped.to_string(), "Page.loadEventFired");
        assert!(!unscoped.is_scoped());

        let scoped = EventIdentity::scoped("Page", "loadEventFired", "AB12");
        assert_eq!(scoped.to_string(), "Page.loadEventFired.AB12");
        assert_eq!(scoped.wire_method(), "Page.loadEventFired");
        assert_eq!(scoped.session().map(SessionId::as_str), Some("AB12"));
    }

    #[test]
    fn test_empty_session_is_unscoped() {
        let identity = EventIdentity::new("Page", "loadEventFired", Some(SessionId::default()));
        assert_eq!(identity, EventIdentity::unscoped("Page", "loadEventFired"));
        assert_eq!(identity.to_string(), "Page.loadEventFired");
    }

    #[test]
    fn test_separator_in_names_does_not_collide() {
        let a = EventIdentity::unscoped("A.b", "c");
        let b = EventIdentity::unscoped("A", "b.c");
        assert_eq!(a.to_string(), b.to_string());
        assert_ne!(a, b);

        let c = EventIdentity::scoped("A", "b", "c");
        assert_eq!(c.to_string(), "A.b.c");
        assert_ne!(b, c);
    }

    #[test]
    fn test_from_method() {
        let identity =
            EventIdentity::from_method("Target.attachedToTarget", Some(SessionId::new("S")))
                .expect("valid method");
        assert_eq!(identity.domain(), "Target");
        assert_eq!(identity.event(), "attachedToTarget");
        assert_eq!(identity, EventIdentity::scoped("Target", "attachedToTarget", "S"));

        assert!(EventIdentity::from_method("noSeparator", None).is_none());
        assert!(EventIdentity::from_method(".event", None).is_none());
        assert!(EventIdentity::from_method("Domain.", None).is_none());
    }

    #[test]
    fn test_event_parsing() {
        let json_str = r#"{
            "method": "Page.frameNavigated",
            "params": { "frame": { "id": "F1", "url": "https://example.com" } },
            "sessionId": "S-1"
        }"#;

        let event: Event = serde_json::from_str(json_str).expect("parse event");
        assert_eq!(event.domain(), "Page");
        assert_eq!(event.event_name(), "frameNavigated");
        assert_eq!(
            event.identity(),
            Some(EventIdentity::scoped("Page", "frameNavigated", "S-1"))
        );
    }

    #[test]
    fn test_event_without_params() {
        let event: Event =
            serde_json::from_str(r#"{"method": "Page.domContentEventFired"}"#).expect("parse");
        assert!(event.params.is_null());
        assert_eq!(
            event.identity(),
            Some(EventIdentity::unscoped("Page", "domContentEventFired"))
        );
    }

    proptest! {
        #[test]
        fn prop_identity_equality_is_structural(
            d1 in "[A-Za-z.]{1,6}", e1 in "[a-z.]{1,6}", s1 in proptest::option::of("[A-Z0-9.]{1,4}"),
            d2 in "[A-Za-z.]{1,6}", e2 in "[a-z.]{1,6}", s2 in proptest::option::of("[A-Z0-9.]{1,4}"),
        ) {
            let a = EventIdentity::new(d1.clone(), e1.clone(), s1.clone().map(SessionId::new));
            let b = EventIdentity::new(d2.clone(), e2.clone(), s2.clone().map(SessionId::new));
            prop_assert_eq!(a == b, (d1, e1, s1) == (d2, e2, s2));
        }

        #[test]
        fn prop_wire_string_layout(
            domain in "[A-Z][A-Za-z]{0,8}", event in "[a-z][A-Za-z]{0,12}", session in proptest::option::of("[A-F0-9]{1,16}"),
        ) {
            let identity = EventIdentity::new(domain.clone(), event.clone(), session.clone().map(SessionId::new));
            let expected = match session {
                Some(session) => format!("{domain}.{event}.{session}"),
                None => format!("{domain}.{event}"),
            };
            prop_assert_eq!(identity.to_string(), expected);
        }
    }
}
