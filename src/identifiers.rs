//! Type-safe identifiers for protocol entities.
//!
//! Newtype wrappers prevent mixing incompatible IDs at compile time.
//!
//! | Type | Wire form | Assigned by |
//! |------|-----------|-------------|
//! | [`CommandId`] | integer | local end (correlation) |
//! | [`SessionId`] | string | remote end (`Target.attachToTarget`) |
//! | [`TargetId`] | string | remote end |

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

// ============================================================================
// CommandId
// ============================================================================

/// Correlation id linking an outbound command to its response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommandId(u64);

impl CommandId {
    /// Wraps a raw correlation id.
    #[inline]
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw integer.
    #[inline]
    #[must_use]
    pub const fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for CommandId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// CommandIdGenerator
// ============================================================================

/// Monotonic id source, one per connection. First id is `1`.
#[derive(Debug)]
pub(crate) struct CommandIdGenerator {
    next: AtomicU64,
}

impl CommandIdGenerator {
    pub(crate) const fn new() -> Self {
        Self {
            next: AtomicU64::new(1),
        }
    }

    pub(crate) fn next(&self) -> CommandId {
        CommandId(self.next.fetch_add(1, Ordering::Relaxed))
    }
}

// ============================================================================
// SessionId
// ============================================================================

/// Identifier of one attached debugging target.
///
/// Scopes both commands and events when several targets are attached
/// over the same connection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// Creates a session id from its wire string.
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the wire string.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `true` for the empty string, which the protocol treats as
    /// "no session".
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SessionId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for SessionId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

// ============================================================================
// TargetId
// ============================================================================

/// Identifier of a debuggable target (page, worker, ...).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TargetId(String);

impl TargetId {
    /// Creates a target id from its wire string.
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the wire string.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TargetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TargetId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_ids_are_monotonic_from_one() {
        let ids = CommandIdGenerator::new();
        assert_eq!(ids.next(), CommandId::new(1));
        assert_eq!(ids.next(), CommandId::new(2));
        assert_eq!(ids.next().as_u64(), 3);
    }

    #[test]
    fn test_command_id_wire_form() {
        let json = serde_json::to_string(&CommandId::new(42)).expect("serialize");
        assert_eq!(json, "42");
    }

    #[test]
    fn test_session_id_wire_form() {
        let session = SessionId::from("9A3F");
        assert_eq!(serde_json::to_string(&session).expect("serialize"), "\"9A3F\"");
        assert_eq!(session.to_string(), "9A3F");

        let parsed: SessionId = serde_json::from_str("\"9A3F\"").expect("parse");
        assert_eq!(parsed, session);
    }

    #[test]
    fn test_empty_session_id() {
        assert!(SessionId::default().is_empty());
        assert!(!SessionId::new("x").is_empty());
    }
}
