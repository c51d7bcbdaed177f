//! Raw payload to typed value conversion.
//!
//! The wire protocol is versioned and most fields are optional, so a
//! payload rarely matches a record exactly. [`convert`] never fails:
//!
//! - absent or `null` payload → `T::default()`
//! - unknown keys → dropped
//! - missing keys → the field's default
//! - a value that does not fit its field → treated as missing
//!
//! Target types are expected to carry `#[serde(default)]`, which is how
//! every record in [`domains`](crate::domains) is declared.
//!
//! # Example
//!
//! ```
//! use devtools_link::convert::convert;
//! use serde::Deserialize;
//! use serde_json::json;
//!
//! #[derive(Debug, Default, Deserialize)]
//! #[serde(default)]
//! struct Point {
//!     x: i64,
//!     y: String,
//! }
//!
//! let point: Point = convert(json!({ "x": 1, "y": "hi", "extra": true }));
//! assert_eq!(point.x, 1);
//! assert_eq!(point.y, "hi");
//!
//! let empty: Point = convert(None);
//! assert_eq!(empty.x, 0);
//! ```

// ============================================================================
// Imports
// ============================================================================

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::trace;

// ============================================================================
// Public API
// ============================================================================

/// Converts a raw payload into `T`, defaulting whatever does not fit.
///
/// Accepts a [`Value`] or an `Option<Value>`.
#[must_use]
pub fn convert<T>(raw: impl Into<Option<Value>>) -> T
where
    T: DeserializeOwned + Default,
{
    let raw = match raw.into() {
        None | Some(Value::Null) => return T::default(),
        Some(raw) => raw,
    };

    match T::deserialize(&raw) {
        Ok(value) => return value,
        Err(e) => trace!(error = %e, "Strict conversion failed, merging field by field"),
    }

    let Value::Object(fields) = raw else {
        trace!("Non-object payload does not fit target, using default");
        return T::default();
    };

    let mut accepted = Value::Object(Map::new());
    merge_fields::<T>(&mut accepted, &mut Vec::new(), fields);

    T::deserialize(&accepted).unwrap_or_default()
}

// ============================================================================
// Field-wise merge
// ============================================================================

/// Copies `fields` into the object at `path` inside `root`, one key at a
/// time, keeping a key only if `root` still deserializes as `T`.
///
/// A rejected object value is retried as an empty object and merged
/// recursively, so one bad nested field does not discard its siblings.
fn merge_fields<T>(root: &mut Value, path: &mut Vec<String>, fields: Map<String, Value>)
where
    T: DeserializeOwned,
{
    for (key, value) in fields {
        let Some(rejected) = try_insert::<T>(root, path, &key, value) else {
            continue;
        };

        let Value::Object(nested) = rejected else {
            trace!(key = %key, "Dropping mismatched field");
            continue;
        };

        if try_insert::<T>(root, path, &key, Value::Object(Map::new())).is_none() {
            path.push(key);
            merge_fields::<T>(root, path, nested);
            path.pop();
        }
    }
}

/// Inserts `value` at `path.key`. Returns `None` if `root` still fits `T`,
/// otherwise restores the previous slot and hands the value back.
fn try_insert<T>(root: &mut Value, path: &[String], key: &str, value: Value) -> Option<Value>
where
    T: DeserializeOwned,
{
    let previous = object_at(root, path)?.insert(key.to_owned(), value);

    if fits::<T>(root) {
        return None;
    }

    let parent = object_at(root, path)?;
    match previous {
        Some(previous) => parent.insert(key.to_owned(), previous),
        None => parent.remove(key),
    }
}

fn object_at<'a>(root: &'a mut Value, path: &[String]) -> Option<&'a mut Map<String, Value>> {
    path.iter()
        .try_fold(root, |node, key| node.get_mut(key.as_str()))?
        .as_object_mut()
}

#[inline]
fn fits<T>(root: &Value) -> bool
where
    T: DeserializeOwned,
{
    T::deserialize(root).is_ok()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    #[derive(Debug, Default, PartialEq, Deserialize)]
    #[serde(default)]
    struct Pair {
        x: i64,
        y: String,
    }

    #[derive(Debug, Default, PartialEq, Deserialize)]
    #[serde(default)]
    struct Inner {
        a: u32,
        b: String,
        tags: Vec<String>,
    }

    #[derive(Debug, Default, PartialEq, Deserialize)]
    #[serde(default, rename_all = "camelCase")]
    struct Outer {
        name: String,
        inner: Inner,
        maybe_count: Option<u64>,
    }

    #[test]
    fn test_absent_is_default() {
        assert_eq!(convert::<Pair>(None), Pair { x: 0, y: String::new() });
        assert_eq!(convert::<Pair>(Value::Null), Pair::default());
    }

    #[test]
    fn test_absent_nested_is_default() {
        let outer: Outer = convert(None);
        assert_eq!(outer.inner, Inner::default());
        assert_eq!(outer.maybe_count, None);
    }

    #[test]
    fn test_unknown_fields_dropped() {
        let pair: Pair = convert(json!({ "x": 1, "y": "hi", "extra": true }));
        assert_eq!(pair.x, 1);
        assert_eq!(pair.y, "hi");
    }

    #[test]
    fn test_missing_fields_default() {
        let pair: Pair = convert(json!({ "y": "only" }));
        assert_eq!(pair, Pair { x: 0, y: "only".into() });
    }

    #[test]
    fn test_mismatched_field_defaults() {
        let pair: Pair = convert(json!({ "x": "not a number", "y": "kept" }));
        assert_eq!(pair, Pair { x: 0, y: "kept".into() });
    }

    #[test]
    fn test_mismatched_nested_field_keeps_siblings() {
        let outer: Outer = convert(json!({
            "name": "frame",
            "inner": { "a": 7, "b": 12, "tags": ["t1", 2] },
            "maybeCount": 3,
            "added": { "in": "v2" }
        }));

        assert_eq!(outer.name, "frame");
        assert_eq!(outer.inner.a, 7);
        assert_eq!(outer.inner.b, "");
        assert!(outer.inner.tags.is_empty());
        assert_eq!(outer.maybe_count, Some(3));
    }

    #[test]
    fn test_nested_scalar_where_object_expected() {
        let outer: Outer = convert(json!({ "name": "n", "inner": 5 }));
        assert_eq!(outer.name, "n");
        assert_eq!(outer.inner, Inner::default());
    }

    #[test]
    fn test_non_object_payload_is_default() {
        assert_eq!(convert::<Pair>(json!([1, 2, 3])), Pair::default());
        assert_eq!(convert::<Pair>(json!("text")), Pair::default());
    }

    #[test]
    fn test_scalar_targets() {
        assert_eq!(convert::<u32>(json!(5)), 5);
        assert_eq!(convert::<u32>(json!("five")), 0);
        assert_eq!(convert::<Value>(json!({ "k": 1 })), json!({ "k": 1 }));
    }

    #[test]
    fn test_each_conversion_is_fresh() {
        let raw = json!({ "x": 2, "y": "a" });
        let first: Pair = convert(raw.clone());
        let mut second: Pair = convert(raw);
        second.x = 99;
        assert_eq!(first.x, 2);
    }
}
