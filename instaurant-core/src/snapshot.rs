//! Immutable read results returned by the remote database.
//!
//! A [`Snapshot`] is either a single entry (a key plus its value) or an
//! ordered set of entries (a key whose value is an object of children).
//! An absent location is represented by a `null` value.

use std::cmp::Ordering;

use serde_json::Value;
use thiserror::Error;

/// Errors raised while turning a snapshot into a domain record.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SnapshotError {
    #[error("Snapshot has no key")]
    MissingKey,

    #[error("Snapshot '{0}' does not exist")]
    Missing(String),

    #[error("Malformed entry '{key}': {reason}")]
    Malformed { key: String, reason: String },
}

/// A read result from the remote database.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    key: Option<String>,
    value: Value,
}

impl Snapshot {
    pub fn new(key: Option<String>, value: Value) -> Self {
        Self { key, value }
    }

    /// Snapshot of a location that holds no data.
    pub fn empty(key: Option<String>) -> Self {
        Self {
            key,
            value: Value::Null,
        }
    }

    /// Returns true if the location holds any data.
    pub fn exists(&self) -> bool {
        !self.value.is_null()
    }

    /// The last path segment of the location, `None` for the root.
    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    pub fn val(&self) -> &Value {
        &self.value
    }

    pub fn into_value(self) -> Value {
        self.value
    }

    /// Snapshot of a direct child of this location.
    pub fn child(&self, key: &str) -> Snapshot {
        let value = self.value.get(key).cloned().unwrap_or(Value::Null);
        Snapshot::new(Some(key.to_string()), value)
    }

    /// Direct children ordered by their `order` value, ties broken by key.
    ///
    /// Children without an `order` sort first, matching the backend's
    /// order-by-child rules for missing values.
    pub fn children(&self) -> Vec<Snapshot> {
        let Some(map) = self.value.as_object() else {
            return Vec::new();
        };

        let mut children: Vec<Snapshot> = map
            .iter()
            .filter(|(_, v)| !v.is_null())
            .map(|(k, v)| Snapshot::new(Some(k.clone()), v.clone()))
            .collect();

        children.sort_by(|a, b| {
            compare_order(a.value.get("order"), b.value.get("order"))
                .then_with(|| a.key.cmp(&b.key))
        });
        children
    }

    /// Reads the key, failing if this is the root snapshot.
    pub fn require_key(&self) -> Result<&str, SnapshotError> {
        self.key().ok_or(SnapshotError::MissingKey)
    }
}

fn compare_order(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    let rank = |v: Option<&Value>| v.and_then(Value::as_f64);
    match (rank(a), rank(b)) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_snapshot_does_not_exist() {
        let snapshot = Snapshot::empty(Some("owner-1".into()));
        assert!(!snapshot.exists());
        assert!(snapshot.children().is_empty());
        assert_eq!(snapshot.key(), Some("owner-1"));
    }

    #[test]
    fn test_children_sorted_by_order() {
        let snapshot = Snapshot::new(
            Some("owner-1".into()),
            json!({
                "c": { "name": "Desserts", "order": 2 },
                "a": { "name": "Starters", "order": 0 },
                "b": { "name": "Mains", "order": 1 },
            }),
        );

        let keys: Vec<_> = snapshot
            .children()
            .iter()
            .map(|c| c.key().unwrap().to_string())
            .collect();
        assert_eq!(keys, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_children_ties_and_missing_order() {
        let snapshot = Snapshot::new(
            None,
            json!({
                "z": { "order": 1 },
                "y": { "order": 1 },
                "x": { "name": "no order" },
                "gone": null,
            }),
        );

        let keys: Vec<_> = snapshot
            .children()
            .iter()
            .map(|c| c.key().unwrap().to_string())
            .collect();
        assert_eq!(keys, vec!["x", "y", "z"]);
    }

    #[test]
    fn test_child_lookup() {
        let snapshot = Snapshot::new(None, json!({ "a": { "name": "Starters" } }));
        assert!(snapshot.child("a").exists());
        assert!(!snapshot.child("b").exists());
        assert_eq!(snapshot.child("a").val()["name"], "Starters");
    }

    #[test]
    fn test_require_key() {
        assert_eq!(
            Snapshot::empty(None).require_key(),
            Err(SnapshotError::MissingKey)
        );
    }
}
