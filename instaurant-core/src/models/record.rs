use std::fmt::Debug;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::snapshot::{Snapshot, SnapshotError};

/// A menu entry stored in an owner- or category-scoped ordered collection.
pub trait MenuRecord: Clone + Debug + PartialEq + Send + Sync + 'static {
    /// Fields supplied when creating a new entry (everything but the id).
    type New: Serialize + Send + Sync;

    /// Root of the remote collection, e.g. `categories`.
    const COLLECTION: &'static str;

    fn id(&self) -> &str;
    fn name(&self) -> &str;
    fn order(&self) -> i64;
    fn set_order(&mut self, order: i64);

    /// Normalizes a single-entry snapshot into a record keyed by the
    /// snapshot's key.
    fn from_snapshot(snapshot: &Snapshot) -> Result<Self, SnapshotError>;

    /// Remote path of the collection for a scope key.
    fn scope_path(scope: &str) -> String {
        format!("{}/{}", Self::COLLECTION, scope)
    }

    /// Remote path of a single entry.
    fn entry_path(scope: &str, id: &str) -> String {
        format!("{}/{}/{}", Self::COLLECTION, scope, id)
    }
}

/// Decodes the value of an existing entry, returning its key alongside.
pub(crate) fn decode_entry<T: DeserializeOwned>(
    snapshot: &Snapshot,
) -> Result<(String, T), SnapshotError> {
    let key = snapshot.require_key()?.to_string();
    if !snapshot.exists() {
        return Err(SnapshotError::Missing(key));
    }
    let fields = serde_json::from_value(snapshot.val().clone()).map_err(|e| {
        SnapshotError::Malformed {
            key: key.clone(),
            reason: e.to_string(),
        }
    })?;
    Ok((key, fields))
}
