use std::collections::BTreeMap;

use crate::store::FetchStatus;

/// Returns true if a scope should be fetched from the remote database.
///
/// A fetch is skipped while one is in flight, after one has completed, or
/// when records are already cached locally.
pub fn should_fetch<T>(status: FetchStatus, items: &BTreeMap<String, T>) -> bool {
    !(status.is_fetching || status.already_fetched || !items.is_empty())
}
