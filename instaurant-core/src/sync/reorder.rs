//! Delete-with-reorder planning.
//!
//! Removing an entry closes the gap it leaves: every sibling ranked after
//! it moves up by one. Both effects are sent as one multi-location patch.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::gateway::Fields;
use crate::models::MenuRecord;

/// The remote and local effects of deleting one entry.
#[derive(Debug, Clone, PartialEq)]
pub struct DeletePlan<T> {
    pub deleted_id: String,
    /// Siblings ranked after the deleted entry, with their new rank.
    pub reordered: Vec<T>,
}

impl<T: MenuRecord> DeletePlan<T> {
    /// Multi-location patch relative to the scope path: the deleted id maps
    /// to `null` and each moved sibling's `order` to its new rank.
    pub fn to_patch(&self) -> Fields {
        let mut patch = Fields::new();
        patch.insert(self.deleted_id.clone(), Value::Null);
        for item in &self.reordered {
            patch.insert(format!("{}/order", item.id()), Value::from(item.order()));
        }
        patch
    }
}

/// Plans the deletion of `target_id`, or `None` if it is not in `items`.
pub fn plan_delete<T: MenuRecord>(
    items: &BTreeMap<String, T>,
    target_id: &str,
) -> Option<DeletePlan<T>> {
    let target_order = items.get(target_id)?.order();

    let mut reordered: Vec<T> = items
        .values()
        .filter(|item| item.id() != target_id && item.order() > target_order)
        .cloned()
        .map(|mut item| {
            item.set_order(item.order() - 1);
            item
        })
        .collect();
    reordered.sort_by_key(|item| item.order());

    Some(DeletePlan {
        deleted_id: target_id.to_string(),
        reordered,
    })
}
