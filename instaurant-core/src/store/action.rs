//! State-transition descriptors applied by the [`Store`](super::Store).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::models::{Category, Dish};

/// The signed-in owner as seen by the application state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub uid: String,
    pub email: String,
}

/// Transitions of one scoped, ordered collection.
#[derive(Debug, Clone, PartialEq)]
pub enum CollectionAction<T> {
    /// A fetch for `scope` has been issued.
    FetchingStarted { scope: String },
    /// The fetch for `scope` completed with `items` keyed by id.
    Received {
        scope: String,
        items: BTreeMap<String, T>,
    },
    /// The fetch for `scope` failed; the scope may be fetched again.
    FetchFailed { scope: String },
    Added { scope: String, item: T },
    Updated { scope: String, item: T },
    /// `deleted_id` was removed and `reordered` carry their new ranks.
    Deleted {
        scope: String,
        reordered: Vec<T>,
        deleted_id: String,
    },
}

impl<T> CollectionAction<T> {
    pub fn scope(&self) -> &str {
        match self {
            CollectionAction::FetchingStarted { scope }
            | CollectionAction::Received { scope, .. }
            | CollectionAction::FetchFailed { scope }
            | CollectionAction::Added { scope, .. }
            | CollectionAction::Updated { scope, .. }
            | CollectionAction::Deleted { scope, .. } => scope,
        }
    }

    /// Short name of the transition, e.g. `received`.
    pub fn kind(&self) -> &'static str {
        match self {
            CollectionAction::FetchingStarted { .. } => "fetching",
            CollectionAction::Received { .. } => "received",
            CollectionAction::FetchFailed { .. } => "fetch-failed",
            CollectionAction::Added { .. } => "added",
            CollectionAction::Updated { .. } => "updated",
            CollectionAction::Deleted { .. } => "deleted",
        }
    }
}

/// Every transition the application state understands.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Category(CollectionAction<Category>),
    Dish(CollectionAction<Dish>),
    SelectCategory(Option<String>),
    SelectDish(Option<String>),
    SignedIn(Session),
    /// Clears the session and every cached collection.
    SignedOut,
}
