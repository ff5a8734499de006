//! Application state and the reducer that applies descriptors to it.

use std::collections::{BTreeMap, HashMap};

use super::action::{Action, CollectionAction, Session};
use crate::models::{Category, Dish, MenuRecord};

/// Fetch progress of one collection scope.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FetchStatus {
    pub is_fetching: bool,
    pub already_fetched: bool,
}

/// A scoped collection: records keyed by id plus its fetch status.
#[derive(Debug, Clone, PartialEq)]
pub struct Collection<T> {
    pub status: FetchStatus,
    pub items: BTreeMap<String, T>,
}

impl<T> Default for Collection<T> {
    fn default() -> Self {
        Self {
            status: FetchStatus::default(),
            items: BTreeMap::new(),
        }
    }
}

impl<T: MenuRecord> Collection<T> {
    pub fn get(&self, id: &str) -> Option<&T> {
        self.items.get(id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Records sorted by rank, ties broken by id.
    pub fn ordered(&self) -> Vec<&T> {
        let mut items: Vec<&T> = self.items.values().collect();
        items.sort_by(|a, b| a.order().cmp(&b.order()).then_with(|| a.id().cmp(b.id())));
        items
    }

    /// Rank for a record appended at the end.
    pub fn next_order(&self) -> i64 {
        self.items
            .values()
            .map(|item| item.order() + 1)
            .max()
            .unwrap_or(0)
    }
}

/// Everything the UI renders from.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MenuState {
    pub session: Option<Session>,
    /// Categories by owner id.
    pub categories: HashMap<String, Collection<Category>>,
    /// Dishes by category id.
    pub dishes: HashMap<String, Collection<Dish>>,
    pub selected_category: Option<String>,
    pub selected_dish: Option<String>,
}

impl MenuState {
    pub fn collection<R: StateSlice>(&self, scope: &str) -> Option<&Collection<R>> {
        R::scopes(self).get(scope)
    }
}

/// Ties a record type to its place in [`MenuState`] and its [`Action`]
/// variant.
pub trait StateSlice: MenuRecord {
    fn scopes(state: &MenuState) -> &HashMap<String, Collection<Self>>;
    fn scopes_mut(state: &mut MenuState) -> &mut HashMap<String, Collection<Self>>;
    fn action(action: CollectionAction<Self>) -> Action;
    /// Clears the UI selection if it points at `id`.
    fn clear_selection(state: &mut MenuState, id: &str);
}

impl StateSlice for Category {
    fn scopes(state: &MenuState) -> &HashMap<String, Collection<Self>> {
        &state.categories
    }

    fn scopes_mut(state: &mut MenuState) -> &mut HashMap<String, Collection<Self>> {
        &mut state.categories
    }

    fn action(action: CollectionAction<Self>) -> Action {
        Action::Category(action)
    }

    fn clear_selection(state: &mut MenuState, id: &str) {
        if state.selected_category.as_deref() == Some(id) {
            state.selected_category = None;
        }
    }
}

impl StateSlice for Dish {
    fn scopes(state: &MenuState) -> &HashMap<String, Collection<Self>> {
        &state.dishes
    }

    fn scopes_mut(state: &mut MenuState) -> &mut HashMap<String, Collection<Self>> {
        &mut state.dishes
    }

    fn action(action: CollectionAction<Self>) -> Action {
        Action::Dish(action)
    }

    fn clear_selection(state: &mut MenuState, id: &str) {
        if state.selected_dish.as_deref() == Some(id) {
            state.selected_dish = None;
        }
    }
}

/// Applies `action` to `state`.
pub fn reduce(state: &mut MenuState, action: &Action) {
    match action {
        Action::Category(action) => reduce_collection(state, action),
        Action::Dish(action) => reduce_collection(state, action),
        Action::SelectCategory(id) => {
            state.selected_category = id.clone();
            state.selected_dish = None;
        }
        Action::SelectDish(id) => state.selected_dish = id.clone(),
        Action::SignedIn(session) => state.session = Some(session.clone()),
        Action::SignedOut => *state = MenuState::default(),
    }
}

fn reduce_collection<R: StateSlice>(state: &mut MenuState, action: &CollectionAction<R>) {
    let collection = R::scopes_mut(state)
        .entry(action.scope().to_string())
        .or_default();

    match action {
        CollectionAction::FetchingStarted { .. } => {
            collection.status.is_fetching = true;
        }
        CollectionAction::Received { items, .. } => {
            collection.status = FetchStatus {
                is_fetching: false,
                already_fetched: true,
            };
            collection.items = items.clone();
        }
        CollectionAction::FetchFailed { .. } => {
            collection.status.is_fetching = false;
        }
        CollectionAction::Added { item, .. } | CollectionAction::Updated { item, .. } => {
            collection.items.insert(item.id().to_string(), item.clone());
        }
        CollectionAction::Deleted {
            reordered,
            deleted_id,
            ..
        } => {
            collection.items.remove(deleted_id);
            for item in reordered {
                collection.items.insert(item.id().to_string(), item.clone());
            }
            R::clear_selection(state, deleted_id);
        }
    }
}
