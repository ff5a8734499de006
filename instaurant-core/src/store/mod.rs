//! Application state store.
//!
//! All mutation goes through [`Store::dispatch`]: the descriptor is applied
//! by the pure [`reduce`] function, the new state is published to
//! [`Store::subscribe`] receivers and the descriptor itself is broadcast to
//! [`Store::observe`] receivers.

mod action;
mod state;

use tokio::sync::{broadcast, watch};

pub use action::{Action, CollectionAction, Session};
pub use state::{reduce, Collection, FetchStatus, MenuState, StateSlice};

/// Descriptors buffered per lagging observer.
const ACTION_BUFFER: usize = 64;

#[derive(Debug)]
pub struct Store {
    state: watch::Sender<MenuState>,
    actions: broadcast::Sender<Action>,
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

impl Store {
    pub fn new() -> Self {
        Self::with_state(MenuState::default())
    }

    pub fn with_state(state: MenuState) -> Self {
        let (state, _) = watch::channel(state);
        let (actions, _) = broadcast::channel(ACTION_BUFFER);
        Self { state, actions }
    }

    /// Runs `f` against the current state.
    ///
    /// `f` must not dispatch; the state is read-locked while it runs.
    pub fn read<T>(&self, f: impl FnOnce(&MenuState) -> T) -> T {
        f(&self.state.borrow())
    }

    /// A copy of the current state.
    pub fn state(&self) -> MenuState {
        self.state.borrow().clone()
    }

    pub fn dispatch(&self, action: Action) {
        self.state.send_modify(|state| reduce(state, &action));
        let _ = self.actions.send(action);
    }

    /// Receiver notified after every dispatch.
    pub fn subscribe(&self) -> watch::Receiver<MenuState> {
        self.state.subscribe()
    }

    /// Receiver of every descriptor dispatched from now on.
    pub fn observe(&self) -> broadcast::Receiver<Action> {
        self.actions.subscribe()
    }
}
