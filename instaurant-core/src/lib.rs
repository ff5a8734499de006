//! Instaurant Core Library
//!
//! Menu models, the remote gateway and the sync layer that keeps the
//! application state in step with it.

pub mod gateway;
pub mod models;
pub mod snapshot;
pub mod store;
pub mod sync;

pub use gateway::{
    AccountHandle, FirebaseConfig, FirebaseGateway, Gateway, GatewayError, GatewayResult,
    MemoryGateway, UploadedFile,
};
pub use models::{Category, Dish, MenuRecord, NewCategory, NewDish};
pub use snapshot::{Snapshot, SnapshotError};
pub use store::{Action, Collection, CollectionAction, FetchStatus, MenuState, Session, Store};
pub use sync::{DishImage, MenuSync, SyncError, SyncResult};

pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!version().is_empty());
    }
}
