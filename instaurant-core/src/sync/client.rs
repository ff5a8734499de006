//! Synchronization between the application store and the remote service.
//!
//! Every operation follows the same shape: consult the store if needed,
//! perform the remote call, and only after it is confirmed dispatch a
//! descriptor describing the change. Nothing is dispatched for a failed
//! remote write.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use super::error::{SyncError, SyncResult};
use super::guard::should_fetch;
use super::reorder::plan_delete;
use crate::gateway::{AccountHandle, Fields, Gateway};
use crate::models::{Dish, MenuRecord, NewDish};
use crate::snapshot::{Snapshot, SnapshotError};
use crate::store::{Action, CollectionAction, Session, StateSlice, Store};

/// An image to upload alongside a new dish.
#[derive(Debug, Clone, PartialEq)]
pub struct DishImage {
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub content_type: String,
}

impl DishImage {
    /// Creates an image, guessing the content type from the file extension.
    ///
    /// Any directory part of `file_name` is dropped.
    pub fn new(file_name: impl AsRef<str>, bytes: Vec<u8>) -> Self {
        let file_name = Path::new(file_name.as_ref())
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image".to_string());
        let content_type = content_type_for(&file_name).to_string();

        Self {
            file_name,
            bytes,
            content_type,
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = content_type.into();
        self
    }
}

fn content_type_for(file_name: &str) -> &'static str {
    let extension = Path::new(file_name)
        .extension()
        .map(|ext| ext.to_string_lossy().to_lowercase());

    match extension.as_deref() {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("svg") => "image/svg+xml",
        _ => "application/octet-stream",
    }
}

/// Normalizes an ordered-collection snapshot into records keyed by id.
///
/// A snapshot of an absent location yields an empty collection.
pub fn normalize_collection<R: MenuRecord>(
    snapshot: &Snapshot,
) -> Result<BTreeMap<String, R>, SnapshotError> {
    if !snapshot.exists() {
        return Ok(BTreeMap::new());
    }

    snapshot
        .children()
        .iter()
        .map(|child| R::from_snapshot(child).map(|record| (record.id().to_string(), record)))
        .collect()
}

fn to_fields<T: Serialize + ?Sized>(value: &T) -> SyncResult<Fields> {
    match serde_json::to_value(value) {
        Ok(Value::Object(fields)) => Ok(fields),
        Ok(other) => Err(SyncError::Encode(format!(
            "expected an object, got {}",
            other
        ))),
        Err(e) => Err(SyncError::Encode(e.to_string())),
    }
}

fn session_of(account: &AccountHandle) -> Session {
    Session {
        uid: account.uid.clone(),
        email: account.email.clone(),
    }
}

/// Mediates between a [`Store`] and a [`Gateway`].
#[derive(Clone)]
pub struct MenuSync {
    gateway: Arc<dyn Gateway>,
    store: Arc<Store>,
}

impl MenuSync {
    pub fn new(gateway: Arc<dyn Gateway>, store: Arc<Store>) -> Self {
        Self { gateway, store }
    }

    pub fn store(&self) -> &Arc<Store> {
        &self.store
    }

    pub fn gateway(&self) -> &Arc<dyn Gateway> {
        &self.gateway
    }

    // ========== Collections ==========

    /// Fetches the collection for `scope` unless it is in flight, already
    /// fetched, or cached.
    ///
    /// `FetchingStarted` is dispatched before the first suspension point,
    /// so a concurrent caller for the same scope sees the fetch in flight
    /// and returns immediately.
    pub async fn fetch_if_needed<R: StateSlice>(&self, scope: &str) -> SyncResult<()> {
        let needed = self.store.read(|state| match state.collection::<R>(scope) {
            Some(collection) => should_fetch(collection.status, &collection.items),
            None => true,
        });
        if !needed {
            return Ok(());
        }

        self.store
            .dispatch(R::action(CollectionAction::FetchingStarted {
                scope: scope.to_string(),
            }));

        match self.fetch_collection::<R>(scope).await {
            Ok(items) => {
                self.store.dispatch(R::action(CollectionAction::Received {
                    scope: scope.to_string(),
                    items,
                }));
                Ok(())
            }
            Err(e) => {
                self.store.dispatch(R::action(CollectionAction::FetchFailed {
                    scope: scope.to_string(),
                }));
                Err(e)
            }
        }
    }

    async fn fetch_collection<R: StateSlice>(
        &self,
        scope: &str,
    ) -> SyncResult<BTreeMap<String, R>> {
        let snapshot = self
            .gateway
            .fetch_ordered_collection(&R::scope_path(scope))
            .await?;
        Ok(normalize_collection(&snapshot)?)
    }

    /// Creates a record under `scope` and dispatches `Added` with the stored
    /// version.
    pub async fn add_item<R: StateSlice>(&self, scope: &str, fields: &R::New) -> SyncResult<R> {
        let snapshot = self
            .gateway
            .create_entry(&R::scope_path(scope), to_fields(fields)?)
            .await?;
        let item = R::from_snapshot(&snapshot)?;

        self.store.dispatch(R::action(CollectionAction::Added {
            scope: scope.to_string(),
            item: item.clone(),
        }));
        Ok(item)
    }

    pub async fn rename_item<R: StateSlice>(
        &self,
        scope: &str,
        id: &str,
        new_name: &str,
    ) -> SyncResult<R> {
        let mut fields = Fields::new();
        fields.insert("name".to_string(), Value::from(new_name));

        let snapshot = self
            .gateway
            .update_entry(&R::entry_path(scope, id), fields)
            .await?;
        let item = R::from_snapshot(&snapshot)?;

        self.store.dispatch(R::action(CollectionAction::Updated {
            scope: scope.to_string(),
            item: item.clone(),
        }));
        Ok(item)
    }

    /// Removes `target_id` and closes the rank gap in one remote write.
    ///
    /// The plan is computed from the locally cached collection, so the scope
    /// must have been fetched (or populated) first.
    pub async fn delete_item<R: StateSlice>(
        &self,
        scope: &str,
        target_id: &str,
    ) -> SyncResult<()> {
        let plan = self
            .store
            .read(|state| {
                state
                    .collection::<R>(scope)
                    .and_then(|collection| plan_delete(&collection.items, target_id))
            })
            .ok_or_else(|| SyncError::NotFound {
                collection: R::COLLECTION,
                scope: scope.to_string(),
                id: target_id.to_string(),
            })?;

        self.gateway
            .patch_multiple(&R::scope_path(scope), plan.to_patch())
            .await?;

        self.store.dispatch(R::action(CollectionAction::Deleted {
            scope: scope.to_string(),
            reordered: plan.reordered,
            deleted_id: plan.deleted_id,
        }));
        Ok(())
    }

    /// Creates a dish and attaches an uploaded image to it.
    ///
    /// The entry is created first so the upload can be stored under
    /// `dishes/{dishId}/{fileName}`. `Added` is dispatched only once the
    /// upload succeeded and the image URL was written. If the upload fails
    /// the error carries the storage code and the entry stays behind
    /// without an image.
    pub async fn add_dish_with_image(
        &self,
        category_id: &str,
        fields: &NewDish,
        image: DishImage,
    ) -> SyncResult<Dish> {
        let created = self
            .gateway
            .create_entry(&Dish::scope_path(category_id), to_fields(fields)?)
            .await?;
        let dish_id = created.require_key()?.to_string();

        let upload_path = format!("{}/{}/{}", Dish::COLLECTION, dish_id, image.file_name);
        let uploaded = self
            .gateway
            .upload_file(&upload_path, image.bytes, &image.content_type)
            .await?;

        let mut patch = Fields::new();
        patch.insert("imageUrl".to_string(), Value::from(uploaded.url));
        let snapshot = self
            .gateway
            .update_entry(&Dish::entry_path(category_id, &dish_id), patch)
            .await?;
        let dish = Dish::from_snapshot(&snapshot)?;

        self.store.dispatch(Action::Dish(CollectionAction::Added {
            scope: category_id.to_string(),
            item: dish.clone(),
        }));
        Ok(dish)
    }

    pub fn select_category(&self, id: Option<&str>) {
        self.store
            .dispatch(Action::SelectCategory(id.map(str::to_string)));
    }

    pub fn select_dish(&self, id: Option<&str>) {
        self.store.dispatch(Action::SelectDish(id.map(str::to_string)));
    }

    // ========== Session ==========

    /// Registers a new owner and records it under `owners/{uid}`.
    pub async fn create_account(&self, email: &str, password: &str) -> SyncResult<AccountHandle> {
        let account = self.gateway.create_account(email, password).await?;

        let mut owner = Fields::new();
        owner.insert("email".to_string(), Value::from(account.email.clone()));
        self.gateway
            .update_entry(&format!("owners/{}", account.uid), owner)
            .await?;

        self.store.dispatch(Action::SignedIn(session_of(&account)));
        Ok(account)
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> SyncResult<AccountHandle> {
        let account = self.gateway.sign_in(email, password).await?;
        self.store.dispatch(Action::SignedIn(session_of(&account)));
        Ok(account)
    }

    pub async fn sign_out(&self) -> SyncResult<()> {
        self.gateway.sign_out().await?;
        self.store.dispatch(Action::SignedOut);
        Ok(())
    }

    pub async fn reset_password(&self, email: &str) -> SyncResult<()> {
        self.gateway.reset_password(email).await?;
        Ok(())
    }

    pub fn current_account(&self) -> Option<AccountHandle> {
        self.gateway.current_account()
    }

    /// Records the gateway's signed-in account in the store, if any.
    pub fn resume_session(&self) -> Option<Session> {
        let session = session_of(&self.gateway.current_account()?);
        self.store.dispatch(Action::SignedIn(session.clone()));
        Some(session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::{GatewayError, GatewayResult, MemoryGateway, UploadedFile};
    use crate::models::{Category, NewCategory};
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicBool, Ordering};
    use tokio::sync::{broadcast, Notify};

    /// Memory gateway whose fetches can be held open or made to fail.
    #[derive(Default)]
    struct ScriptedGateway {
        inner: MemoryGateway,
        gate: Option<Arc<Notify>>,
        fail_fetches: AtomicBool,
    }

    #[async_trait]
    impl Gateway for ScriptedGateway {
        async fn create_account(
            &self,
            email: &str,
            password: &str,
        ) -> GatewayResult<AccountHandle> {
            self.inner.create_account(email, password).await
        }

        async fn sign_in(&self, email: &str, password: &str) -> GatewayResult<AccountHandle> {
            self.inner.sign_in(email, password).await
        }

        async fn sign_out(&self) -> GatewayResult<()> {
            self.inner.sign_out().await
        }

        async fn reset_password(&self, email: &str) -> GatewayResult<()> {
            self.inner.reset_password(email).await
        }

        fn current_account(&self) -> Option<AccountHandle> {
            self.inner.current_account()
        }

        async fn fetch_ordered_collection(&self, path: &str) -> GatewayResult<Snapshot> {
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            if self.fail_fetches.load(Ordering::SeqCst) {
                return Err(GatewayError::Server {
                    status: 503,
                    message: "unavailable".into(),
                });
            }
            self.inner.fetch_ordered_collection(path).await
        }

        async fn create_entry(&self, path: &str, fields: Fields) -> GatewayResult<Snapshot> {
            self.inner.create_entry(path, fields).await
        }

        async fn update_entry(&self, path: &str, fields: Fields) -> GatewayResult<Snapshot> {
            self.inner.update_entry(path, fields).await
        }

        async fn patch_multiple(&self, path: &str, updates: Fields) -> GatewayResult<()> {
            self.inner.patch_multiple(path, updates).await
        }

        async fn upload_file(
            &self,
            path: &str,
            bytes: Vec<u8>,
            content_type: &str,
        ) -> GatewayResult<UploadedFile> {
            self.inner.upload_file(path, bytes, content_type).await
        }
    }

    fn setup() -> (MenuSync, Arc<MemoryGateway>) {
        let gateway = Arc::new(MemoryGateway::new());
        let sync = MenuSync::new(gateway.clone(), Arc::new(Store::new()));
        (sync, gateway)
    }

    fn drain(rx: &mut broadcast::Receiver<Action>) -> Vec<Action> {
        let mut actions = Vec::new();
        while let Ok(action) = rx.try_recv() {
            actions.push(action);
        }
        actions
    }

    fn kinds(actions: &[Action]) -> Vec<&'static str> {
        actions
            .iter()
            .map(|action| match action {
                Action::Category(a) => a.kind(),
                Action::Dish(a) => a.kind(),
                Action::SelectCategory(_) | Action::SelectDish(_) => "select",
                Action::SignedIn(_) => "signed-in",
                Action::SignedOut => "signed-out",
            })
            .collect()
    }

    async fn seed_categories(gateway: &MemoryGateway, owner: &str, names: &[&str]) {
        let mut entries = Fields::new();
        for (order, name) in names.iter().enumerate() {
            entries.insert(
                name.to_lowercase(),
                json!({ "name": name, "order": order }),
            );
        }
        gateway
            .patch_multiple(&Category::scope_path(owner), entries)
            .await
            .unwrap();
    }

    fn ranks(sync: &MenuSync, owner: &str) -> Vec<(String, i64)> {
        sync.store().read(|state| {
            state
                .collection::<Category>(owner)
                .map(|c| {
                    c.ordered()
                        .iter()
                        .map(|cat| (cat.id.clone(), cat.order))
                        .collect()
                })
                .unwrap_or_default()
        })
    }

    #[tokio::test]
    async fn test_fetch_if_needed_populates_store() {
        let (sync, gateway) = setup();
        seed_categories(&gateway, "o1", &["Starters", "Mains"]).await;
        let mut rx = sync.store().observe();

        sync.fetch_if_needed::<Category>("o1").await.unwrap();

        assert_eq!(kinds(&drain(&mut rx)), vec!["fetching", "received"]);
        assert_eq!(
            ranks(&sync, "o1"),
            vec![("starters".to_string(), 0), ("mains".to_string(), 1)]
        );
        let status = sync
            .store()
            .read(|s| s.collection::<Category>("o1").unwrap().status);
        assert!(status.already_fetched);
        assert!(!status.is_fetching);
    }

    #[tokio::test]
    async fn test_received_round_trip() {
        let (sync, gateway) = setup();
        gateway
            .patch_multiple(
                "categories/o1",
                json!({ "k": { "name": "Drinks", "order": 4 } })
                    .as_object()
                    .cloned()
                    .unwrap(),
            )
            .await
            .unwrap();

        sync.fetch_if_needed::<Category>("o1").await.unwrap();

        let stored = sync
            .store()
            .read(|s| s.collection::<Category>("o1").unwrap().get("k").cloned());
        assert_eq!(
            stored,
            Some(Category {
                id: "k".into(),
                name: "Drinks".into(),
                order: 4,
            })
        );
    }

    #[tokio::test]
    async fn test_fetch_twice_fetches_once() {
        let (sync, gateway) = setup();
        seed_categories(&gateway, "o1", &["Starters"]).await;
        let mut rx = sync.store().observe();

        let (first, second) = tokio::join!(
            sync.fetch_if_needed::<Category>("o1"),
            sync.fetch_if_needed::<Category>("o1")
        );
        first.unwrap();
        second.unwrap();

        assert_eq!(gateway.fetch_count(), 1);
        let actions = drain(&mut rx);
        assert_eq!(
            kinds(&actions).iter().filter(|k| **k == "received").count(),
            1
        );
    }

    #[tokio::test]
    async fn test_in_flight_fetch_blocks_second_caller() {
        let gate = Arc::new(Notify::new());
        let gateway = Arc::new(ScriptedGateway {
            gate: Some(gate.clone()),
            ..ScriptedGateway::default()
        });
        let sync = MenuSync::new(gateway.clone(), Arc::new(Store::new()));
        let mut rx = sync.store().observe();

        let (first, second, _) = tokio::join!(
            sync.fetch_if_needed::<Category>("o1"),
            async {
                let fetching = sync.store().read(|s| {
                    s.collection::<Category>("o1")
                        .map(|c| c.status.is_fetching)
                });
                assert_eq!(fetching, Some(true));
                sync.fetch_if_needed::<Category>("o1").await
            },
            async { gate.notify_one() }
        );
        first.unwrap();
        second.unwrap();

        assert_eq!(gateway.inner.fetch_count(), 1);
        assert_eq!(kinds(&drain(&mut rx)), vec!["fetching", "received"]);
    }

    #[tokio::test]
    async fn test_cached_or_fetched_scope_is_not_refetched() {
        let (sync, gateway) = setup();

        sync.fetch_if_needed::<Category>("empty-owner").await.unwrap();
        sync.fetch_if_needed::<Category>("empty-owner").await.unwrap();
        assert_eq!(gateway.fetch_count(), 1);

        let collection = sync
            .store()
            .read(|s| s.collection::<Category>("empty-owner").cloned())
            .unwrap();
        assert!(collection.is_empty());
        assert!(collection.status.already_fetched);

        sync.add_item::<Category>("o2", &NewCategory::new("Mains", 0))
            .await
            .unwrap();
        sync.fetch_if_needed::<Category>("o2").await.unwrap();
        assert_eq!(gateway.fetch_count(), 1);
    }

    #[tokio::test]
    async fn test_fetch_failure_propagates_and_allows_retry() {
        let gateway = Arc::new(ScriptedGateway::default());
        gateway.fail_fetches.store(true, Ordering::SeqCst);
        let sync = MenuSync::new(gateway.clone(), Arc::new(Store::new()));
        let mut rx = sync.store().observe();

        let err = sync.fetch_if_needed::<Dish>("c1").await.unwrap_err();
        assert!(matches!(
            err,
            SyncError::Gateway(GatewayError::Server { status: 503, .. })
        ));
        assert_eq!(kinds(&drain(&mut rx)), vec!["fetching", "fetch-failed"]);

        gateway.fail_fetches.store(false, Ordering::SeqCst);
        sync.fetch_if_needed::<Dish>("c1").await.unwrap();
        assert_eq!(kinds(&drain(&mut rx)), vec!["fetching", "received"]);
    }

    #[tokio::test]
    async fn test_add_item_dispatches_stored_record() {
        let (sync, gateway) = setup();
        let mut rx = sync.store().observe();

        let category = sync
            .add_item::<Category>("o1", &NewCategory::new("Desserts", 0))
            .await
            .unwrap();

        assert_eq!(category.name, "Desserts");
        assert_eq!(
            gateway.value_at(&Category::entry_path("o1", &category.id)),
            json!({ "name": "Desserts", "order": 0 })
        );
        assert_eq!(
            drain(&mut rx),
            vec![Action::Category(CollectionAction::Added {
                scope: "o1".into(),
                item: category.clone(),
            })]
        );
    }

    #[tokio::test]
    async fn test_rename_item() {
        let (sync, _gateway) = setup();
        let category = sync
            .add_item::<Category>("o1", &NewCategory::new("Mains", 3))
            .await
            .unwrap();

        let renamed = sync
            .rename_item::<Category>("o1", &category.id, "Main courses")
            .await
            .unwrap();

        assert_eq!(renamed.name, "Main courses");
        assert_eq!(renamed.order, 3);
        let stored = sync.store().read(|s| {
            s.collection::<Category>("o1")
                .and_then(|c| c.get(&category.id).cloned())
        });
        assert_eq!(stored, Some(renamed));
    }

    #[tokio::test]
    async fn test_delete_reorders_remote_and_local() {
        let (sync, gateway) = setup();
        seed_categories(&gateway, "o1", &["A", "B", "C"]).await;
        sync.fetch_if_needed::<Category>("o1").await.unwrap();
        let mut rx = sync.store().observe();

        sync.delete_item::<Category>("o1", "b").await.unwrap();

        assert_eq!(
            gateway.value_at("categories/o1"),
            json!({
                "a": { "name": "A", "order": 0 },
                "c": { "name": "C", "order": 1 },
            })
        );
        assert_eq!(
            ranks(&sync, "o1"),
            vec![("a".to_string(), 0), ("c".to_string(), 1)]
        );
        match drain(&mut rx).as_slice() {
            [Action::Category(CollectionAction::Deleted {
                reordered,
                deleted_id,
                ..
            })] => {
                assert_eq!(deleted_id, "b");
                assert_eq!(reordered.len(), 1);
                assert_eq!(reordered[0].id, "c");
            }
            other => panic!("unexpected actions: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_delete_last_and_only_items() {
        let (sync, gateway) = setup();
        seed_categories(&gateway, "o1", &["A", "B"]).await;
        sync.fetch_if_needed::<Category>("o1").await.unwrap();

        sync.delete_item::<Category>("o1", "b").await.unwrap();
        assert_eq!(ranks(&sync, "o1"), vec![("a".to_string(), 0)]);

        sync.delete_item::<Category>("o1", "a").await.unwrap();
        assert!(ranks(&sync, "o1").is_empty());
        assert_eq!(gateway.value_at("categories/o1"), Value::Null);
    }

    #[tokio::test]
    async fn test_delete_unknown_id_fails_without_remote_write() {
        let (sync, gateway) = setup();
        seed_categories(&gateway, "o1", &["A"]).await;
        sync.fetch_if_needed::<Category>("o1").await.unwrap();
        let mut rx = sync.store().observe();

        let err = sync
            .delete_item::<Category>("o1", "missing")
            .await
            .unwrap_err();
        assert!(matches!(err, SyncError::NotFound { ref id, .. } if id == "missing"));
        assert!(drain(&mut rx).is_empty());
        assert!(gateway.value_at("categories/o1/a").is_object());
    }

    #[tokio::test]
    async fn test_add_dish_with_image() {
        let (sync, gateway) = setup();
        let mut rx = sync.store().observe();

        let dish = sync
            .add_dish_with_image(
                "c1",
                &NewDish::new("Pizza", 0).with_price(11.0),
                DishImage::new("photos/pizza.png", vec![0x89, 0x50]),
            )
            .await
            .unwrap();

        let upload_path = format!("dishes/{}/pizza.png", dish.id);
        assert_eq!(
            dish.image_url.as_deref(),
            Some(format!("memory://{}", upload_path).as_str())
        );
        assert_eq!(gateway.file(&upload_path), Some(vec![0x89, 0x50]));
        assert_eq!(
            gateway.value_at(&Dish::entry_path("c1", &dish.id))["imageUrl"],
            json!(format!("memory://{}", upload_path))
        );
        assert_eq!(
            drain(&mut rx),
            vec![Action::Dish(CollectionAction::Added {
                scope: "c1".into(),
                item: dish,
            })]
        );
    }

    #[tokio::test]
    async fn test_upload_failure_dispatches_nothing() {
        let (sync, gateway) = setup();
        gateway.fail_uploads_with("storage/unauthorized");
        let mut rx = sync.store().observe();

        let err = sync
            .add_dish_with_image(
                "c1",
                &NewDish::new("Pizza", 0),
                DishImage::new("pizza.png", vec![1]),
            )
            .await
            .unwrap_err();

        assert_eq!(err.upload_code(), Some("storage/unauthorized"));
        assert!(drain(&mut rx).is_empty());
        assert!(sync.store().read(|s| s.collection::<Dish>("c1").is_none()));

        // The entry itself was created before the upload and is left behind.
        let remote = gateway.value_at("dishes/c1");
        let entries = remote.as_object().unwrap();
        assert_eq!(entries.len(), 1);
        assert!(entries.values().all(|dish| dish.get("imageUrl").is_none()));
    }

    #[tokio::test]
    async fn test_create_account_records_owner() {
        let (sync, gateway) = setup();

        let account = sync
            .create_account("chef@example.com", "secret123")
            .await
            .unwrap();

        assert_eq!(
            gateway.value_at(&format!("owners/{}", account.uid)),
            json!({ "email": "chef@example.com" })
        );
        let session = sync.store().read(|s| s.session.clone()).unwrap();
        assert_eq!(session.uid, account.uid);
    }

    #[tokio::test]
    async fn test_sign_in_failure_leaves_state() {
        let (sync, _gateway) = setup();
        let err = sync
            .sign_in("nobody@example.com", "secret123")
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            SyncError::Gateway(GatewayError::Auth { ref code, .. }) if code == "EMAIL_NOT_FOUND"
        ));
        assert!(sync.store().read(|s| s.session.is_none()));
    }

    #[tokio::test]
    async fn test_sign_out_clears_cached_menu() {
        let (sync, gateway) = setup();
        sync.create_account("chef@example.com", "secret123")
            .await
            .unwrap();
        seed_categories(&gateway, "o1", &["A"]).await;
        sync.fetch_if_needed::<Category>("o1").await.unwrap();

        sync.sign_out().await.unwrap();

        assert!(sync.current_account().is_none());
        assert_eq!(sync.store().state(), Default::default());
    }

    #[tokio::test]
    async fn test_resume_session() {
        let (sync, gateway) = setup();
        assert!(sync.resume_session().is_none());

        gateway.restore_session(AccountHandle {
            uid: "o1".into(),
            email: "chef@example.com".into(),
            id_token: String::new(),
            refresh_token: String::new(),
            expires_at: None,
        });
        let session = sync.resume_session().unwrap();
        assert_eq!(session.uid, "o1");
        assert_eq!(sync.store().read(|s| s.session.clone()), Some(session));
    }

    #[test]
    fn test_normalize_absent_snapshot() {
        let items: BTreeMap<String, Category> =
            normalize_collection(&Snapshot::empty(Some("o1".into()))).unwrap();
        assert!(items.is_empty());
    }

    #[test]
    fn test_normalize_malformed_child() {
        let snapshot = Snapshot::new(
            Some("o1".into()),
            json!({ "a": { "name": "A", "order": 0 }, "b": { "order": "first" } }),
        );
        let result: Result<BTreeMap<String, Category>, _> = normalize_collection(&snapshot);
        assert!(matches!(result, Err(SnapshotError::Malformed { key, .. }) if key == "b"));
    }

    #[test]
    fn test_dish_image_content_type() {
        let image = DishImage::new("../uploads/Menu.JPG", vec![]);
        assert_eq!(image.file_name, "Menu.JPG");
        assert_eq!(image.content_type, "image/jpeg");

        let image = DishImage::new("notes.txt", vec![]).with_content_type("text/plain");
        assert_eq!(image.content_type, "text/plain");
        assert_eq!(
            DishImage::new("blob", vec![]).content_type,
            "application/octet-stream"
        );
    }
}
