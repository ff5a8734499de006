//! In-process gateway backed by a JSON tree.
//!
//! Without a directory everything lives in memory. With [`MemoryGateway::open`]
//! the tree and accounts are written to `gateway.json` after every write and
//! uploaded files are stored under `storage/`.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use super::{last_segment, AccountHandle, Fields, Gateway, GatewayError, GatewayResult, UploadedFile};
use crate::snapshot::Snapshot;

const STATE_FILE: &str = "gateway.json";
const STORAGE_DIR: &str = "storage";
const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredAccount {
    uid: String,
    password_hash: String,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct Persisted {
    #[serde(default)]
    tree: Value,
    #[serde(default)]
    accounts: BTreeMap<String, StoredAccount>,
}

#[derive(Debug, Default)]
struct Inner {
    data: Persisted,
    files: BTreeMap<String, Vec<u8>>,
    current: Option<AccountHandle>,
    upload_failure: Option<String>,
}

/// Gateway that keeps the whole remote tree in process.
#[derive(Debug, Default)]
pub struct MemoryGateway {
    inner: Mutex<Inner>,
    dir: Option<PathBuf>,
    fetch_calls: AtomicUsize,
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens a gateway persisted under `dir`, loading any existing state.
    pub fn open(dir: impl Into<PathBuf>) -> GatewayResult<Self> {
        let dir = dir.into();
        let path = dir.join(STATE_FILE);

        let data = match fs::read(&path) {
            Ok(bytes) => serde_json::from_slice(&bytes)
                .map_err(|e| GatewayError::Decode(format!("{}: {}", path.display(), e)))?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => Persisted::default(),
            Err(e) => return Err(GatewayError::Io(path, e)),
        };

        Ok(Self {
            inner: Mutex::new(Inner {
                data,
                ..Inner::default()
            }),
            dir: Some(dir),
            fetch_calls: AtomicUsize::new(0),
        })
    }

    /// Marks `account` as signed in without checking credentials.
    pub fn restore_session(&self, account: AccountHandle) {
        self.lock().current = Some(account);
    }

    /// Makes every following upload fail with `code`.
    pub fn fail_uploads_with(&self, code: impl Into<String>) {
        self.lock().upload_failure = Some(code.into());
    }

    /// Number of collection fetches served so far.
    pub fn fetch_count(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }

    /// Value currently stored at `path`.
    pub fn value_at(&self, path: &str) -> Value {
        get_at(&self.lock().data.tree, &segments(path))
            .cloned()
            .unwrap_or(Value::Null)
    }

    /// Bytes of a previously uploaded file.
    pub fn file(&self, path: &str) -> Option<Vec<u8>> {
        self.lock().files.get(path).cloned()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn persist(&self, inner: &Inner) -> GatewayResult<()> {
        let Some(dir) = &self.dir else {
            return Ok(());
        };
        fs::create_dir_all(dir).map_err(|e| GatewayError::Io(dir.clone(), e))?;

        let path = dir.join(STATE_FILE);
        let bytes = serde_json::to_vec_pretty(&inner.data)
            .map_err(|e| GatewayError::Decode(e.to_string()))?;
        fs::write(&path, bytes).map_err(|e| GatewayError::Io(path, e))
    }

    fn store_file(&self, path: &str, bytes: &[u8]) -> GatewayResult<String> {
        let Some(dir) = &self.dir else {
            return Ok(format!("memory://{}", path));
        };

        let target = dir.join(STORAGE_DIR).join(relative_path(path));
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(|e| GatewayError::Io(parent.to_path_buf(), e))?;
        }
        fs::write(&target, bytes).map_err(|e| GatewayError::Io(target.clone(), e))?;
        Ok(format!("file://{}", target.display()))
    }

    fn account_handle(email: &str, uid: &str) -> AccountHandle {
        AccountHandle {
            uid: uid.to_string(),
            email: email.to_string(),
            id_token: format!("local-{}", uid),
            refresh_token: String::new(),
            expires_at: None,
        }
    }
}

#[async_trait]
impl Gateway for MemoryGateway {
    async fn create_account(&self, email: &str, password: &str) -> GatewayResult<AccountHandle> {
        if password.len() < MIN_PASSWORD_LEN {
            return Err(auth_error(
                "WEAK_PASSWORD",
                "Password should be at least 6 characters",
            ));
        }

        let mut inner = self.lock();
        if inner.data.accounts.contains_key(email) {
            return Err(auth_error(
                "EMAIL_EXISTS",
                "The email address is already in use by another account.",
            ));
        }

        let uid = Uuid::new_v4().simple().to_string();
        inner.data.accounts.insert(
            email.to_string(),
            StoredAccount {
                uid: uid.clone(),
                password_hash: hash_password(password),
            },
        );
        self.persist(&inner)?;

        let account = Self::account_handle(email, &uid);
        inner.current = Some(account.clone());
        Ok(account)
    }

    async fn sign_in(&self, email: &str, password: &str) -> GatewayResult<AccountHandle> {
        let mut inner = self.lock();
        let stored = inner
            .data
            .accounts
            .get(email)
            .ok_or_else(|| auth_error("EMAIL_NOT_FOUND", "There is no user record for this email."))?;

        if stored.password_hash != hash_password(password) {
            return Err(auth_error("INVALID_PASSWORD", "The password is invalid."));
        }

        let account = Self::account_handle(email, &stored.uid);
        inner.current = Some(account.clone());
        Ok(account)
    }

    async fn sign_out(&self) -> GatewayResult<()> {
        self.lock().current = None;
        Ok(())
    }

    async fn reset_password(&self, email: &str) -> GatewayResult<()> {
        if self.lock().data.accounts.contains_key(email) {
            Ok(())
        } else {
            Err(auth_error(
                "EMAIL_NOT_FOUND",
                "There is no user record for this email.",
            ))
        }
    }

    fn current_account(&self) -> Option<AccountHandle> {
        self.lock().current.clone()
    }

    async fn fetch_ordered_collection(&self, path: &str) -> GatewayResult<Snapshot> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        let value = self.value_at(path);
        Ok(Snapshot::new(last_segment(path), value))
    }

    async fn create_entry(&self, path: &str, fields: Fields) -> GatewayResult<Snapshot> {
        let key = Uuid::new_v4().simple().to_string();
        let mut entry_path = segments(path);
        entry_path.push(&key);

        let mut inner = self.lock();
        let value = Value::Object(fields);
        set_at(&mut inner.data.tree, &entry_path, value.clone());
        self.persist(&inner)?;

        Ok(Snapshot::new(Some(key), value))
    }

    async fn update_entry(&self, path: &str, fields: Fields) -> GatewayResult<Snapshot> {
        let entry_path = segments(path);

        let mut inner = self.lock();
        for (field, value) in fields {
            let mut field_path = entry_path.clone();
            field_path.push(&field);
            set_at(&mut inner.data.tree, &field_path, value);
        }
        self.persist(&inner)?;

        let value = get_at(&inner.data.tree, &entry_path)
            .cloned()
            .unwrap_or(Value::Null);
        Ok(Snapshot::new(last_segment(path), value))
    }

    async fn patch_multiple(&self, path: &str, updates: Fields) -> GatewayResult<()> {
        let base = segments(path);

        let mut inner = self.lock();
        for (relative, value) in updates {
            let mut target = base.clone();
            target.extend(segments(&relative));
            set_at(&mut inner.data.tree, &target, value);
        }
        self.persist(&inner)
    }

    async fn upload_file(
        &self,
        path: &str,
        bytes: Vec<u8>,
        _content_type: &str,
    ) -> GatewayResult<UploadedFile> {
        let mut inner = self.lock();
        if let Some(code) = inner.upload_failure.clone() {
            return Err(GatewayError::Upload { code });
        }

        let url = self.store_file(path, &bytes)?;
        inner.files.insert(path.to_string(), bytes);

        Ok(UploadedFile {
            path: path.to_string(),
            url,
        })
    }
}

fn auth_error(code: &str, message: &str) -> GatewayError {
    GatewayError::Auth {
        code: code.to_string(),
        message: message.to_string(),
    }
}

fn hash_password(password: &str) -> String {
    let digest = Sha256::digest(password.as_bytes());
    digest.iter().map(|b| format!("{:02x}", b)).collect()
}

fn segments(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

fn relative_path(path: &str) -> PathBuf {
    segments(path)
        .into_iter()
        .filter(|s| *s != "..")
        .collect::<PathBuf>()
}

fn get_at<'a>(root: &'a Value, path: &[&str]) -> Option<&'a Value> {
    path.iter().try_fold(root, |node, segment| node.get(*segment))
}

/// Writes `value` at `path`, creating parents as needed. A `null` value
/// removes the location and prunes parents left empty.
fn set_at(root: &mut Value, path: &[&str], value: Value) {
    let Some((first, rest)) = path.split_first() else {
        *root = value;
        return;
    };

    if !root.is_object() {
        if value.is_null() {
            return;
        }
        *root = Value::Object(Map::new());
    }
    let Some(map) = root.as_object_mut() else {
        return;
    };

    if rest.is_empty() {
        if value.is_null() {
            map.remove(*first);
        } else {
            map.insert(first.to_string(), value);
        }
        return;
    }

    let child = map.entry(first.to_string()).or_insert(Value::Null);
    set_at(child, rest, value);
    let prune = child.is_null() || child.as_object().is_some_and(Map::is_empty);
    if prune {
        map.remove(*first);
    }
}
