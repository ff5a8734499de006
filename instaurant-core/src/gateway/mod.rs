//! Remote database, auth and storage service.
//!
//! The [`Gateway`] trait is the only way the sync layer talks to the
//! backend. Two implementations are provided:
//!
//! - [`FirebaseGateway`]: Firebase REST APIs (Identity Toolkit, Realtime
//!   Database, Cloud Storage)
//! - [`MemoryGateway`]: an in-process tree, optionally persisted to a JSON
//!   file, for tests and offline use

mod error;
mod firebase;
mod memory;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::snapshot::Snapshot;

pub use error::{GatewayError, GatewayResult};
pub use firebase::{FirebaseConfig, FirebaseGateway};
pub use memory::MemoryGateway;

/// An authenticated owner account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountHandle {
    pub uid: String,
    pub email: String,
    #[serde(default)]
    pub id_token: String,
    #[serde(default)]
    pub refresh_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl AccountHandle {
    /// Returns true if the id token has a known expiry in the past.
    pub fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|at| at <= Utc::now())
    }
}

/// A file stored by [`Gateway::upload_file`].
#[derive(Debug, Clone, PartialEq)]
pub struct UploadedFile {
    pub path: String,
    /// Retrievable download URL.
    pub url: String,
}

/// Field map written to a single entry.
pub type Fields = Map<String, Value>;

#[async_trait]
pub trait Gateway: Send + Sync {
    async fn create_account(&self, email: &str, password: &str) -> GatewayResult<AccountHandle>;

    async fn sign_in(&self, email: &str, password: &str) -> GatewayResult<AccountHandle>;

    async fn sign_out(&self) -> GatewayResult<()>;

    async fn reset_password(&self, email: &str) -> GatewayResult<()>;

    /// The currently signed-in account, if any.
    fn current_account(&self) -> Option<AccountHandle>;

    /// Reads every entry under `path`; the snapshot's children are ordered
    /// by their `order` value.
    async fn fetch_ordered_collection(&self, path: &str) -> GatewayResult<Snapshot>;

    /// Creates a child with a generated key under `path` and returns the
    /// stored entry.
    async fn create_entry(&self, path: &str, fields: Fields) -> GatewayResult<Snapshot>;

    /// Merges `fields` into the entry at `path` and returns the stored entry.
    async fn update_entry(&self, path: &str, fields: Fields) -> GatewayResult<Snapshot>;

    /// Applies every `relative/path -> value` pair under `path` in one atomic
    /// write. A `null` value removes the location.
    async fn patch_multiple(&self, path: &str, updates: Fields) -> GatewayResult<()>;

    async fn upload_file(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> GatewayResult<UploadedFile>;
}

/// Last segment of a slash-separated path.
pub(crate) fn last_segment(path: &str) -> Option<String> {
    path.trim_matches('/')
        .rsplit('/')
        .next()
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
