//! Sync error types.

use thiserror::Error;

use crate::gateway::GatewayError;
use crate::snapshot::SnapshotError;

/// Errors that can occur during sync operations.
#[derive(Error, Debug)]
pub enum SyncError {
    /// The remote service rejected or failed the request.
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    /// A snapshot could not be normalized into a record.
    #[error("Invalid snapshot: {0}")]
    Snapshot(#[from] SnapshotError),

    /// Record fields could not be encoded for the remote service.
    #[error("Failed to encode fields: {0}")]
    Encode(String),

    /// The id is not present in the local collection for the scope.
    #[error("No {collection} entry '{id}' in scope '{scope}'")]
    NotFound {
        collection: &'static str,
        scope: String,
        id: String,
    },
}

impl SyncError {
    /// The storage error code, if an upload failed.
    pub fn upload_code(&self) -> Option<&str> {
        match self {
            SyncError::Gateway(e) => e.upload_code(),
            _ => None,
        }
    }
}

pub type SyncResult<T> = Result<T, SyncError>;
