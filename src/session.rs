//! Persisted sign-in state.
//!
//! The account handle returned by the gateway is written to
//! `session.yaml` in the data directory so later invocations can resume
//! without asking for the password again.

use chrono::{DateTime, Utc};
use instaurant_core::AccountHandle;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::config::Backend;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionFile {
    /// Backend the account belongs to
    pub backend: Backend,
    pub account: AccountHandle,
    pub saved_at: DateTime<Utc>,
}

impl SessionFile {
    pub fn new(backend: Backend, account: AccountHandle) -> Self {
        Self {
            backend,
            account,
            saved_at: Utc::now(),
        }
    }

    /// Loads the session at `path`, or `None` if nobody is signed in.
    pub fn load(path: &Path) -> Result<Option<Self>, SessionError> {
        if !path.exists() {
            return Ok(None);
        }

        let contents = std::fs::read_to_string(path)
            .map_err(|e| SessionError::Read(path.to_path_buf(), e))?;
        let session = serde_yaml::from_str(&contents)
            .map_err(|e| SessionError::Parse(path.to_path_buf(), e))?;
        Ok(Some(session))
    }

    pub fn save(&self, path: &Path) -> Result<(), SessionError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| SessionError::Write(parent.to_path_buf(), e))?;
        }

        let contents = serde_yaml::to_string(self)
            .map_err(|e| SessionError::Parse(path.to_path_buf(), e))?;
        std::fs::write(path, contents).map_err(|e| SessionError::Write(path.to_path_buf(), e))
    }

    /// Removes the session file. Returns true if one existed.
    pub fn clear(path: &Path) -> Result<bool, SessionError> {
        match std::fs::remove_file(path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(SessionError::Write(path.to_path_buf(), e)),
        }
    }
}

#[derive(Debug)]
pub enum SessionError {
    Read(PathBuf, std::io::Error),
    Write(PathBuf, std::io::Error),
    Parse(PathBuf, serde_yaml::Error),
}

impl std::fmt::Display for SessionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionError::Read(path, e) => {
                write!(f, "Failed to read session file '{}': {}", path.display(), e)
            }
            SessionError::Write(path, e) => {
                write!(f, "Failed to write session file '{}': {}", path.display(), e)
            }
            SessionError::Parse(path, e) => {
                write!(f, "Invalid session file '{}': {}", path.display(), e)
            }
        }
    }
}

impl std::error::Error for SessionError {}
