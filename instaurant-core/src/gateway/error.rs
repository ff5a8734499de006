//! Gateway error types.

use std::path::PathBuf;

use thiserror::Error;

/// Errors returned by a [`Gateway`](super::Gateway) operation.
#[derive(Error, Debug)]
pub enum GatewayError {
    /// The request never produced a response (DNS, connect, TLS, timeout).
    #[error("HTTP error: {0}")]
    Http(String),

    /// The auth service rejected the request, e.g. `EMAIL_EXISTS`.
    #[error("Authentication failed: {code}: {message}")]
    Auth { code: String, message: String },

    /// The database answered with a non-success status.
    #[error("Server returned status {status}: {message}")]
    Server { status: u16, message: String },

    /// A file upload failed; `code` is a `storage/...` error code.
    #[error("Upload failed: {code}")]
    Upload { code: String },

    #[error("Not signed in")]
    NotSignedIn,

    /// A response body could not be decoded.
    #[error("Failed to decode response: {0}")]
    Decode(String),

    #[error("I/O error for {0}: {1}")]
    Io(PathBuf, #[source] std::io::Error),
}

impl GatewayError {
    /// The storage error code, if this is an upload failure.
    pub fn upload_code(&self) -> Option<&str> {
        match self {
            GatewayError::Upload { code } => Some(code),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for GatewayError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            GatewayError::Decode(e.to_string())
        } else {
            GatewayError::Http(e.to_string())
        }
    }
}

pub type GatewayResult<T> = Result<T, GatewayError>;
