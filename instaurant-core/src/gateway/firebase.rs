//! Gateway speaking the Firebase REST APIs.
//!
//! - auth: Identity Toolkit `accounts:*` endpoints, keyed by the web API key
//! - database: Realtime Database `{path}.json` resources, authorized with the
//!   signed-in account's id token
//! - storage: Cloud Storage for Firebase media uploads

use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::{Duration, Utc};
use reqwest::{Response, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::{last_segment, AccountHandle, Fields, Gateway, GatewayError, GatewayResult, UploadedFile};
use crate::snapshot::Snapshot;

const DEFAULT_IDENTITY_URL: &str = "https://identitytoolkit.googleapis.com";
const DEFAULT_STORAGE_URL: &str = "https://firebasestorage.googleapis.com";

/// Connection settings for a Firebase project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FirebaseConfig {
    /// Web API key
    pub api_key: String,
    /// Realtime Database URL, e.g. `https://project-default-rtdb.firebaseio.com`
    pub database_url: String,
    /// Storage bucket, e.g. `project.appspot.com`
    pub storage_bucket: String,
    #[serde(default = "default_identity_url")]
    pub identity_url: String,
    #[serde(default = "default_storage_url")]
    pub storage_url: String,
}

fn default_identity_url() -> String {
    DEFAULT_IDENTITY_URL.to_string()
}

fn default_storage_url() -> String {
    DEFAULT_STORAGE_URL.to_string()
}

impl FirebaseConfig {
    pub fn new(
        api_key: impl Into<String>,
        database_url: impl Into<String>,
        storage_bucket: impl Into<String>,
    ) -> Self {
        Self {
            api_key: api_key.into(),
            database_url: database_url.into(),
            storage_bucket: storage_bucket.into(),
            identity_url: default_identity_url(),
            storage_url: default_storage_url(),
        }
    }
}

/// Successful Identity Toolkit sign-up/sign-in response.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AuthResponse {
    local_id: String,
    #[serde(default)]
    email: String,
    id_token: String,
    #[serde(default)]
    refresh_token: String,
    #[serde(default)]
    expires_in: Option<String>,
}

impl AuthResponse {
    fn into_account(self) -> AccountHandle {
        let expires_at = self
            .expires_in
            .as_deref()
            .and_then(|s| s.parse::<i64>().ok())
            .map(|secs| Utc::now() + Duration::seconds(secs));

        AccountHandle {
            uid: self.local_id,
            email: self.email,
            id_token: self.id_token,
            refresh_token: self.refresh_token,
            expires_at,
        }
    }
}

/// Response from a Realtime Database `POST` (push).
#[derive(Debug, Deserialize)]
struct PushResponse {
    name: String,
}

/// Metadata returned by a Cloud Storage upload.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UploadResponse {
    #[serde(default)]
    download_tokens: Option<String>,
}

/// Gateway backed by a Firebase project.
#[derive(Debug)]
pub struct FirebaseGateway {
    config: FirebaseConfig,
    client: reqwest::Client,
    session: RwLock<Option<AccountHandle>>,
}

impl FirebaseGateway {
    pub fn new(config: FirebaseConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
            session: RwLock::new(None),
        }
    }

    pub fn config(&self) -> &FirebaseConfig {
        &self.config
    }

    /// Uses a previously obtained account for database and storage requests.
    pub fn restore_session(&self, account: AccountHandle) {
        *self.write_session() = Some(account);
    }

    fn read_session(&self) -> RwLockReadGuard<'_, Option<AccountHandle>> {
        self.session.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write_session(&self) -> RwLockWriteGuard<'_, Option<AccountHandle>> {
        self.session.write().unwrap_or_else(|e| e.into_inner())
    }

    fn id_token(&self) -> GatewayResult<String> {
        self.read_session()
            .as_ref()
            .map(|account| account.id_token.clone())
            .ok_or(GatewayError::NotSignedIn)
    }

    /// Builds an Identity Toolkit URL for an `accounts:{method}` call.
    fn identity_endpoint(&self, method: &str) -> String {
        format!(
            "{}/v1/accounts:{}?key={}",
            self.config.identity_url.trim_end_matches('/'),
            method,
            self.config.api_key
        )
    }

    /// Builds a Realtime Database REST URL for a path.
    fn database_endpoint(&self, path: &str, token: &str) -> String {
        format!(
            "{}/{}.json?auth={}",
            self.config.database_url.trim_end_matches('/'),
            path.trim_matches('/'),
            token
        )
    }

    fn upload_endpoint(&self, path: &str) -> String {
        format!(
            "{}/v0/b/{}/o?uploadType=media&name={}",
            self.config.storage_url.trim_end_matches('/'),
            self.config.storage_bucket,
            urlencoding::encode(path)
        )
    }

    fn download_url(&self, path: &str, token: Option<&str>) -> String {
        let mut url = format!(
            "{}/v0/b/{}/o/{}?alt=media",
            self.config.storage_url.trim_end_matches('/'),
            self.config.storage_bucket,
            urlencoding::encode(path)
        );
        if let Some(token) = token {
            url.push_str("&token=");
            url.push_str(token);
        }
        url
    }

    async fn auth_request(&self, method: &str, body: Value) -> GatewayResult<Response> {
        let response = self
            .client
            .post(self.identity_endpoint(method))
            .json(&body)
            .send()
            .await?;

        if response.status().is_success() {
            Ok(response)
        } else {
            let text = response.text().await.unwrap_or_default();
            Err(parse_auth_error(&text))
        }
    }

    async fn authenticate(
        &self,
        method: &str,
        email: &str,
        password: &str,
    ) -> GatewayResult<AccountHandle> {
        let response = self
            .auth_request(
                method,
                json!({
                    "email": email,
                    "password": password,
                    "returnSecureToken": true,
                }),
            )
            .await?;

        let account = response.json::<AuthResponse>().await?.into_account();
        *self.write_session() = Some(account.clone());
        Ok(account)
    }

    async fn read_value(&self, path: &str) -> GatewayResult<Value> {
        let url = self.database_endpoint(path, &self.id_token()?);
        let response = self.client.get(url).send().await?;
        database_body(response).await
    }
}

#[async_trait]
impl Gateway for FirebaseGateway {
    async fn create_account(&self, email: &str, password: &str) -> GatewayResult<AccountHandle> {
        self.authenticate("signUp", email, password).await
    }

    async fn sign_in(&self, email: &str, password: &str) -> GatewayResult<AccountHandle> {
        self.authenticate("signInWithPassword", email, password).await
    }

    async fn sign_out(&self) -> GatewayResult<()> {
        *self.write_session() = None;
        Ok(())
    }

    async fn reset_password(&self, email: &str) -> GatewayResult<()> {
        self.auth_request(
            "sendOobCode",
            json!({ "requestType": "PASSWORD_RESET", "email": email }),
        )
        .await?;
        Ok(())
    }

    fn current_account(&self) -> Option<AccountHandle> {
        self.read_session().clone()
    }

    async fn fetch_ordered_collection(&self, path: &str) -> GatewayResult<Snapshot> {
        let value = self.read_value(path).await?;
        Ok(Snapshot::new(last_segment(path), value))
    }

    async fn create_entry(&self, path: &str, fields: Fields) -> GatewayResult<Snapshot> {
        let url = self.database_endpoint(path, &self.id_token()?);
        let response = self.client.post(url).json(&fields).send().await?;
        let pushed: PushResponse = serde_json::from_value(database_body(response).await?)
            .map_err(|e| GatewayError::Decode(e.to_string()))?;

        let entry_path = format!("{}/{}", path.trim_end_matches('/'), pushed.name);
        let value = self.read_value(&entry_path).await?;
        Ok(Snapshot::new(Some(pushed.name), value))
    }

    async fn update_entry(&self, path: &str, fields: Fields) -> GatewayResult<Snapshot> {
        let url = self.database_endpoint(path, &self.id_token()?);
        let response = self.client.patch(url).json(&fields).send().await?;
        database_body(response).await?;

        let value = self.read_value(path).await?;
        Ok(Snapshot::new(last_segment(path), value))
    }

    async fn patch_multiple(&self, path: &str, updates: Fields) -> GatewayResult<()> {
        let url = self.database_endpoint(path, &self.id_token()?);
        let response = self.client.patch(url).json(&updates).send().await?;
        database_body(response).await?;
        Ok(())
    }

    async fn upload_file(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> GatewayResult<UploadedFile> {
        let token = self.id_token()?;
        let response = self
            .client
            .post(self.upload_endpoint(path))
            .header("Authorization", format!("Firebase {}", token))
            .header("Content-Type", content_type)
            .body(bytes)
            .send()
            .await
            .map_err(|_| GatewayError::Upload {
                code: "storage/retry-limit-exceeded".to_string(),
            })?;

        if !response.status().is_success() {
            return Err(GatewayError::Upload {
                code: storage_error_code(response.status()).to_string(),
            });
        }

        let metadata: UploadResponse = response.json().await.map_err(|_| GatewayError::Upload {
            code: "storage/unknown".to_string(),
        })?;
        let download_token = metadata
            .download_tokens
            .as_deref()
            .and_then(|tokens| tokens.split(',').next());

        Ok(UploadedFile {
            path: path.to_string(),
            url: self.download_url(path, download_token),
        })
    }
}

/// Reads a database response body, mapping error statuses.
async fn database_body(response: Response) -> GatewayResult<Value> {
    let status = response.status();
    if status.is_success() {
        return Ok(response.json::<Value>().await?);
    }

    let text = response.text().await.unwrap_or_default();
    Err(GatewayError::Server {
        status: status.as_u16(),
        message: error_message(&text),
    })
}

/// Extracts the message from `{"error": "..."}` or `{"error": {"message": "..."}}`.
fn error_message(body: &str) -> String {
    let Ok(value) = serde_json::from_str::<Value>(body) else {
        return body.trim().to_string();
    };
    match &value["error"] {
        Value::String(message) => message.clone(),
        Value::Object(error) => error
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        _ => body.trim().to_string(),
    }
}

/// Splits an Identity Toolkit error such as
/// `WEAK_PASSWORD : Password should be at least 6 characters`.
fn parse_auth_error(body: &str) -> GatewayError {
    let message = error_message(body);
    let (code, detail) = match message.split_once(" : ") {
        Some((code, detail)) => (code.trim().to_string(), detail.trim().to_string()),
        None => (message.clone(), String::new()),
    };

    GatewayError::Auth {
        code: if code.is_empty() {
            "UNKNOWN".to_string()
        } else {
            code
        },
        message: detail,
    }
}

fn storage_error_code(status: StatusCode) -> &'static str {
    match status {
        StatusCode::UNAUTHORIZED => "storage/unauthenticated",
        StatusCode::FORBIDDEN => "storage/unauthorized",
        StatusCode::NOT_FOUND => "storage/object-not-found",
        StatusCode::TOO_MANY_REQUESTS => "storage/quota-exceeded",
        _ => "storage/unknown",
    }
}
