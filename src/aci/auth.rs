//! Azure credentials and bearer tokens
//!
//! Credentials come from the SDK auth file named by `AZURE_AUTH_LOCATION`, or
//! from the `AZURE_CLIENT_ID` / `AZURE_CLIENT_SECRET` / `AZURE_TENANT_ID` /
//! `AZURE_SUBSCRIPTION_ID` variables. Tokens are fetched with the OAuth2
//! client-credentials grant and cached until shortly before they expire.

use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::debug;

pub const DEFAULT_ACTIVE_DIRECTORY_ENDPOINT: &str = "https://login.microsoftonline.com";
pub const DEFAULT_RESOURCE_MANAGER_ENDPOINT: &str = "https://management.azure.com/";

pub const AUTH_LOCATION_ENV: &str = "AZURE_AUTH_LOCATION";

/// Tokens this close to expiry are refreshed before use
const REFRESH_MARGIN_SECS: i64 = 300;

/// Assumed lifetime when the token endpoint omits `expires_in`
const DEFAULT_TOKEN_LIFETIME_SECS: i64 = 3600;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("missing Azure credential: {0}")]
    MissingCredential(String),

    #[error("could not read auth file {path}: {source}")]
    AuthFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid auth file: {0}")]
    AuthFileFormat(#[from] serde_json::Error),

    #[error("token request failed: {0}")]
    Request(String),

    #[error("token endpoint returned {status}: {body}")]
    TokenRejected { status: u16, body: String },

    #[error("invalid token response: {0}")]
    InvalidTokenResponse(String),
}

/// Time source for token expiry
///
/// Tests swap in a fixed clock to exercise refresh without sleeping.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Service principal credentials in Azure SDK auth-file form
#[derive(Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AzureCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub subscription_id: String,
    pub tenant_id: String,

    #[serde(default = "default_active_directory_endpoint")]
    pub active_directory_endpoint_url: String,

    #[serde(default = "default_resource_manager_endpoint")]
    pub resource_manager_endpoint_url: String,
}

fn default_active_directory_endpoint() -> String {
    DEFAULT_ACTIVE_DIRECTORY_ENDPOINT.to_string()
}

fn default_resource_manager_endpoint() -> String {
    DEFAULT_RESOURCE_MANAGER_ENDPOINT.to_string()
}

impl fmt::Debug for AzureCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AzureCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("subscription_id", &self.subscription_id)
            .field("tenant_id", &self.tenant_id)
            .field(
                "active_directory_endpoint_url",
                &self.active_directory_endpoint_url,
            )
            .field(
                "resource_manager_endpoint_url",
                &self.resource_manager_endpoint_url,
            )
            .finish()
    }
}

impl AzureCredentials {
    /// Load credentials from the process environment
    pub fn from_env() -> Result<Self, AuthError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load credentials through a variable lookup
    ///
    /// An auth file named by `AZURE_AUTH_LOCATION` wins over the individual
    /// variables.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AuthError> {
        if let Some(path) = lookup(AUTH_LOCATION_ENV).filter(|p| !p.is_empty()) {
            return Self::from_auth_file(Path::new(&path));
        }

        let required = |key: &str| {
            lookup(key)
                .filter(|v| !v.is_empty())
                .ok_or_else(|| AuthError::MissingCredential(key.to_string()))
        };

        Ok(AzureCredentials {
            client_id: required("AZURE_CLIENT_ID")?,
            client_secret: required("AZURE_CLIENT_SECRET")?,
            tenant_id: required("AZURE_TENANT_ID")?,
            subscription_id: required("AZURE_SUBSCRIPTION_ID")?,
            active_directory_endpoint_url: default_active_directory_endpoint(),
            resource_manager_endpoint_url: default_resource_manager_endpoint(),
        })
    }

    /// Parse an SDK auth file (`az ad sp create-for-rbac --sdk-auth` output)
    pub fn from_auth_file(path: &Path) -> Result<Self, AuthError> {
        let text = std::fs::read_to_string(path).map_err(|source| AuthError::AuthFile {
            path: path.display().to_string(),
            source,
        })?;
        Ok(serde_json::from_str(&text)?)
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    /// The v1 endpoint sends this as a string, v2 as a number
    #[serde(default)]
    expires_in: Option<serde_json::Value>,
}

impl TokenResponse {
    fn lifetime_secs(&self) -> i64 {
        match &self.expires_in {
            Some(serde_json::Value::Number(n)) => n.as_i64(),
            Some(serde_json::Value::String(s)) => s.parse().ok(),
            _ => None,
        }
        .unwrap_or(DEFAULT_TOKEN_LIFETIME_SECS)
    }
}

#[derive(Debug, Clone)]
struct CachedToken {
    access_token: String,
    expires_at: DateTime<Utc>,
}

/// Fetches and caches resource manager bearer tokens
pub struct TokenProvider {
    http: reqwest::Client,
    credentials: AzureCredentials,
    clock: Arc<dyn Clock>,
    cached: Mutex<Option<CachedToken>>,
}

impl TokenProvider {
    pub fn new(http: reqwest::Client, credentials: AzureCredentials, clock: Arc<dyn Clock>) -> Self {
        Self {
            http,
            credentials,
            clock,
            cached: Mutex::new(None),
        }
    }

    pub fn credentials(&self) -> &AzureCredentials {
        &self.credentials
    }

    /// Current bearer token, fetching a new one when the cache is stale
    pub async fn token(&self) -> Result<String, AuthError> {
        let mut cached = self.cached.lock().await;
        let now = self.clock.now();

        if let Some(token) = cached.as_ref() {
            if token.expires_at - Duration::seconds(REFRESH_MARGIN_SECS) > now {
                return Ok(token.access_token.clone());
            }
            debug!(expires_at = %token.expires_at, "Bearer token near expiry, refreshing");
        }

        let response = self.request_token().await?;
        let fresh = CachedToken {
            expires_at: now + Duration::seconds(response.lifetime_secs()),
            access_token: response.access_token,
        };
        let access_token = fresh.access_token.clone();
        *cached = Some(fresh);
        Ok(access_token)
    }

    fn token_url(&self) -> String {
        format!(
            "{}/{}/oauth2/token",
            self.credentials
                .active_directory_endpoint_url
                .trim_end_matches('/'),
            self.credentials.tenant_id
        )
    }

    async fn request_token(&self) -> Result<TokenResponse, AuthError> {
        let url = self.token_url();
        debug!(url = %url, client_id = %self.credentials.client_id, "Requesting bearer token");

        let form = [
            ("grant_type", "client_credentials"),
            ("client_id", self.credentials.client_id.as_str()),
            ("client_secret", self.credentials.client_secret.as_str()),
            (
                "resource",
                self.credentials.resource_manager_endpoint_url.as_str(),
            ),
        ];

        let response = self
            .http
            .post(&url)
            .form(&form)
            .send()
            .await
            .map_err(|e| AuthError::Request(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AuthError::Request(e.to_string()))?;
        if !status.is_success() {
            return Err(AuthError::TokenRejected {
                status: status.as_u16(),
                body,
            });
        }

        serde_json::from_str(&body).map_err(|e| AuthError::InvalidTokenResponse(e.to_string()))
    }
}

/// Fixed clock for token expiry tests
#[cfg(test)]
pub struct MockClock {
    now: std::sync::Mutex<DateTime<Utc>>,
}

#[cfg(test)]
#[allow(clippy::expect_used)]
impl MockClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: std::sync::Mutex::new(now),
        }
    }

    pub fn advance(&self, by: Duration) {
        *self.now.lock().expect("MockClock lock poisoned") += by;
    }
}

#[cfg(test)]
#[allow(clippy::expect_used)]
impl Clock for MockClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().expect("MockClock lock poisoned")
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[path = "auth_test.rs"]
mod tests;
