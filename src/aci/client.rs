//! HTTP client for the ACI management API
//!
//! `AciApi` is the seam the command layer talks to. `AciClient` implements it
//! over ARM REST calls; tests use `MockAciApi`, which keeps groups in memory.

use super::auth::{AuthError, AzureCredentials, Clock, SystemClock, TokenProvider};
use super::types::{ContainerGroup, ContainerGroupListResult, Logs};
use async_trait::async_trait;
use reqwest::{Method, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

/// ACI REST API version used for every call
pub const API_VERSION: &str = "2018-04-01";

const PROVIDER: &str = "Microsoft.ContainerInstance";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Error)]
pub enum AciError {
    #[error("authentication failed: {0}")]
    Auth(#[from] AuthError),

    #[error("invalid management endpoint '{0}'")]
    InvalidEndpoint(String),

    #[error("ACI HTTP error: {0}")]
    Http(String),

    #[error("ACI API returned {status} ({code}): {message}")]
    Api {
        status: u16,
        code: String,
        message: String,
    },

    #[error("failed to decode ACI response: {0}")]
    Decode(String),
}

impl AciError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, AciError::Api { status: 404, .. })
    }
}

/// ARM error envelope: `{"error": {"code": "...", "message": "..."}}`
#[derive(Debug, Deserialize)]
struct ArmErrorResponse {
    error: ArmErrorBody,
}

#[derive(Debug, Deserialize)]
struct ArmErrorBody {
    #[serde(default)]
    code: String,
    #[serde(default)]
    message: String,
}

/// Container group operations used by the CLI
#[async_trait]
pub trait AciApi: Send + Sync {
    async fn create_container_group(
        &self,
        resource_group: &str,
        name: &str,
        container_group: &ContainerGroup,
    ) -> Result<ContainerGroup, AciError>;

    async fn delete_container_group(&self, resource_group: &str, name: &str)
        -> Result<(), AciError>;

    /// All groups in the resource group, across every result page
    async fn list_container_groups(
        &self,
        resource_group: &str,
    ) -> Result<ContainerGroupListResult, AciError>;

    async fn get_container_group(
        &self,
        resource_group: &str,
        name: &str,
    ) -> Result<ContainerGroup, AciError>;

    async fn get_container_logs(
        &self,
        resource_group: &str,
        container_group: &str,
        container: &str,
        tail: Option<u32>,
    ) -> Result<Logs, AciError>;
}

/// ARM-backed ACI client
pub struct AciClient {
    http: reqwest::Client,
    base_url: Url,
    subscription_id: String,
    tokens: TokenProvider,
}

impl AciClient {
    /// Build a client for the credentials' subscription
    ///
    /// `management_endpoint` overrides the resource manager URL from the
    /// credentials (sovereign clouds, tests).
    pub fn new(
        credentials: AzureCredentials,
        management_endpoint: Option<&str>,
    ) -> Result<Self, AciError> {
        Self::with_clock(credentials, management_endpoint, Arc::new(SystemClock))
    }

    pub fn with_clock(
        credentials: AzureCredentials,
        management_endpoint: Option<&str>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, AciError> {
        let endpoint = management_endpoint
            .unwrap_or(&credentials.resource_manager_endpoint_url)
            .to_string();
        let base_url =
            Url::parse(&endpoint).map_err(|_| AciError::InvalidEndpoint(endpoint.clone()))?;
        if base_url.cannot_be_a_base() {
            return Err(AciError::InvalidEndpoint(endpoint));
        }

        let http = match reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build() {
            Ok(c) => c,
            Err(e) => {
                warn!(error = %e, "Failed to build ACI HTTP client, using default");
                reqwest::Client::new()
            }
        };

        Ok(Self {
            subscription_id: credentials.subscription_id.clone(),
            tokens: TokenProvider::new(http.clone(), credentials, clock),
            http,
            base_url,
        })
    }

    /// URL under `/subscriptions/{id}/resourceGroups/{rg}/providers/Microsoft.ContainerInstance/containerGroups`
    fn groups_url(&self, resource_group: &str, trailing: &[&str]) -> Result<Url, AciError> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| AciError::InvalidEndpoint(self.base_url.to_string()))?;
            segments.pop_if_empty().extend([
                "subscriptions",
                self.subscription_id.as_str(),
                "resourceGroups",
                resource_group,
                "providers",
                PROVIDER,
                "containerGroups",
            ]);
            segments.extend(trailing);
        }
        url.query_pairs_mut().append_pair("api-version", API_VERSION);
        Ok(url)
    }

    async fn send(
        &self,
        method: Method,
        url: Url,
        body: Option<&ContainerGroup>,
    ) -> Result<(StatusCode, String), AciError> {
        let token = self.tokens.token().await?;
        let request_id = uuid::Uuid::new_v4().to_string();
        debug!(method = %method, url = %url, request_id = %request_id, "ACI request");

        let mut request = self
            .http
            .request(method, url)
            .bearer_auth(token)
            .header("x-ms-client-request-id", &request_id);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| AciError::Http(e.to_string()))?;
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| AciError::Http(e.to_string()))?;

        if !status.is_success() {
            return Err(api_error(status, &text));
        }
        Ok((status, text))
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        method: Method,
        url: Url,
        body: Option<&ContainerGroup>,
    ) -> Result<T, AciError> {
        let (_, text) = self.send(method, url, body).await?;
        serde_json::from_str(&text).map_err(|e| AciError::Decode(e.to_string()))
    }
}

/// Turn a failed response into an `AciError::Api`, using the ARM error body when present
fn api_error(status: StatusCode, body: &str) -> AciError {
    let (code, message) = match serde_json::from_str::<ArmErrorResponse>(body) {
        Ok(parsed) => (parsed.error.code, parsed.error.message),
        Err(_) => (
            status.canonical_reason().unwrap_or("Unknown").to_string(),
            body.to_string(),
        ),
    };
    AciError::Api {
        status: status.as_u16(),
        code,
        message,
    }
}

#[async_trait]
impl AciApi for AciClient {
    async fn create_container_group(
        &self,
        resource_group: &str,
        name: &str,
        container_group: &ContainerGroup,
    ) -> Result<ContainerGroup, AciError> {
        let url = self.groups_url(resource_group, &[name])?;
        self.send_json(Method::PUT, url, Some(container_group))
            .await
    }

    async fn delete_container_group(
        &self,
        resource_group: &str,
        name: &str,
    ) -> Result<(), AciError> {
        let url = self.groups_url(resource_group, &[name])?;
        let (status, _) = self.send(Method::DELETE, url, None).await?;
        debug!(group = name, status = status.as_u16(), "Container group delete accepted");
        Ok(())
    }

    async fn list_container_groups(
        &self,
        resource_group: &str,
    ) -> Result<ContainerGroupListResult, AciError> {
        let mut url = self.groups_url(resource_group, &[])?;
        let mut groups = Vec::new();

        loop {
            let page: ContainerGroupListResult = self.send_json(Method::GET, url, None).await?;
            groups.extend(page.value);

            match page.next_link.filter(|link| !link.is_empty()) {
                Some(next) => {
                    url = Url::parse(&next).map_err(|_| AciError::Decode(format!(
                        "invalid nextLink '{}'",
                        next
                    )))?;
                }
                None => break,
            }
        }

        Ok(ContainerGroupListResult {
            value: groups,
            next_link: None,
        })
    }

    async fn get_container_group(
        &self,
        resource_group: &str,
        name: &str,
    ) -> Result<ContainerGroup, AciError> {
        let url = self.groups_url(resource_group, &[name])?;
        self.send_json(Method::GET, url, None).await
    }

    async fn get_container_logs(
        &self,
        resource_group: &str,
        container_group: &str,
        container: &str,
        tail: Option<u32>,
    ) -> Result<Logs, AciError> {
        let mut url =
            self.groups_url(resource_group, &[container_group, "containers", container, "logs"])?;
        if let Some(tail) = tail {
            url.query_pairs_mut().append_pair("tail", &tail.to_string());
        }
        self.send_json(Method::GET, url, None).await
    }
}

/// In-memory ACI for command tests
#[cfg(test)]
#[derive(Default)]
pub struct MockAciApi {
    pub groups: std::sync::Mutex<std::collections::BTreeMap<String, ContainerGroup>>,
    /// Fail the create call with this 0-based index
    pub fail_create_at: Option<usize>,
    /// Fail this many log requests before succeeding
    pub log_failures: std::sync::atomic::AtomicUsize,
    pub log_content: String,
    pub creates: std::sync::atomic::AtomicUsize,
    pub log_calls: std::sync::atomic::AtomicUsize,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
impl MockAciApi {
    pub fn with_groups(names: &[&str]) -> Self {
        let mock = Self::default();
        {
            let mut groups = mock.groups.lock().unwrap();
            for name in names {
                groups.insert(
                    name.to_string(),
                    ContainerGroup {
                        name: name.to_string(),
                        ..Default::default()
                    },
                );
            }
        }
        mock
    }

    pub fn group_names(&self) -> Vec<String> {
        self.groups.lock().unwrap().keys().cloned().collect()
    }

    fn not_found(name: &str) -> AciError {
        AciError::Api {
            status: 404,
            code: "ResourceNotFound".to_string(),
            message: format!("container group '{}' not found", name),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
#[async_trait]
impl AciApi for MockAciApi {
    async fn create_container_group(
        &self,
        _resource_group: &str,
        name: &str,
        container_group: &ContainerGroup,
    ) -> Result<ContainerGroup, AciError> {
        use std::sync::atomic::Ordering;

        let index = self.creates.fetch_add(1, Ordering::SeqCst);
        if self.fail_create_at == Some(index) {
            return Err(AciError::Api {
                status: 409,
                code: "ContainerGroupQuotaReached".to_string(),
                message: "quota reached".to_string(),
            });
        }

        let mut created = container_group.clone();
        created.name = name.to_string();
        created.properties.provisioning_state = Some("Creating".to_string());
        self.groups
            .lock()
            .unwrap()
            .insert(name.to_string(), created.clone());
        Ok(created)
    }

    async fn delete_container_group(
        &self,
        _resource_group: &str,
        name: &str,
    ) -> Result<(), AciError> {
        self.groups
            .lock()
            .unwrap()
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| Self::not_found(name))
    }

    async fn list_container_groups(
        &self,
        _resource_group: &str,
    ) -> Result<ContainerGroupListResult, AciError> {
        Ok(ContainerGroupListResult {
            value: self.groups.lock().unwrap().values().cloned().collect(),
            next_link: None,
        })
    }

    async fn get_container_group(
        &self,
        _resource_group: &str,
        name: &str,
    ) -> Result<ContainerGroup, AciError> {
        self.groups
            .lock()
            .unwrap()
            .get(name)
            .cloned()
            .ok_or_else(|| Self::not_found(name))
    }

    async fn get_container_logs(
        &self,
        _resource_group: &str,
        container_group: &str,
        _container: &str,
        _tail: Option<u32>,
    ) -> Result<Logs, AciError> {
        use std::sync::atomic::Ordering;

        self.log_calls.fetch_add(1, Ordering::SeqCst);
        if !self.groups.lock().unwrap().contains_key(container_group) {
            return Err(Self::not_found(container_group));
        }
        let remaining = self.log_failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.log_failures.store(remaining - 1, Ordering::SeqCst);
            return Err(AciError::Api {
                status: 400,
                code: "ContainerGroupTransitioning".to_string(),
                message: "container is starting".to_string(),
            });
        }
        Ok(Logs {
            content: self.log_content.clone(),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[path = "client_test.rs"]
mod tests;
