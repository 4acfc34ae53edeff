use super::CommandError;
use crate::aci::AciApi;
use std::time::Duration;
use tracing::warn;

/// How often to ask for logs while a container is still starting
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 10,
            delay: Duration::from_secs(5),
        }
    }
}

/// Fetch a container's logs, retrying failed requests
///
/// The container group must exist; only the log request itself is retried.
pub async fn logs(
    api: &dyn AciApi,
    resource_group: &str,
    container_group: &str,
    container: &str,
    tail: Option<u32>,
    retry: RetryPolicy,
) -> Result<String, CommandError> {
    let group = api
        .get_container_group(resource_group, container_group)
        .await
        .map_err(CommandError::aci("get"))?;

    let attempts = retry.attempts.max(1);
    let mut attempt = 1;
    loop {
        match api
            .get_container_logs(resource_group, &group.name, container, tail)
            .await
        {
            Ok(logs) => return Ok(logs.content),
            Err(e) if attempt < attempts => {
                warn!(
                    error = %e,
                    group = %group.name,
                    container = %container,
                    attempt,
                    "Log request failed, retrying"
                );
                attempt += 1;
                tokio::time::sleep(retry.delay).await;
            }
            Err(e) => return Err(CommandError::aci("logs")(e)),
        }
    }
}
