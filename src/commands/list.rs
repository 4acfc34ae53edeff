use super::delete::NameMatch;
use super::CommandError;
use crate::aci::{AciApi, ContainerGroup};
use crate::manifest::{deployment_name, load_deployment};
use std::path::Path;

/// Container groups in a resource group, optionally only a deployment's
pub async fn list(
    api: &dyn AciApi,
    resource_group: &str,
    deployment_file: Option<&Path>,
    name_match: NameMatch,
) -> Result<Vec<ContainerGroup>, CommandError> {
    let filter = match deployment_file {
        Some(path) => {
            let deployment = load_deployment(path)?;
            Some(deployment_name(&deployment)?.to_string())
        }
        None => None,
    };

    let groups = api
        .list_container_groups(resource_group)
        .await
        .map_err(CommandError::aci("list"))?;

    Ok(groups
        .value
        .into_iter()
        .filter(|g| {
            filter
                .as_deref()
                .map_or(true, |name| name_match.matches(&g.name, name))
        })
        .collect())
}

/// `name  location  state` line for terminal output
pub fn format_group_row(group: &ContainerGroup) -> String {
    format!(
        "{:<32} {:<16} {}",
        group.name,
        group.location,
        group
            .properties
            .provisioning_state
            .as_deref()
            .unwrap_or("Unknown")
    )
}
