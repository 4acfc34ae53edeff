use super::CommandError;
use crate::aci::AciApi;
use crate::manifest::{deployment_name, load_deployment};
use std::path::Path;
use tracing::info;

/// How container group names are matched against a deployment name
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum NameMatch {
    /// The group name contains the deployment name anywhere
    #[default]
    Contains,
    /// The group is named after the deployment or one of its replicas
    /// (`<deployment>-<suffix>`), so `web` owns `web-Ab3xZ` but not
    /// `webapp-Ab3xZ`
    Strict,
}

impl NameMatch {
    pub fn matches(self, group_name: &str, deployment: &str) -> bool {
        match self {
            NameMatch::Contains => group_name.contains(deployment),
            NameMatch::Strict => {
                group_name == deployment
                    || group_name
                        .strip_prefix(deployment)
                        .is_some_and(|rest| rest.starts_with('-'))
            }
        }
    }
}

/// Delete every container group belonging to the deployment
///
/// Stops at the first failed delete.
pub async fn delete(
    api: &dyn AciApi,
    deployment_file: &Path,
    resource_group: &str,
    name_match: NameMatch,
) -> Result<Vec<String>, CommandError> {
    let deployment = load_deployment(deployment_file)?;
    let name = deployment_name(&deployment)?;

    let groups = api
        .list_container_groups(resource_group)
        .await
        .map_err(CommandError::aci("list"))?;

    let mut deleted = Vec::new();
    for group in groups
        .value
        .iter()
        .filter(|g| name_match.matches(&g.name, name))
    {
        info!(group = %group.name, resource_group = %resource_group, "Deleting container group");
        api.delete_container_group(resource_group, &group.name)
            .await
            .map_err(CommandError::aci("delete"))?;
        deleted.push(group.name.clone());
    }

    if deleted.is_empty() {
        info!(deployment = %name, "No container groups matched the deployment");
    }
    Ok(deleted)
}
