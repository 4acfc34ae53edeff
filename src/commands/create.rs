use super::CommandError;
use crate::aci::{AciApi, OperatingSystemType};
use crate::convert::deployment_to_container_group;
use crate::manifest::{deployment_name, deployment_replicas, load_deployment};
use rand::Rng;
use std::collections::HashSet;
use std::path::Path;
use tracing::info;

pub const NAME_SUFFIX_LENGTH: usize = 5;

const NAME_SUFFIX_CHARS: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ123456789";

/// Random suffix drawn from letters and the digits 1-9
pub fn random_suffix(rng: &mut impl Rng, len: usize) -> String {
    (0..len)
        .map(|_| NAME_SUFFIX_CHARS[rng.gen_range(0..NAME_SUFFIX_CHARS.len())] as char)
        .collect()
}

/// `count` distinct `<base>-<suffix>` names
pub fn replica_names(base: &str, count: usize, rng: &mut impl Rng) -> Vec<String> {
    let mut seen = HashSet::with_capacity(count);
    let mut names = Vec::with_capacity(count);
    while names.len() < count {
        let name = format!("{}-{}", base, random_suffix(rng, NAME_SUFFIX_LENGTH));
        if seen.insert(name.clone()) {
            names.push(name);
        }
    }
    names
}

/// Create one container group per deployment replica
///
/// Stops at the first failed create and returns its error; groups created
/// before the failure are left in place.
pub async fn create(
    api: &dyn AciApi,
    deployment_file: &Path,
    resource_group: &str,
    region: &str,
    os_type: OperatingSystemType,
) -> Result<Vec<String>, CommandError> {
    let deployment = load_deployment(deployment_file)?;
    let base_name = deployment_name(&deployment)?.to_string();
    let replicas = usize::try_from(deployment_replicas(&deployment)).unwrap_or(0);
    let mut container_group = deployment_to_container_group(&deployment, region, os_type)?;

    if replicas == 0 {
        info!(deployment = %base_name, "Deployment has zero replicas, nothing to create");
        return Ok(Vec::new());
    }

    let names = replica_names(&base_name, replicas, &mut rand::thread_rng());
    let mut created = Vec::with_capacity(names.len());

    for name in names {
        container_group.name = name.clone();
        info!(
            group = %name,
            resource_group = %resource_group,
            region = %region,
            "Creating container group"
        );

        api.create_container_group(resource_group, &name, &container_group)
            .await
            .map_err(CommandError::aci("create"))?;
        created.push(name);
    }

    info!(
        deployment = %base_name,
        count = created.len(),
        "Created container groups"
    );
    Ok(created)
}
