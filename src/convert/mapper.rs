//! Kubernetes PodSpec to ACI ContainerGroup mapping
//!
//! A field-by-field translation: containers, ports, mounts, env vars and
//! resources map one-to-one; CPU and memory are converted into ACI units and
//! zero values fall back to 1 core / 1 GB.

use super::quantity::{cpu_cores, memory_gb, QuantityError};
use crate::aci::types::{
    Container, ContainerGroup, ContainerGroupProperties, ContainerNetworkProtocol, ContainerPort,
    ContainerProperties, EnvironmentVariable, GitRepoVolume, IpAddress, IpAddressType,
    OperatingSystemType, Port, ResourceLimits, ResourceRequests, ResourceRequirements,
    RestartPolicy, Volume, VolumeMount, CONTAINER_GROUP_TYPE,
};
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1 as core;
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::{debug, warn};

/// Value substituted when a CPU or memory request/limit is zero or unset
pub const DEFAULT_CPU_CORES: f64 = 1.0;
pub const DEFAULT_MEMORY_GB: f64 = 1.0;

#[derive(Debug, Error)]
pub enum MapError {
    #[error("deployment has no pod template spec")]
    MissingPodSpec,

    #[error("deployment missing metadata.name")]
    MissingName,

    #[error("container '{0}' has no image")]
    MissingImage(String),

    #[error("unsupported restart policy '{0}'")]
    InvalidRestartPolicy(String),

    #[error("container '{container}' has invalid {resource} quantity: {source}")]
    InvalidQuantity {
        container: String,
        resource: String,
        #[source]
        source: QuantityError,
    },
}

/// Build a container group from a Deployment's pod template
///
/// The group is named after the deployment; callers that create replicas
/// rename it per replica.
pub fn deployment_to_container_group(
    deployment: &Deployment,
    region: &str,
    os_type: OperatingSystemType,
) -> Result<ContainerGroup, MapError> {
    let name = deployment
        .metadata
        .name
        .as_deref()
        .ok_or(MapError::MissingName)?;
    let pod_spec = deployment
        .spec
        .as_ref()
        .and_then(|spec| spec.template.spec.as_ref())
        .ok_or(MapError::MissingPodSpec)?;

    pod_to_container_group(name, pod_spec, region, os_type)
}

/// Translate a PodSpec into an ACI ContainerGroup
pub fn pod_to_container_group(
    name: &str,
    pod_spec: &core::PodSpec,
    region: &str,
    os_type: OperatingSystemType,
) -> Result<ContainerGroup, MapError> {
    let restart_policy = parse_restart_policy(pod_spec.restart_policy.as_deref())?;
    let containers = pod_spec
        .containers
        .iter()
        .map(map_container)
        .collect::<Result<Vec<_>, _>>()?;
    let volumes = map_volumes(pod_spec.volumes.as_deref().unwrap_or_default());
    let ip_address = group_ip_address(&containers);

    debug!(
        group = name,
        containers = containers.len(),
        volumes = volumes.len(),
        "Mapped pod spec to container group"
    );

    Ok(ContainerGroup {
        name: name.to_string(),
        resource_type: CONTAINER_GROUP_TYPE.to_string(),
        location: region.to_string(),
        properties: ContainerGroupProperties {
            containers,
            restart_policy: Some(restart_policy),
            ip_address,
            os_type: Some(os_type),
            volumes,
            ..Default::default()
        },
        ..Default::default()
    })
}

/// Kubernetes defaults an unset restart policy to Always
fn parse_restart_policy(policy: Option<&str>) -> Result<RestartPolicy, MapError> {
    match policy {
        None | Some("") | Some("Always") => Ok(RestartPolicy::Always),
        Some("OnFailure") => Ok(RestartPolicy::OnFailure),
        Some("Never") => Ok(RestartPolicy::Never),
        Some(other) => Err(MapError::InvalidRestartPolicy(other.to_string())),
    }
}

fn map_protocol(protocol: Option<&str>) -> ContainerNetworkProtocol {
    match protocol {
        Some("UDP") => ContainerNetworkProtocol::Udp,
        _ => ContainerNetworkProtocol::Tcp,
    }
}

fn map_container(container: &core::Container) -> Result<Container, MapError> {
    let image = container
        .image
        .clone()
        .filter(|image| !image.is_empty())
        .ok_or_else(|| MapError::MissingImage(container.name.clone()))?;

    let command = container
        .command
        .iter()
        .flatten()
        .chain(container.args.iter().flatten())
        .cloned()
        .collect();

    let ports = container
        .ports
        .iter()
        .flatten()
        .map(|p| ContainerPort {
            protocol: Some(map_protocol(p.protocol.as_deref())),
            port: p.container_port,
        })
        .collect();

    let volume_mounts = container
        .volume_mounts
        .iter()
        .flatten()
        .map(|m| VolumeMount {
            name: m.name.clone(),
            mount_path: m.mount_path.clone(),
            read_only: m.read_only.unwrap_or(false),
        })
        .collect();

    let environment_variables = container
        .env
        .iter()
        .flatten()
        .map(|e| EnvironmentVariable {
            name: e.name.clone(),
            value: e.value.clone().unwrap_or_default(),
        })
        .collect();

    Ok(Container {
        name: container.name.clone(),
        properties: ContainerProperties {
            image,
            command,
            ports,
            environment_variables,
            resources: map_resources(container)?,
            volume_mounts,
        },
    })
}

fn map_resources(container: &core::Container) -> Result<ResourceRequirements, MapError> {
    let resources = container.resources.as_ref();
    let limits = resources.and_then(|r| r.limits.as_ref());
    let requests = resources.and_then(|r| r.requests.as_ref());

    let (limit_cpu, limit_memory) = cpu_and_memory(&container.name, limits)?;
    let (request_cpu, request_memory) = cpu_and_memory(&container.name, requests)?;

    Ok(ResourceRequirements {
        requests: ResourceRequests {
            memory_in_gb: request_memory,
            cpu: request_cpu,
        },
        limits: Some(ResourceLimits {
            memory_in_gb: limit_memory,
            cpu: limit_cpu,
        }),
    })
}

/// Read cpu and memory from a resource list, substituting defaults for zero
fn cpu_and_memory(
    container: &str,
    list: Option<&BTreeMap<String, Quantity>>,
) -> Result<(f64, f64), MapError> {
    let invalid = |resource: &str, source| MapError::InvalidQuantity {
        container: container.to_string(),
        resource: resource.to_string(),
        source,
    };

    let cpu = match list.and_then(|l| l.get("cpu")) {
        Some(q) => cpu_cores(q).map_err(|e| invalid("cpu", e))?,
        None => 0.0,
    };
    let memory = match list.and_then(|l| l.get("memory")) {
        Some(q) => memory_gb(q).map_err(|e| invalid("memory", e))?,
        None => 0.0,
    };

    let cpu = if cpu == 0.0 { DEFAULT_CPU_CORES } else { cpu };
    let memory = if memory == 0.0 {
        DEFAULT_MEMORY_GB
    } else {
        memory
    };
    Ok((cpu, memory))
}

fn map_volumes(volumes: &[core::Volume]) -> Vec<Volume> {
    let mut mapped = Vec::with_capacity(volumes.len());
    for v in volumes {
        if v.empty_dir.is_some() {
            mapped.push(Volume {
                name: v.name.clone(),
                empty_dir: Some(serde_json::Map::new()),
                git_repo: None,
            });
        } else if let Some(git) = &v.git_repo {
            mapped.push(Volume {
                name: v.name.clone(),
                empty_dir: None,
                git_repo: Some(GitRepoVolume {
                    directory: git.directory.clone(),
                    repository: git.repository.clone(),
                    revision: git.revision.clone(),
                }),
            });
        } else {
            warn!(volume = %v.name, "Skipping volume: only emptyDir and gitRepo map to ACI");
        }
    }
    mapped
}

/// Public IP exposing every container port, or None when nothing is exposed
fn group_ip_address(containers: &[Container]) -> Option<IpAddress> {
    let ports: Vec<Port> = containers
        .iter()
        .flat_map(|c| c.properties.ports.iter())
        .map(|p| Port {
            protocol: p.protocol,
            port: p.port,
        })
        .collect();

    if ports.is_empty() {
        return None;
    }

    Some(IpAddress {
        ports,
        address_type: IpAddressType::Public,
        ip: None,
        dns_name_label: None,
        fqdn: None,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[path = "mapper_test.rs"]
mod tests;
