//! Tests for the PodSpec to ContainerGroup mapping

use super::*;
use k8s_openapi::api::apps::v1::DeploymentSpec;
use k8s_openapi::api::core::v1::{
    Container as K8sContainer, ContainerPort as K8sContainerPort, EmptyDirVolumeSource, EnvVar,
    GitRepoVolumeSource, HostPathVolumeSource, PodSpec, PodTemplateSpec,
    ResourceRequirements as K8sResources, Volume as K8sVolume, VolumeMount as K8sVolumeMount,
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

fn quantities(pairs: &[(&str, &str)]) -> BTreeMap<String, Quantity> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), Quantity(v.to_string())))
        .collect()
}

fn nginx() -> K8sContainer {
    K8sContainer {
        name: "nginx".to_string(),
        image: Some("nginx:1.25".to_string()),
        ..Default::default()
    }
}

#[test]
fn test_group_level_fields() {
    let pod = PodSpec {
        containers: vec![nginx()],
        restart_policy: Some("OnFailure".to_string()),
        ..Default::default()
    };

    let cg = pod_to_container_group("web", &pod, "eastus", OperatingSystemType::Windows).unwrap();

    assert_eq!(cg.name, "web");
    assert_eq!(cg.location, "eastus");
    assert_eq!(cg.resource_type, "Microsoft.ContainerInstance/containerGroups");
    assert_eq!(cg.properties.os_type, Some(OperatingSystemType::Windows));
    assert_eq!(cg.properties.restart_policy, Some(RestartPolicy::OnFailure));
    assert!(cg.properties.ip_address.is_none(), "no ports means no public IP");
}

#[test]
fn test_unset_restart_policy_defaults_to_always() {
    let pod = PodSpec {
        containers: vec![nginx()],
        ..Default::default()
    };

    let cg = pod_to_container_group("web", &pod, "westus", OperatingSystemType::Linux).unwrap();
    assert_eq!(cg.properties.restart_policy, Some(RestartPolicy::Always));
}

#[test]
fn test_unknown_restart_policy_is_rejected() {
    let pod = PodSpec {
        containers: vec![nginx()],
        restart_policy: Some("Sometimes".to_string()),
        ..Default::default()
    };

    let err = pod_to_container_group("web", &pod, "westus", OperatingSystemType::Linux).unwrap_err();
    assert!(matches!(err, MapError::InvalidRestartPolicy(p) if p == "Sometimes"));
}

#[test]
fn test_command_is_command_followed_by_args() {
    let pod = PodSpec {
        containers: vec![K8sContainer {
            command: Some(vec!["/bin/sh".to_string(), "-c".to_string()]),
            args: Some(vec!["echo hi".to_string()]),
            ..nginx()
        }],
        ..Default::default()
    };

    let cg = pod_to_container_group("web", &pod, "westus", OperatingSystemType::Linux).unwrap();
    assert_eq!(
        cg.properties.containers[0].properties.command,
        vec!["/bin/sh", "-c", "echo hi"]
    );
}

#[test]
fn test_ports_env_and_mounts_map_one_to_one() {
    let pod = PodSpec {
        containers: vec![K8sContainer {
            ports: Some(vec![
                K8sContainerPort {
                    container_port: 80,
                    ..Default::default()
                },
                K8sContainerPort {
                    container_port: 53,
                    protocol: Some("UDP".to_string()),
                    ..Default::default()
                },
            ]),
            env: Some(vec![
                EnvVar {
                    name: "MODE".to_string(),
                    value: Some("prod".to_string()),
                    ..Default::default()
                },
                EnvVar {
                    name: "FROM_SECRET".to_string(),
                    value: None,
                    ..Default::default()
                },
            ]),
            volume_mounts: Some(vec![K8sVolumeMount {
                name: "cache".to_string(),
                mount_path: "/cache".to_string(),
                read_only: Some(true),
                ..Default::default()
            }]),
            ..nginx()
        }],
        ..Default::default()
    };

    let cg = pod_to_container_group("web", &pod, "westus", OperatingSystemType::Linux).unwrap();
    let props = &cg.properties.containers[0].properties;

    assert_eq!(props.image, "nginx:1.25");
    assert_eq!(props.ports.len(), 2);
    assert_eq!(props.ports[0].port, 80);
    assert_eq!(props.ports[0].protocol, Some(ContainerNetworkProtocol::Tcp));
    assert_eq!(props.ports[1].protocol, Some(ContainerNetworkProtocol::Udp));

    assert_eq!(props.environment_variables[0].value, "prod");
    assert_eq!(props.environment_variables[1].value, "");

    assert_eq!(props.volume_mounts[0].mount_path, "/cache");
    assert!(props.volume_mounts[0].read_only);
}

#[test]
fn test_public_ip_collects_ports_from_all_containers() {
    let sidecar = K8sContainer {
        name: "dns".to_string(),
        image: Some("coredns".to_string()),
        ports: Some(vec![K8sContainerPort {
            container_port: 53,
            protocol: Some("UDP".to_string()),
            ..Default::default()
        }]),
        ..Default::default()
    };
    let web = K8sContainer {
        ports: Some(vec![K8sContainerPort {
            container_port: 80,
            ..Default::default()
        }]),
        ..nginx()
    };
    let pod = PodSpec {
        containers: vec![web, sidecar],
        ..Default::default()
    };

    let cg = pod_to_container_group("web", &pod, "westus", OperatingSystemType::Linux).unwrap();
    let ip = cg.properties.ip_address.expect("ports should create an IP");

    assert_eq!(ip.address_type, IpAddressType::Public);
    assert_eq!(
        ip.ports,
        vec![
            Port {
                protocol: Some(ContainerNetworkProtocol::Tcp),
                port: 80
            },
            Port {
                protocol: Some(ContainerNetworkProtocol::Udp),
                port: 53
            },
        ]
    );
}

#[test]
fn test_resources_default_to_one_when_unset() {
    let pod = PodSpec {
        containers: vec![nginx()],
        ..Default::default()
    };

    let cg = pod_to_container_group("web", &pod, "westus", OperatingSystemType::Linux).unwrap();
    let resources = &cg.properties.containers[0].properties.resources;

    assert_eq!(resources.requests.cpu, 1.0);
    assert_eq!(resources.requests.memory_in_gb, 1.0);
    let limits = resources.limits.as_ref().unwrap();
    assert_eq!(limits.cpu, 1.0);
    assert_eq!(limits.memory_in_gb, 1.0);
}

#[test]
fn test_resources_convert_units_and_substitute_zero() {
    let pod = PodSpec {
        containers: vec![K8sContainer {
            resources: Some(K8sResources {
                requests: Some(quantities(&[("cpu", "250m"), ("memory", "0")])),
                limits: Some(quantities(&[("cpu", "2"), ("memory", "1.5G")])),
                ..Default::default()
            }),
            ..nginx()
        }],
        ..Default::default()
    };

    let cg = pod_to_container_group("web", &pod, "westus", OperatingSystemType::Linux).unwrap();
    let resources = &cg.properties.containers[0].properties.resources;

    // 250m rounds up to a whole core
    assert_eq!(resources.requests.cpu, 1.0);
    // explicit zero is substituted
    assert_eq!(resources.requests.memory_in_gb, 1.0);
    let limits = resources.limits.as_ref().unwrap();
    assert_eq!(limits.cpu, 2.0);
    assert_eq!(limits.memory_in_gb, 1.5);
}

#[test]
fn test_invalid_quantity_names_container_and_resource() {
    let pod = PodSpec {
        containers: vec![K8sContainer {
            resources: Some(K8sResources {
                limits: Some(quantities(&[("memory", "lots")])),
                ..Default::default()
            }),
            ..nginx()
        }],
        ..Default::default()
    };

    let err = pod_to_container_group("web", &pod, "westus", OperatingSystemType::Linux).unwrap_err();
    match err {
        MapError::InvalidQuantity {
            container,
            resource,
            ..
        } => {
            assert_eq!(container, "nginx");
            assert_eq!(resource, "memory");
        }
        other => panic!("expected InvalidQuantity, got {:?}", other),
    }
}

#[test]
fn test_missing_image_is_rejected() {
    let pod = PodSpec {
        containers: vec![K8sContainer {
            name: "broken".to_string(),
            ..Default::default()
        }],
        ..Default::default()
    };

    let err = pod_to_container_group("web", &pod, "westus", OperatingSystemType::Linux).unwrap_err();
    assert!(matches!(err, MapError::MissingImage(name) if name == "broken"));
}

#[test]
fn test_pod_without_containers_maps_to_empty_group() {
    let group =
        pod_to_container_group("web", &PodSpec::default(), "westus", OperatingSystemType::Linux)
            .unwrap();

    assert_eq!(group.name, "web");
    assert!(group.properties.containers.is_empty());
    assert!(group.properties.ip_address.is_none());
    assert!(group.properties.volumes.is_empty());
}

#[test]
fn test_volumes_keep_empty_dir_and_git_repo_only() {
    let pod = PodSpec {
        containers: vec![nginx()],
        volumes: Some(vec![
            K8sVolume {
                name: "scratch".to_string(),
                empty_dir: Some(EmptyDirVolumeSource::default()),
                ..Default::default()
            },
            K8sVolume {
                name: "site".to_string(),
                git_repo: Some(GitRepoVolumeSource {
                    repository: "https://github.com/example/site".to_string(),
                    revision: Some("main".to_string()),
                    directory: None,
                }),
                ..Default::default()
            },
            K8sVolume {
                name: "host".to_string(),
                host_path: Some(HostPathVolumeSource {
                    path: "/var/log".to_string(),
                    ..Default::default()
                }),
                ..Default::default()
            },
        ]),
        ..Default::default()
    };

    let cg = pod_to_container_group("web", &pod, "westus", OperatingSystemType::Linux).unwrap();
    let volumes = &cg.properties.volumes;

    assert_eq!(volumes.len(), 2, "hostPath has no ACI counterpart");
    assert_eq!(volumes[0].name, "scratch");
    assert!(volumes[0].empty_dir.is_some());
    let git = volumes[1].git_repo.as_ref().unwrap();
    assert_eq!(git.repository, "https://github.com/example/site");
    assert_eq!(git.revision.as_deref(), Some("main"));
}

#[test]
fn test_deployment_to_container_group_uses_deployment_name() {
    let deployment = Deployment {
        metadata: ObjectMeta {
            name: Some("my-nginx".to_string()),
            ..Default::default()
        },
        spec: Some(DeploymentSpec {
            template: PodTemplateSpec {
                metadata: None,
                spec: Some(PodSpec {
                    containers: vec![nginx()],
                    ..Default::default()
                }),
            },
            ..Default::default()
        }),
        status: None,
    };

    let cg = deployment_to_container_group(&deployment, "westus", OperatingSystemType::Linux)
        .unwrap();
    assert_eq!(cg.name, "my-nginx");
}

#[test]
fn test_deployment_without_pod_spec_is_rejected() {
    let deployment = Deployment {
        metadata: ObjectMeta {
            name: Some("empty".to_string()),
            ..Default::default()
        },
        spec: None,
        status: None,
    };

    let err = deployment_to_container_group(&deployment, "westus", OperatingSystemType::Linux)
        .unwrap_err();
    assert!(matches!(err, MapError::MissingPodSpec));
}
