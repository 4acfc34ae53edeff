use k8s_openapi::api::apps::v1::Deployment;
use serde::Deserialize;
use serde_json::{json, Value};
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

/// Deployment API versions the loader understands
///
/// Legacy versions are normalized into `apps/v1` before decoding.
pub const SUPPORTED_API_VERSIONS: &[&str] = &[
    "apps/v1",
    "apps/v1beta2",
    "apps/v1beta1",
    "extensions/v1beta1",
];

const CURRENT_API_VERSION: &str = "apps/v1";

/// Kubernetes default for an unset `spec.replicas`
pub const DEFAULT_REPLICAS: i32 = 1;

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("could not read deployment file {path}: {source}")]
    NotFound {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("manifest is not valid YAML or JSON: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("manifest does not match the Deployment schema: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("no Deployment found in manifest (kinds seen: {0})")]
    UnsupportedKind(String),

    #[error("unsupported Deployment apiVersion '{0}', expected one of: {expected}", expected = SUPPORTED_API_VERSIONS.join(", "))]
    UnsupportedApiVersion(String),

    #[error("deployment missing metadata.name")]
    MissingName,

    #[error("deployment '{0}' has no pod template spec")]
    MissingPodSpec(String),
}

/// Read and decode a Deployment manifest from disk
pub fn load_deployment(path: &Path) -> Result<Deployment, ManifestError> {
    let text = std::fs::read_to_string(path).map_err(|source| ManifestError::NotFound {
        path: path.display().to_string(),
        source,
    })?;

    let deployment = parse_deployment(&text)?;
    info!(
        path = %path.display(),
        deployment = deployment.metadata.name.as_deref().unwrap_or_default(),
        replicas = deployment_replicas(&deployment),
        "Loaded deployment manifest"
    );
    Ok(deployment)
}

/// Decode the first Deployment document in a YAML or JSON string
///
/// Documents of other kinds are skipped, so a manifest bundling a Service
/// with its Deployment works.
pub fn parse_deployment(text: &str) -> Result<Deployment, ManifestError> {
    let mut kinds_seen = Vec::new();

    for document in serde_yaml::Deserializer::from_str(text) {
        let value = Value::deserialize(document)?;
        if value.is_null() {
            continue;
        }

        let kind = value
            .get("kind")
            .and_then(Value::as_str)
            .unwrap_or("<none>")
            .to_string();
        if kind != "Deployment" {
            debug!(kind = %kind, "Skipping non-Deployment document");
            kinds_seen.push(kind);
            continue;
        }

        return decode_deployment(value);
    }

    let seen = if kinds_seen.is_empty() {
        "none".to_string()
    } else {
        kinds_seen.join(", ")
    };
    Err(ManifestError::UnsupportedKind(seen))
}

fn decode_deployment(mut value: Value) -> Result<Deployment, ManifestError> {
    let api_version = value
        .get("apiVersion")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    if !SUPPORTED_API_VERSIONS.contains(&api_version.as_str()) {
        return Err(ManifestError::UnsupportedApiVersion(api_version));
    }
    if api_version != CURRENT_API_VERSION {
        debug!(from = %api_version, to = CURRENT_API_VERSION, "Normalizing legacy Deployment");
        normalize_legacy(&mut value);
    }
    stringify_quantities(&mut value);

    let mut deployment: Deployment = serde_json::from_value(value)?;

    let name = deployment
        .metadata
        .name
        .clone()
        .filter(|n| !n.is_empty())
        .ok_or(ManifestError::MissingName)?;

    let spec = deployment
        .spec
        .as_mut()
        .ok_or_else(|| ManifestError::MissingPodSpec(name.clone()))?;
    if spec.template.spec.is_none() {
        return Err(ManifestError::MissingPodSpec(name));
    }
    spec.replicas.get_or_insert(DEFAULT_REPLICAS);

    Ok(deployment)
}

/// Rewrite a legacy Deployment in place so it decodes as `apps/v1`
///
/// Legacy API servers defaulted `spec.selector` to the pod template labels;
/// `apps/v1` requires it explicitly.
fn normalize_legacy(value: &mut Value) {
    value["apiVersion"] = json!(CURRENT_API_VERSION);

    let Some(spec) = value.get_mut("spec").and_then(Value::as_object_mut) else {
        return;
    };
    if spec.contains_key("selector") {
        return;
    }

    let labels = spec
        .get("template")
        .and_then(|t| t.get("metadata"))
        .and_then(|m| m.get("labels"))
        .cloned();
    if let Some(labels) = labels {
        spec.insert("selector".to_string(), json!({ "matchLabels": labels }));
    }
}

/// Quote numeric resource quantities (`cpu: 2`, `cpu: 0.5`)
///
/// The API server accepts bare YAML numbers for quantities, but `Quantity`
/// only decodes from a string.
fn stringify_quantities(value: &mut Value) {
    let Some(pod) = value.pointer_mut("/spec/template/spec") else {
        return;
    };

    for list in ["containers", "initContainers"] {
        let Some(containers) = pod.get_mut(list).and_then(Value::as_array_mut) else {
            continue;
        };
        for container in containers {
            for field in ["requests", "limits"] {
                let Some(resources) = container
                    .pointer_mut(&format!("/resources/{}", field))
                    .and_then(Value::as_object_mut)
                else {
                    continue;
                };
                for quantity in resources.values_mut() {
                    if let Value::Number(n) = quantity {
                        let text = n.to_string();
                        *quantity = Value::String(text);
                    }
                }
            }
        }
    }
}

/// Desired replica count, defaulting like the API server does
pub fn deployment_replicas(deployment: &Deployment) -> i32 {
    deployment
        .spec
        .as_ref()
        .and_then(|s| s.replicas)
        .unwrap_or(DEFAULT_REPLICAS)
}

/// Deployment name, or an error if the manifest had none
pub fn deployment_name(deployment: &Deployment) -> Result<&str, ManifestError> {
    deployment
        .metadata
        .name
        .as_deref()
        .ok_or(ManifestError::MissingName)
}
