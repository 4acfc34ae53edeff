//! Kubernetes Deployment manifest loading
//!
//! Reads YAML or JSON manifests and decodes them into typed
//! `k8s_openapi` Deployments, accepting the legacy `extensions/v1beta1`
//! and `apps/v1beta*` shapes alongside `apps/v1`.

pub mod loader;

pub use loader::{
    deployment_name, deployment_replicas, load_deployment, parse_deployment, ManifestError,
    DEFAULT_REPLICAS, SUPPORTED_API_VERSIONS,
};

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[path = "loader_test.rs"]
mod loader_tests;
