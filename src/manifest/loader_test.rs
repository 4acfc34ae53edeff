//! Tests for Deployment manifest loading

use super::*;
use std::io::Write;

const APPS_V1: &str = r#"
apiVersion: apps/v1
kind: Deployment
metadata:
  name: my-nginx
spec:
  replicas: 3
  selector:
    matchLabels:
      run: my-nginx
  template:
    metadata:
      labels:
        run: my-nginx
    spec:
      containers:
      - name: my-nginx
        image: nginx
        ports:
        - containerPort: 80
"#;

const EXTENSIONS_V1BETA1: &str = r#"
apiVersion: extensions/v1beta1
kind: Deployment
metadata:
  name: my-nginx
spec:
  replicas: 2
  template:
    metadata:
      labels:
        run: my-nginx
    spec:
      containers:
      - name: my-nginx
        image: nginx
        ports:
        - containerPort: 80
"#;

#[test]
fn test_parse_apps_v1_deployment() {
    let deployment = parse_deployment(APPS_V1).unwrap();

    assert_eq!(deployment.metadata.name.as_deref(), Some("my-nginx"));
    assert_eq!(deployment_replicas(&deployment), 3);
    let pod = deployment.spec.unwrap().template.spec.unwrap();
    assert_eq!(pod.containers[0].image.as_deref(), Some("nginx"));
    assert_eq!(pod.containers[0].ports.as_ref().unwrap()[0].container_port, 80);
}

#[test]
fn test_parse_legacy_deployment_defaults_selector_from_labels() {
    let deployment = parse_deployment(EXTENSIONS_V1BETA1).unwrap();

    assert_eq!(deployment_replicas(&deployment), 2);
    let selector = deployment.spec.unwrap().selector;
    let labels = selector.match_labels.unwrap();
    assert_eq!(labels.get("run").map(String::as_str), Some("my-nginx"));
}

#[test]
fn test_parse_json_manifest() {
    let json = r#"{
        "apiVersion": "apps/v1",
        "kind": "Deployment",
        "metadata": {"name": "api"},
        "spec": {
            "selector": {"matchLabels": {"app": "api"}},
            "template": {
                "metadata": {"labels": {"app": "api"}},
                "spec": {"containers": [{"name": "api", "image": "example/api:1"}]}
            }
        }
    }"#;

    let deployment = parse_deployment(json).unwrap();
    assert_eq!(deployment_name(&deployment).unwrap(), "api");
}

#[test]
fn test_missing_replicas_defaults_to_one() {
    let manifest = APPS_V1.replace("  replicas: 3\n", "");
    let deployment = parse_deployment(&manifest).unwrap();

    assert_eq!(deployment.spec.as_ref().unwrap().replicas, Some(1));
}

#[test]
fn test_multi_document_manifest_picks_deployment() {
    let manifest = format!(
        "apiVersion: v1\nkind: Service\nmetadata:\n  name: my-nginx\n---\n{}",
        APPS_V1
    );

    let deployment = parse_deployment(&manifest).unwrap();
    assert_eq!(deployment.metadata.name.as_deref(), Some("my-nginx"));
}

#[test]
fn test_manifest_without_deployment_is_rejected() {
    let manifest = "apiVersion: v1\nkind: Service\nmetadata:\n  name: svc\n";

    match parse_deployment(manifest) {
        Err(ManifestError::UnsupportedKind(kinds)) => assert_eq!(kinds, "Service"),
        other => panic!("expected UnsupportedKind, got {:?}", other),
    }
}

#[test]
fn test_empty_manifest_is_rejected() {
    assert!(matches!(
        parse_deployment(""),
        Err(ManifestError::UnsupportedKind(_))
    ));
}

#[test]
fn test_unknown_api_version_is_rejected() {
    let manifest = APPS_V1.replace("apps/v1", "apps/v2");

    match parse_deployment(&manifest) {
        Err(ManifestError::UnsupportedApiVersion(v)) => assert_eq!(v, "apps/v2"),
        other => panic!("expected UnsupportedApiVersion, got {:?}", other),
    }
}

#[test]
fn test_invalid_yaml_is_parse_error() {
    let result = parse_deployment("kind: Deployment\n  bad: [indent");
    assert!(matches!(result, Err(ManifestError::Parse(_))));
}

#[test]
fn test_missing_name_is_rejected() {
    let manifest = APPS_V1.replace("  name: my-nginx\n", "  labels: {}\n");
    assert!(matches!(
        parse_deployment(&manifest),
        Err(ManifestError::MissingName)
    ));
}

#[test]
fn test_missing_pod_spec_is_rejected() {
    let manifest = r#"
apiVersion: apps/v1
kind: Deployment
metadata:
  name: hollow
spec:
  selector:
    matchLabels:
      app: hollow
  template:
    metadata:
      labels:
        app: hollow
"#;

    match parse_deployment(manifest) {
        Err(ManifestError::MissingPodSpec(name)) => assert_eq!(name, "hollow"),
        other => panic!("expected MissingPodSpec, got {:?}", other),
    }
}

#[test]
fn test_load_deployment_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(APPS_V1.as_bytes()).unwrap();

    let deployment = load_deployment(file.path()).unwrap();
    assert_eq!(deployment.metadata.name.as_deref(), Some("my-nginx"));
}

#[test]
fn test_load_missing_file_reports_path() {
    let err = load_deployment(std::path::Path::new("/nonexistent/deploy.yaml")).unwrap_err();

    assert!(matches!(err, ManifestError::NotFound { .. }));
    assert!(err.to_string().contains("/nonexistent/deploy.yaml"));
}

#[test]
fn test_numeric_quantities_are_accepted() {
    let manifest = r#"
apiVersion: apps/v1
kind: Deployment
metadata:
  name: worker
spec:
  selector:
    matchLabels:
      app: worker
  template:
    metadata:
      labels:
        app: worker
    spec:
      initContainers:
      - name: migrate
        image: busybox
        resources:
          requests:
            cpu: 1
      containers:
      - name: worker
        image: busybox
        resources:
          requests:
            cpu: 0.5
            memory: 1Gi
          limits:
            cpu: 2
            memory: 2000000000
"#;

    let deployment = parse_deployment(manifest).unwrap();
    let pod = deployment.spec.unwrap().template.spec.unwrap();

    let resources = pod.containers[0].resources.as_ref().unwrap();
    let requests = resources.requests.as_ref().unwrap();
    let limits = resources.limits.as_ref().unwrap();
    assert_eq!(requests["cpu"].0, "0.5");
    assert_eq!(requests["memory"].0, "1Gi");
    assert_eq!(limits["cpu"].0, "2");
    assert_eq!(limits["memory"].0, "2000000000");

    let init = pod.init_containers.unwrap();
    let init_requests = init[0].resources.as_ref().unwrap().requests.as_ref().unwrap();
    assert_eq!(init_requests["cpu"].0, "1");
}

#[test]
fn test_numeric_quantities_in_legacy_deployment() {
    let manifest = EXTENSIONS_V1BETA1.replace(
        "        - containerPort: 80\n",
        "        - containerPort: 80\n        resources:\n          limits:\n            cpu: 3\n",
    );

    let deployment = parse_deployment(&manifest).unwrap();
    let pod = deployment.spec.unwrap().template.spec.unwrap();
    let limits = pod.containers[0].resources.as_ref().unwrap().limits.as_ref().unwrap();
    assert_eq!(limits["cpu"].0, "3");
}
