//! Sykli CI pipeline for acictl
//!
//! Run locally: sykli run
//! Or: cargo run --bin sykli --features sykli -- --emit | sykli run -

use sykli::{Condition, Pipeline, Template};

fn main() {
    let mut p = Pipeline::new();

    // === RESOURCES ===
    let src = p.dir(".");
    let cargo_registry = p.cache("cargo-registry");
    let cargo_git = p.cache("cargo-git");
    let target_cache = p.cache("target");

    // === TEMPLATE ===
    let rust = Template::new()
        .container("rust:1.85")
        .mount_dir(&src, "/src")
        .mount_cache(&cargo_registry, "/usr/local/cargo/registry")
        .mount_cache(&cargo_git, "/usr/local/cargo/git")
        .mount_cache(&target_cache, "/src/target")
        .workdir("/src");

    // === TASKS ===

    let _ = p
        .task("test")
        .from(&rust)
        .run("cargo test --all-features")
        .inputs(&["**/*.rs", "demos/*.yaml", "Cargo.toml", "Cargo.lock"]);

    let _ = p
        .task("lint")
        .from(&rust)
        .run("cargo clippy --all-targets --all-features -- -D warnings")
        .inputs(&["**/*.rs", "Cargo.toml", "Cargo.lock"]);

    let _ = p
        .task("fmt")
        .from(&rust)
        .run("cargo fmt -- --check")
        .inputs(&["**/*.rs"]);

    let _ = p
        .task("build")
        .from(&rust)
        .run("cargo build --release --bin acictl")
        .inputs(&["**/*.rs", "Cargo.toml", "Cargo.lock"])
        .output("binary", "target/release/acictl")
        .after(&["test", "lint", "fmt"]);

    // Convert the demo manifest with the release binary; needs no Azure account
    let _ = p
        .task("convert-smoke")
        .from(&rust)
        .run(
            r#"#!/bin/bash
set -e

./target/release/acictl convert demos/nginx-deployment.yaml --region westeurope > /tmp/template.json

NAME=$(grep -o '"name": "my-nginx"' /tmp/template.json | head -1)
if [ -z "$NAME" ]; then
  echo "ERROR: template does not name the container group my-nginx"
  cat /tmp/template.json
  exit 1
fi

if ./target/release/acictl convert demos/nginx-deployment.yaml --os Solaris 2>/dev/null; then
  echo "ERROR: unsupported OS was accepted"
  exit 1
fi

echo "Convert smoke test passed"
"#,
        )
        .input_from("build", "binary", "/src/target/release/acictl")
        .when_cond(Condition::event("push").or(Condition::negate(Condition::branch("*"))))
        .timeout(300);

    p.emit();
}
