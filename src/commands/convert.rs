use super::CommandError;
use crate::aci::region::is_valid_region;
use crate::aci::OperatingSystemType;
use crate::convert::{deployment_to_container_group, generate_arm_template};
use crate::manifest::load_deployment;
use std::path::Path;
use tracing::warn;

/// Render the ARM template for a deployment manifest
///
/// Returns the pretty-printed JSON; the caller decides where it goes.
pub fn convert(
    deployment_file: &Path,
    region: &str,
    os_type: OperatingSystemType,
) -> Result<String, CommandError> {
    if !is_valid_region(region) {
        warn!(region = %region, "Region is not a known ACI region; template may not deploy");
    }

    let deployment = load_deployment(deployment_file)?;
    let container_group = deployment_to_container_group(&deployment, region, os_type)?;
    let template = generate_arm_template(&container_group);

    Ok(template.to_json_pretty()?)
}
