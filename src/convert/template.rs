//! ARM template envelope for a container group

use crate::aci::types::ContainerGroup;
use serde::{Deserialize, Serialize};

pub const ARM_TEMPLATE_SCHEMA: &str =
    "https://schema.management.azure.com/schemas/2015-01-01/deploymentTemplate.json#";
pub const ARM_TEMPLATE_CONTENT_VERSION: &str = "1.0.0.0";

/// ACI API version stamped on template resources
pub const CONTAINER_GROUP_API_VERSION: &str = "2018-04-01";

/// Minimal deployable ARM template
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ArmTemplate {
    #[serde(rename = "$schema")]
    pub schema: String,

    #[serde(rename = "contentVersion")]
    pub content_version: String,

    pub resources: Vec<ArmResource>,
}

/// A container group with the `apiVersion` ARM requires on every resource
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ArmResource {
    #[serde(flatten)]
    pub container_group: ContainerGroup,

    #[serde(rename = "apiVersion")]
    pub api_version: String,
}

impl ArmTemplate {
    /// Pretty JSON with two-space indentation
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Wrap a container group in an ARM template
pub fn generate_arm_template(container_group: &ContainerGroup) -> ArmTemplate {
    ArmTemplate {
        schema: ARM_TEMPLATE_SCHEMA.to_string(),
        content_version: ARM_TEMPLATE_CONTENT_VERSION.to_string(),
        resources: vec![ArmResource {
            container_group: container_group.clone(),
            api_version: CONTAINER_GROUP_API_VERSION.to_string(),
        }],
    }
}
