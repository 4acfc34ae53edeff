//! acictl - run Kubernetes Deployments on Azure Container Instances
//!
//! A Deployment manifest is loaded, its pod template mapped onto an ACI
//! container group, and the group either printed as an ARM template or
//! created once per replica through the ACI management API.

pub mod aci;
pub mod commands;
pub mod config;
pub mod convert;
pub mod manifest;
