//! Azure Container Instance integration
//!
//! - `types`: the container group resource model
//! - `auth`: service principal credentials and bearer tokens
//! - `client`: the `AciApi` trait and its ARM REST implementation
//! - `region`: supported region validation

pub mod auth;
pub mod client;
pub mod region;
pub mod types;

pub use auth::{AuthError, AzureCredentials};
pub use client::{AciApi, AciClient, AciError, API_VERSION};
pub use region::{is_valid_region, VALID_REGIONS};
pub use types::{ContainerGroup, OperatingSystemType};
