//! Layered CLI configuration
//!
//! Precedence, lowest first: built-in defaults, TOML config file,
//! environment (`ACI_RESOURCE_GROUP`, `ACI_REGION`, `ACI_OS`), CLI flags.

use crate::aci::region::{is_valid_region, normalize_region, VALID_REGIONS};
use crate::aci::types::OperatingSystemType;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

pub const CONFIG_PATH_ENV: &str = "ACICTL_CONFIG";
pub const RESOURCE_GROUP_ENV: &str = "ACI_RESOURCE_GROUP";
pub const REGION_ENV: &str = "ACI_REGION";
pub const OS_ENV: &str = "ACI_OS";

/// Region used by `convert` when none is configured
pub const DEFAULT_CONVERT_REGION: &str = "westus";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("operating system '{0}' not supported, expected Linux or Windows")]
    UnsupportedOs(String),

    #[error("region '{region}' is invalid, supported regions are: {supported}", supported = VALID_REGIONS.join(", "))]
    InvalidRegion { region: String },

    #[error("{what} is required: pass {flag} or set {env}")]
    Missing {
        what: &'static str,
        flag: &'static str,
        env: &'static str,
    },
}

/// Keys accepted in the TOML config file
#[derive(Debug, Default, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct FileConfig {
    pub resource_group: Option<String>,
    pub region: Option<String>,
    pub operating_system: Option<String>,
    pub management_endpoint: Option<String>,

    /// Keys acictl does not read, e.g. older `CPU`/`Memory`/`CInstances`
    /// provider settings; logged and ignored
    #[serde(flatten)]
    pub unknown: BTreeMap<String, toml::Value>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let config: FileConfig = toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })?;

        for key in config.unknown.keys() {
            warn!(path = %path.display(), key = %key, "Ignoring unknown config key");
        }
        Ok(config)
    }
}

/// Values given on the command line
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub resource_group: Option<String>,
    pub region: Option<String>,
    pub operating_system: Option<String>,
}

/// Resolved settings for one command invocation
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub resource_group: Option<String>,
    pub region: Option<String>,
    pub operating_system: OperatingSystemType,
    pub management_endpoint: Option<String>,
}

impl Settings {
    /// Resolve settings from the process environment and an optional config path
    ///
    /// When `config_path` is None, `ACICTL_CONFIG` is consulted.
    pub fn load(config_path: Option<&Path>, overrides: Overrides) -> Result<Self, ConfigError> {
        let lookup = |key: &str| std::env::var(key).ok();
        let path: Option<PathBuf> = config_path
            .map(Path::to_path_buf)
            .or_else(|| lookup(CONFIG_PATH_ENV).map(PathBuf::from));

        let file = match path {
            Some(p) => {
                debug!(path = %p.display(), "Loading config file");
                FileConfig::load(&p)?
            }
            None => FileConfig::default(),
        };

        Self::resolve(file, lookup, overrides)
    }

    /// Merge the layers; later layers win
    pub fn resolve(
        file: FileConfig,
        lookup: impl Fn(&str) -> Option<String>,
        overrides: Overrides,
    ) -> Result<Self, ConfigError> {
        let env = |key: &str| lookup(key).filter(|v| !v.is_empty());

        let resource_group = overrides
            .resource_group
            .or_else(|| env(RESOURCE_GROUP_ENV))
            .or(file.resource_group);
        let region = overrides
            .region
            .or_else(|| env(REGION_ENV))
            .or(file.region);
        let os = overrides
            .operating_system
            .or_else(|| env(OS_ENV))
            .or(file.operating_system);

        let operating_system = match os {
            Some(os) => os.parse().map_err(ConfigError::UnsupportedOs)?,
            None => OperatingSystemType::default(),
        };

        Ok(Settings {
            resource_group,
            region,
            operating_system,
            management_endpoint: file.management_endpoint,
        })
    }

    pub fn require_resource_group(&self) -> Result<&str, ConfigError> {
        self.resource_group
            .as_deref()
            .ok_or(ConfigError::Missing {
                what: "resource group",
                flag: "--resource-group",
                env: RESOURCE_GROUP_ENV,
            })
    }

    /// Region normalized to ARM form, rejecting unsupported regions
    pub fn require_region(&self) -> Result<String, ConfigError> {
        let region = self.region.as_deref().ok_or(ConfigError::Missing {
            what: "region",
            flag: "--region",
            env: REGION_ENV,
        })?;
        if !is_valid_region(region) {
            return Err(ConfigError::InvalidRegion {
                region: region.to_string(),
            });
        }
        Ok(normalize_region(region))
    }
}
