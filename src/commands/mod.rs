//! CLI command implementations
//!
//! Each command runs the load → map → act pipeline against an `AciApi`, so
//! the same code drives the real ARM client and the in-memory test double.

pub mod convert;
pub mod create;
pub mod delete;
pub mod list;
pub mod logs;

pub use convert::convert;
pub use create::create;
pub use delete::{delete, NameMatch};
pub use list::{format_group_row, list};
pub use logs::{logs, RetryPolicy};

use crate::aci::AciError;
use crate::config::ConfigError;
use crate::convert::MapError;
use crate::manifest::ManifestError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CommandError {
    #[error("parse deployment error: {0}")]
    Manifest(#[from] ManifestError),

    #[error("conversion error: {0}")]
    Map(#[from] MapError),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("container group {operation} error: {source}")]
    Aci {
        operation: &'static str,
        #[source]
        source: AciError,
    },

    #[error("failed to render template: {0}")]
    Render(#[from] serde_json::Error),
}

impl CommandError {
    pub(crate) fn aci(operation: &'static str) -> impl FnOnce(AciError) -> CommandError {
        move |source| CommandError::Aci { operation, source }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[path = "commands_test.rs"]
mod tests;
