use acictl::aci::region::normalize_region;
use acictl::aci::{AciClient, AzureCredentials};
use acictl::commands::{self, NameMatch, RetryPolicy};
use acictl::config::{Overrides, Settings, DEFAULT_CONVERT_REGION};
use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::debug;

#[derive(Debug, Parser)]
#[command(name = "acictl")]
#[command(about = "Run Kubernetes Deployments on Azure Container Instances")]
#[command(version)]
struct Cli {
    /// Path to a TOML config file (defaults to $ACICTL_CONFIG)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Print the ARM template for a Deployment manifest
    Convert {
        /// Deployment manifest (YAML)
        file: PathBuf,
        /// Azure region for the container group
        #[arg(long)]
        region: Option<String>,
        /// Container OS: Linux or Windows
        #[arg(long)]
        os: Option<String>,
    },
    /// Create one container group per Deployment replica
    Create {
        /// Deployment manifest (YAML)
        file: PathBuf,
        #[arg(short = 'g', long)]
        resource_group: Option<String>,
        #[arg(long)]
        region: Option<String>,
        /// Container OS: Linux or Windows
        #[arg(long)]
        os: Option<String>,
    },
    /// Delete the container groups created for a Deployment
    Delete {
        /// Deployment manifest (YAML)
        file: PathBuf,
        #[arg(short = 'g', long)]
        resource_group: Option<String>,
        /// Only match `<deployment>` and `<deployment>-<suffix>` names
        #[arg(long)]
        strict: bool,
    },
    /// List container groups in a resource group
    List {
        #[arg(short = 'g', long)]
        resource_group: Option<String>,
        /// Only show groups belonging to this Deployment manifest
        #[arg(short, long)]
        file: Option<PathBuf>,
        /// Only match `<deployment>` and `<deployment>-<suffix>` names
        #[arg(long, requires = "file")]
        strict: bool,
    },
    /// Print the logs of a container
    Logs {
        /// Container group name
        group: String,
        /// Container name within the group
        container: String,
        #[arg(short = 'g', long)]
        resource_group: Option<String>,
        /// Only the last N lines
        #[arg(long)]
        tail: Option<u32>,
    },
}

impl Commands {
    fn overrides(&self) -> Overrides {
        match self {
            Commands::Convert { region, os, .. } => Overrides {
                resource_group: None,
                region: region.clone(),
                operating_system: os.clone(),
            },
            Commands::Create {
                resource_group,
                region,
                os,
                ..
            } => Overrides {
                resource_group: resource_group.clone(),
                region: region.clone(),
                operating_system: os.clone(),
            },
            Commands::Delete { resource_group, .. }
            | Commands::List { resource_group, .. }
            | Commands::Logs { resource_group, .. } => Overrides {
                resource_group: resource_group.clone(),
                ..Default::default()
            },
        }
    }
}

fn name_match(strict: bool) -> NameMatch {
    if strict {
        NameMatch::Strict
    } else {
        NameMatch::Contains
    }
}

/// ACI client from the Azure credentials in the environment
fn aci_client(settings: &Settings) -> anyhow::Result<AciClient> {
    let credentials =
        AzureCredentials::from_env().context("failed to load Azure credentials")?;
    debug!(subscription = %credentials.subscription_id, "Loaded Azure credentials");
    Ok(AciClient::new(
        credentials,
        settings.management_endpoint.as_deref(),
    )?)
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let settings = Settings::load(cli.config.as_deref(), cli.command.overrides())?;
    let os_type = settings.operating_system;

    match &cli.command {
        Commands::Convert { file, .. } => {
            let region = normalize_region(
                settings
                    .region
                    .as_deref()
                    .unwrap_or(DEFAULT_CONVERT_REGION),
            );
            let template = commands::convert(file, &region, os_type)?;
            println!("{}", template);
        }
        Commands::Create { file, .. } => {
            let resource_group = settings.require_resource_group()?;
            let region = settings.require_region()?;
            let client = aci_client(&settings)?;

            let created =
                commands::create(&client, file, resource_group, &region, os_type).await?;
            for name in created {
                println!("{}", name);
            }
        }
        Commands::Delete { file, strict, .. } => {
            let resource_group = settings.require_resource_group()?;
            let client = aci_client(&settings)?;

            let deleted = commands::delete(&client, file, resource_group, name_match(*strict)).await?;
            for name in deleted {
                println!("{}", name);
            }
        }
        Commands::List { file, strict, .. } => {
            let resource_group = settings.require_resource_group()?;
            let client = aci_client(&settings)?;

            let groups = commands::list(
                &client,
                resource_group,
                file.as_deref(),
                name_match(*strict),
            )
            .await?;
            for group in &groups {
                println!("{}", commands::format_group_row(group));
            }
        }
        Commands::Logs {
            group,
            container,
            tail,
            ..
        } => {
            let resource_group = settings.require_resource_group()?;
            let client = aci_client(&settings)?;

            let logs = commands::logs(
                &client,
                resource_group,
                group,
                container,
                *tail,
                RetryPolicy::default(),
            )
            .await?;
            print!("{}", logs);
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr; stdout is reserved for command output
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    debug!(command = ?cli.command, "Parsed command line");

    run(cli).await
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[path = "main_test.rs"]
mod tests;
