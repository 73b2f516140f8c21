//! Commands module
//!
//! Defines all CLI commands and their handlers.

mod config;
mod fileset;
mod inventory;

pub use fileset::CreateFilesetArgs;

use anyhow::{Context, Result};
use clap::Subcommand;
use scalemgmt_client::ScaleClient;
use std::path::Path;

use crate::config::Config;

/// Top-level CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Print the effective configuration (password redacted)
    DumpConfig,
    /// Write the default configuration to the config path
    InitConfig {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Check that the management API answers
    ConnectionTest,
    /// List filesystems
    Filesystems,
    /// List the filesets of a filesystem
    Filesets {
        /// Filesystem name
        #[arg(long)]
        filesystem: String,

        /// Include configuration details such as the junction path
        #[arg(long)]
        all_fields: bool,
    },
    /// List quotas of a filesystem, or of one fileset
    Quotas {
        /// Filesystem name
        #[arg(long)]
        filesystem: String,

        /// Only quotas of this fileset
        #[arg(long)]
        fileset: Option<String>,

        /// Server-side filter, e.g. "quotaType=FILESET"
        #[arg(long)]
        filter: Option<String>,
    },
    /// Show the ACL of a path
    Acl {
        /// Filesystem name
        #[arg(long)]
        filesystem: String,

        /// Absolute path below the filesystem mount
        #[arg(long)]
        path: String,
    },
    /// List remote jobs, or show one
    Jobs {
        /// Remote job id
        id: Option<String>,
    },
    /// Create a fileset, then set its quota and ACL
    CreateFileset(CreateFilesetArgs),
}

/// Handle a CLI command
///
/// Routes the command to the appropriate handler module.
///
/// # Arguments
/// * `command` - The command to execute
/// * `config` - The effective configuration
/// * `config_path` - Where the configuration was (or would be) read from
pub async fn handle_command(command: Commands, config: &Config, config_path: &Path) -> Result<()> {
    match command {
        Commands::DumpConfig => config::dump_config(config),
        Commands::InitConfig { force } => config::init_config(config_path, force),
        Commands::ConnectionTest => inventory::connection_test(&connect(config)?).await,
        Commands::Filesystems => inventory::list_filesystems(&connect(config)?).await,
        Commands::Filesets {
            filesystem,
            all_fields,
        } => inventory::list_filesets(&connect(config)?, &filesystem, all_fields).await,
        Commands::Quotas {
            filesystem,
            fileset,
            filter,
        } => {
            let client = connect(config)?;
            inventory::list_quotas(&client, &filesystem, fileset.as_deref(), filter.as_deref()).await
        }
        Commands::Acl { filesystem, path } => {
            inventory::show_acl(&connect(config)?, &filesystem, &path).await
        }
        Commands::Jobs { id } => inventory::show_jobs(&connect(config)?, id.as_deref()).await,
        Commands::CreateFileset(args) => {
            let client = connect(config)?;
            fileset::create_fileset(client, config, args).await
        }
    }
}

/// Validates the configuration and builds an API client from it
fn connect(config: &Config) -> Result<ScaleClient> {
    config.validate()?;
    ScaleClient::new(&config.scaleserver).context("Failed to create API client")
}
