//! scalectl
//!
//! Command-line interface for the Scale management API: inventory queries
//! and a dependency-ordered fileset provisioning workflow driven by the
//! job scheduler.

mod commands;
mod config;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, handle_command};
use config::{Config, ConfigOverrides, DEFAULT_CONFIG_PATH};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "scalectl")]
#[command(about = "Scale management API tools", long_about = None)]
struct Cli {
    /// JSON or YAML config file (default: scalectl.json, skipped if missing)
    #[arg(short, long, env = "SCALE_CONFIG", global = true)]
    config: Option<PathBuf>,

    #[command(flatten)]
    overrides: ConfigOverrides,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so command output stays pipeable
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "scalectl=info,scalemgmt_scheduler=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));
    let mut config = Config::load(&config_path, cli.config.is_some())?;
    config.apply(&cli.overrides);

    handle_command(cli.command, &config, &config_path).await
}
