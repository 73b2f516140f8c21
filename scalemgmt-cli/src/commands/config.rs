//! Config command handlers

use anyhow::Result;
use colored::*;
use std::path::Path;

use crate::config::Config;

/// Print the effective configuration as JSON
pub fn dump_config(config: &Config) -> Result<()> {
    println!("{}", config.redacted().to_json()?);
    Ok(())
}

/// Write the default configuration file
pub fn init_config(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        anyhow::bail!(
            "{} already exists, use --force to overwrite it",
            path.display()
        );
    }

    Config::default().save(path)?;

    println!(
        "{}",
        format!("✓ Wrote default configuration to {}", path.display())
            .green()
            .bold()
    );
    println!(
        "  Edit {} and {} before running other commands",
        "scaleserver.host".cyan(),
        "scaleserver.username".cyan()
    );
    Ok(())
}
