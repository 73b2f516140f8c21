//! CLI configuration
//!
//! Settings are layered: built-in defaults, then the config file, then
//! command-line flags and `SCALE_*` environment variables. The config file is
//! YAML when its extension is `.yaml` or `.yml` and JSON otherwise.

use anyhow::{Context, Result};
use clap::Args;
use scalemgmt_client::ConnectionSettings;
use scalemgmt_scheduler::SchedulerConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Config file read when `--config` is not given
pub const DEFAULT_CONFIG_PATH: &str = "scalectl.json";

const REDACTED: &str = "********";

/// Effective CLI configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Management API server connection
    pub scaleserver: ConnectionSettings,

    /// Simulate submissions instead of sending write requests
    pub dry_run: bool,

    /// Seconds between scheduler ticks while jobs are running
    pub poll_interval_secs: u64,

    /// Stop waiting for jobs after this many ticks
    pub max_ticks: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            scaleserver: ConnectionSettings::default(),
            dry_run: false,
            poll_interval_secs: 5,
            max_ticks: None,
        }
    }
}

/// Command-line and environment overrides, applied on top of the config file
#[derive(Debug, Default, Clone, Args)]
pub struct ConfigOverrides {
    /// Hostname of the management API server
    #[arg(short = 's', long, env = "SCALE_HOST", global = true)]
    pub host: Option<String>,

    /// User to authenticate as
    #[arg(short, long, env = "SCALE_USER", global = true)]
    pub user: Option<String>,

    /// Password to authenticate with
    #[arg(short, long, env = "SCALE_PASSWORD", hide_env_values = true, global = true)]
    pub password: Option<String>,

    /// Port of the management API server
    #[arg(long, env = "SCALE_PORT", global = true)]
    pub port: Option<u16>,

    /// API version, e.g. "v2"
    #[arg(long, env = "SCALE_API_VERSION", global = true)]
    pub api_version: Option<String>,

    /// Verify the server's TLS certificate (true/false)
    #[arg(long, env = "SCALE_VERIFY_SSL", global = true)]
    pub verify_ssl: Option<bool>,

    /// PEM bundle of CA certificates to trust for the server
    #[arg(long, env = "SCALE_CA_BUNDLE", global = true)]
    pub ca_bundle: Option<PathBuf>,

    /// Simulate write requests instead of sending them
    #[arg(short, long, env = "SCALE_DRY_RUN", global = true)]
    pub dry_run: bool,

    /// Seconds between scheduler ticks
    #[arg(long, env = "SCALE_POLL_INTERVAL", global = true)]
    pub poll_interval: Option<u64>,

    /// Give up waiting for jobs after this many ticks
    #[arg(long, env = "SCALE_MAX_TICKS", global = true)]
    pub max_ticks: Option<u64>,
}

impl Config {
    /// Loads the config file at `path` on top of the defaults
    ///
    /// A missing file yields the defaults unless `required` is set, which is
    /// the case when the path was given explicitly.
    pub fn load(path: &Path, required: bool) -> Result<Self> {
        if !path.exists() {
            if required {
                anyhow::bail!("Config file {} does not exist", path.display());
            }
            tracing::debug!("No config file at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config = if is_yaml(path) {
            Self::from_yaml(&content)
        } else {
            Self::from_json(&content)
        };
        config.with_context(|| format!("Invalid config file {}", path.display()))
    }

    pub fn from_json(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Applies command-line and environment overrides
    pub fn apply(&mut self, overrides: &ConfigOverrides) {
        let server = &mut self.scaleserver;
        if let Some(host) = &overrides.host {
            server.host = host.clone();
        }
        if let Some(user) = &overrides.user {
            server.username = user.clone();
        }
        if let Some(password) = &overrides.password {
            server.password = Some(password.clone());
        }
        if let Some(port) = overrides.port {
            server.port = port;
        }
        if let Some(version) = &overrides.api_version {
            server.version = version.clone();
        }
        if let Some(verify_ssl) = overrides.verify_ssl {
            server.verify_ssl = verify_ssl;
        }
        if let Some(ca_bundle) = &overrides.ca_bundle {
            server.ca_bundle = Some(ca_bundle.clone());
        }
        if overrides.dry_run {
            self.dry_run = true;
        }
        if let Some(secs) = overrides.poll_interval {
            self.poll_interval_secs = secs;
        }
        if let Some(max_ticks) = overrides.max_ticks {
            self.max_ticks = Some(max_ticks);
        }
    }

    /// Validates the configuration
    pub fn validate(&self) -> Result<()> {
        let server = &self.scaleserver;

        if server.host.trim().is_empty() {
            anyhow::bail!("scaleserver.host cannot be empty");
        }

        if server.username.trim().is_empty() {
            anyhow::bail!("scaleserver.username cannot be empty");
        }

        if server.port == 0 {
            anyhow::bail!("scaleserver.port must be greater than 0");
        }

        if server.protocol != "http" && server.protocol != "https" {
            anyhow::bail!("scaleserver.protocol must be http or https");
        }

        if server.version.trim().is_empty() {
            anyhow::bail!("scaleserver.version cannot be empty");
        }

        if self.poll_interval_secs == 0 {
            anyhow::bail!("poll_interval_secs must be greater than 0");
        }

        if self.max_ticks == Some(0) {
            anyhow::bail!("max_ticks must be greater than 0");
        }

        Ok(())
    }

    pub fn scheduler_config(&self) -> SchedulerConfig {
        SchedulerConfig {
            tick_interval: Duration::from_secs(self.poll_interval_secs),
            max_ticks: self.max_ticks,
        }
    }

    /// Copy that is safe to print
    pub fn redacted(&self) -> Self {
        let mut config = self.clone();
        if config.scaleserver.password.is_some() {
            config.scaleserver.password = Some(REDACTED.to_string());
        }
        config
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Writes the configuration to `path`, as YAML for a YAML path
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = if is_yaml(path) {
            serde_yaml::to_string(self)?
        } else {
            self.to_json()? + "\n"
        };
        fs::write(path, content)
            .with_context(|| format!("Failed to write config file {}", path.display()))
    }
}

fn is_yaml(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|ext| ext.to_str()),
        Some("yaml" | "yml")
    )
}
