use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use tracing::trace;

/// Connection parameters for the InfluxDB store
#[derive(Debug, Clone, serde::Deserialize)]
pub struct InfluxConfig {
    pub host: String,
    pub port: u16,
    pub login: String,
    pub password: String,
    pub database: String,

    /// Value of the `location` tag on every point
    pub location: String,

    /// Use HTTPS (default: true)
    #[serde(default = "default_ssl")]
    pub ssl: bool,

    /// Reject invalid or self-signed certificates (default: true)
    #[serde(default = "default_verify_ssl")]
    pub verify_ssl: bool,

    /// Request timeout in seconds (default: 60)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// Host name → target address, fixed for the lifetime of the process
pub type HostTable = BTreeMap<String, String>;

#[derive(Debug, Clone, serde::Deserialize)]
pub struct Config {
    pub influx: InfluxConfig,

    pub hosts: HostTable,

    /// Minutes between probe rounds, fractions allowed
    pub ping_frequency: f64,
}

impl Config {
    /// Delay between the start of two probe rounds
    pub fn loop_delay(&self) -> Duration {
        Duration::try_from_secs_f64(self.ping_frequency * 60.0).unwrap_or(Duration::MAX)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.hosts.is_empty() {
            anyhow::bail!("no hosts configured");
        }

        for (name, address) in &self.hosts {
            if name.trim().is_empty() {
                anyhow::bail!("host with address '{address}' has an empty name");
            }
            if address.trim().is_empty() {
                anyhow::bail!("host '{name}' has an empty address");
            }
        }

        let frequency = self.ping_frequency;
        if !frequency.is_finite() || frequency <= 0.0 {
            anyhow::bail!("ping_frequency must be a positive number of minutes, got {frequency}");
        }
        if Duration::try_from_secs_f64(frequency * 60.0).is_err() {
            anyhow::bail!("ping_frequency of {frequency} minutes is too large");
        }

        let influx = &self.influx;
        if influx.host.trim().is_empty() {
            anyhow::bail!("influx.host must not be empty");
        }
        if influx.database.trim().is_empty() {
            anyhow::bail!("influx.database must not be empty");
        }
        if influx.location.trim().is_empty() {
            anyhow::bail!("influx.location must not be empty");
        }

        Ok(())
    }
}

fn default_ssl() -> bool {
    true
}

fn default_verify_ssl() -> bool {
    true
}

fn default_timeout_secs() -> u64 {
    60
}

pub fn parse_config(content: &str) -> anyhow::Result<Config> {
    let config: Config =
        serde_json::from_str(content).context("invalid configuration file provided")?;
    config.validate()?;
    trace!("loaded config: {:?}", config.hosts);
    Ok(config)
}

pub fn read_config_file(path: impl AsRef<Path>) -> anyhow::Result<Config> {
    let path = path.as_ref();
    if !path.is_file() {
        anyhow::bail!("config file '{}' does not exist", path.display());
    }

    let file_content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file '{}'", path.display()))?;
    parse_config(&file_content).with_context(|| format!("in config file '{}'", path.display()))
}
