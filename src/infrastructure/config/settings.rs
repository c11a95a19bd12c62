//! Launcher configuration loading and validation.
//!
//! The optional `launcher.toml` in the network directory holds per-service
//! tables under `[services.<name>]`. The `NETWORK` environment variable
//! overrides the file's network, and command-line flags override both.
//!
//! # Example
//!
//! ```no_run
//! use xud_launcher::infrastructure::config::settings::Config;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load_optional("launcher.toml")?;
//!     config.init_logging();
//!     Ok(())
//! }
//! ```

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use super::logging::LoggingConfig;
use super::services::ServicesConfig;
use crate::domain::Network;
use crate::error::{ConfigError, Result};

/// Environment variable selecting the network profile.
pub const NETWORK_ENV: &str = "NETWORK";

fn default_poll_interval_secs() -> u64 {
    3
}

/// Main launcher configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Config {
    /// Network profile. Defaults to mainnet.
    #[serde(default)]
    pub network: Option<Network>,

    /// Address advertised to channel peers.
    #[serde(default)]
    pub external_ip: Option<String>,

    /// Seconds between readiness probes.
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub services: ServicesConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            network: None,
            external_ip: None,
            poll_interval_secs: default_poll_interval_secs(),
            logging: LoggingConfig::default(),
            services: ServicesConfig::default(),
        }
    }
}

impl Config {
    /// Parse configuration from TOML content, applying the `NETWORK`
    /// environment override.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is malformed, `NETWORK` names an unknown
    /// profile or validation fails.
    pub fn parse_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).map_err(ConfigError::Parse)?;
        let config = config.with_network_override(std::env::var(NETWORK_ENV).ok().as_deref())?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadFile)?;
        Self::parse_toml(&content)
    }

    /// Load configuration from a TOML file, or defaults when it is absent.
    pub fn load_optional<P: AsRef<Path>>(path: P) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(content) => Self::parse_toml(&content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Self::parse_toml(""),
            Err(e) => Err(ConfigError::ReadFile(e).into()),
        }
    }

    /// Replace the network with `value` when present.
    pub fn with_network_override(mut self, value: Option<&str>) -> Result<Self> {
        if let Some(value) = value.filter(|v| !v.trim().is_empty()) {
            self.network = Some(value.parse()?);
        }
        Ok(self)
    }

    fn validate(&self) -> Result<()> {
        if self.poll_interval_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "poll_interval_secs",
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }
        if !matches!(self.logging.format.as_str(), "pretty" | "json") {
            return Err(ConfigError::InvalidValue {
                field: "logging.format",
                reason: format!("expected pretty or json, got {}", self.logging.format),
            }
            .into());
        }
        Ok(())
    }

    /// Effective network profile.
    #[must_use]
    pub fn network(&self) -> Network {
        self.network.unwrap_or_default()
    }

    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    /// Initialize logging based on configuration.
    pub fn init_logging(&self) {
        self.logging.init();
    }
}
