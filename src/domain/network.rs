//! Network profiles.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Network profile selected once at startup.
///
/// Determines which services exist, their images and their port layout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    /// Simulation network with hosted chain backends.
    Simnet,
    /// Public test networks.
    Testnet,
    /// Production.
    #[default]
    Mainnet,
}

impl Network {
    /// Lowercase network name used in paths, container names and artifacts.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Simnet => "simnet",
            Self::Testnet => "testnet",
            Self::Mainnet => "mainnet",
        }
    }

    /// Pick one of three per-network values.
    #[must_use]
    pub fn pick<T>(self, simnet: T, testnet: T, mainnet: T) -> T {
        match self {
            Self::Simnet => simnet,
            Self::Testnet => testnet,
            Self::Mainnet => mainnet,
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Network {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "simnet" => Ok(Self::Simnet),
            "testnet" => Ok(Self::Testnet),
            "mainnet" => Ok(Self::Mainnet),
            other => Err(ConfigError::UnknownNetwork(other.to_string())),
        }
    }
}
