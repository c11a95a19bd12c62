//! Network-scoped working directory layout.

use std::path::{Path, PathBuf};

use super::Network;

/// File names inside the network directory.
pub const COMPOSE_FILE: &str = "docker-compose.yml";
pub const CONFIG_FILE: &str = "launcher.toml";
pub const DEFAULT_PASSWORD_MARKER: &str = ".default-password";

/// Paths the launcher reads and writes for one network.
///
/// The core never interprets the per-service data directories; it only
/// mounts them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workspace {
    network: Network,
    home_dir: PathBuf,
    network_dir: PathBuf,
}

impl Workspace {
    #[must_use]
    pub fn new(network: Network, home_dir: PathBuf, network_dir: PathBuf) -> Self {
        Self {
            network,
            home_dir,
            network_dir,
        }
    }

    /// Layout with the network directory at `<home>/<network>`.
    #[must_use]
    pub fn under_home(network: Network, home_dir: PathBuf) -> Self {
        let network_dir = home_dir.join(network.as_str());
        Self::new(network, home_dir, network_dir)
    }

    #[must_use]
    pub const fn network(&self) -> Network {
        self.network
    }

    #[must_use]
    pub fn home_dir(&self) -> &Path {
        &self.home_dir
    }

    #[must_use]
    pub fn network_dir(&self) -> &Path {
        &self.network_dir
    }

    #[must_use]
    pub fn compose_file(&self) -> PathBuf {
        self.network_dir.join(COMPOSE_FILE)
    }

    #[must_use]
    pub fn config_file(&self) -> PathBuf {
        self.network_dir.join(CONFIG_FILE)
    }

    #[must_use]
    pub fn data_dir(&self) -> PathBuf {
        self.network_dir.join("data")
    }

    /// JSON inventory consumed by the gateway.
    #[must_use]
    pub fn inventory_file(&self) -> PathBuf {
        self.data_dir().join("config.json")
    }

    #[must_use]
    pub fn logs_dir(&self) -> PathBuf {
        self.network_dir.join("logs")
    }

    /// Progress log of the last bring-up.
    #[must_use]
    pub fn setup_log(&self) -> PathBuf {
        self.logs_dir().join(format!("{}.log", self.network))
    }

    #[must_use]
    pub fn default_backup_dir(&self) -> PathBuf {
        self.network_dir.join("backup")
    }

    /// Admin token handed to the payment hub, kept across runs.
    #[must_use]
    pub fn connext_admin_token(&self) -> PathBuf {
        self.data_dir().join("connext").join("admin-token")
    }

    /// Exists while the wallets are protected by the default password.
    #[must_use]
    pub fn default_password_marker(&self) -> PathBuf {
        self.network_dir.join(DEFAULT_PASSWORD_MARKER)
    }

    /// Legacy environment file that may carry the external IP.
    #[must_use]
    pub fn legacy_lnd_env(&self) -> PathBuf {
        self.network_dir.join("lnd.env")
    }

    /// Compose project network: `<network>_default`.
    #[must_use]
    pub fn docker_network(&self) -> String {
        format!("{}_default", self.network)
    }
}
