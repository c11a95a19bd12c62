//! Composition root: resolves configuration and the workspace, then wires
//! the coordinator to the docker-backed adapters.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, info};

use super::config::settings::{Config, NETWORK_ENV};
use super::paths::{
    ensure_workspace, load_or_create_admin_token, recover_backup_dir, recover_external_ip,
    resolve_workspace,
};
use crate::adapter::outbound::{DockerCli, DockerCompose, HttpWalletApi};
use crate::application::{Coordinator, CoordinatorDeps, Poller};
use crate::domain::{Network, Workspace};
use crate::error::Result;

/// Settings given on the command line. Each one wins over its file and
/// environment counterparts.
#[derive(Debug, Clone, Default)]
pub struct LaunchOptions {
    pub network: Option<String>,
    pub home_dir: Option<PathBuf>,
    /// Explicit configuration file; it must exist.
    pub config_file: Option<PathBuf>,
    pub log_level: Option<String>,
    pub json_logs: bool,
}

/// Effective configuration plus the workspace it applies to.
#[derive(Debug, Clone)]
pub struct Launch {
    pub config: Config,
    pub workspace: Workspace,
}

impl Launch {
    /// Resolve configuration: flag, then `NETWORK`, then file, then mainnet.
    ///
    /// Without `--config` the file is looked up in the network directory of
    /// the network named by the flag or environment.
    pub fn load(options: &LaunchOptions) -> Result<Self> {
        let config = match &options.config_file {
            Some(path) => Config::load(path)?,
            None => {
                let locate = locating_network(options)?;
                let path = resolve_workspace(locate, options.home_dir.clone()).config_file();
                debug!(path = %path.display(), "Looking for configuration");
                Config::load_optional(path)?
            }
        };

        let mut config = config.with_network_override(options.network.as_deref())?;
        if let Some(level) = &options.log_level {
            config.logging.level.clone_from(level);
        }
        if options.json_logs {
            config.logging.format = "json".to_string();
        }

        let workspace = resolve_workspace(config.network(), options.home_dir.clone());
        Ok(Self { config, workspace })
    }

    /// Prepare the workspace, recover state from earlier runs and build the
    /// coordinator.
    pub async fn coordinator(self, shutdown: watch::Receiver<bool>) -> Result<Coordinator> {
        let Self { mut config, workspace } = self;
        ensure_workspace(&workspace).await?;

        let connext = &mut config.services.connext;
        if connext.admin_token.is_none() {
            let path = workspace.connext_admin_token();
            connext.admin_token = Some(load_or_create_admin_token(&path).await?);
        }

        let backup_dir = recover_backup_dir(&workspace.compose_file()).await?;
        let external_ip = match config.external_ip.clone() {
            Some(ip) => Some(ip),
            None => recover_external_ip(&workspace.legacy_lnd_env()).await?,
        };
        info!(
            network = %workspace.network(),
            dir = %workspace.network_dir().display(),
            "Workspace ready"
        );

        let deps = CoordinatorDeps {
            compose: Arc::new(DockerCompose::new(&workspace)),
            workspace,
            config: config.services.clone(),
            backup_dir,
            external_ip,
            runtime: Arc::new(DockerCli::default()),
            wallet: Arc::new(HttpWalletApi::new()?),
            poller: Poller::new(config.poll_interval(), shutdown),
        };
        Coordinator::new(deps)
    }
}

fn locating_network(options: &LaunchOptions) -> Result<Network> {
    let named = options
        .network
        .clone()
        .or_else(|| std::env::var(NETWORK_ENV).ok())
        .filter(|value| !value.trim().is_empty());
    match named {
        Some(value) => Ok(value.parse()?),
        None => Ok(Network::default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flag_selects_network_and_workspace() {
        let home = tempfile::tempdir().unwrap();
        let options = LaunchOptions {
            network: Some("simnet".into()),
            home_dir: Some(home.path().to_path_buf()),
            ..LaunchOptions::default()
        };

        let launch = Launch::load(&options).unwrap();
        assert_eq!(launch.config.network(), Network::Simnet);
        assert_eq!(launch.workspace.network_dir(), home.path().join("simnet"));
    }

    #[test]
    fn explicit_config_file_must_exist() {
        let home = tempfile::tempdir().unwrap();
        let options = LaunchOptions {
            network: Some("testnet".into()),
            config_file: Some(home.path().join("missing.toml")),
            ..LaunchOptions::default()
        };
        assert!(Launch::load(&options).is_err());
    }

    #[test]
    fn flags_override_file_logging() {
        let home = tempfile::tempdir().unwrap();
        let path = home.path().join("launcher.toml");
        std::fs::write(&path, "network = \"testnet\"\n[logging]\nlevel = \"warn\"\n").unwrap();
        let options = LaunchOptions {
            network: Some("testnet".into()),
            home_dir: Some(home.path().to_path_buf()),
            config_file: Some(path),
            log_level: Some("debug".into()),
            json_logs: true,
        };

        let launch = Launch::load(&options).unwrap();
        assert_eq!(launch.config.logging.level, "debug");
        assert!(launch.config.logging.is_json());
        assert_eq!(launch.workspace.network(), Network::Testnet);
    }

    #[tokio::test]
    async fn coordinator_recovers_previous_backup_location() {
        let home = tempfile::tempdir().unwrap();
        let options = LaunchOptions {
            network: Some("simnet".into()),
            home_dir: Some(home.path().to_path_buf()),
            ..LaunchOptions::default()
        };
        let launch = Launch::load(&options).unwrap();
        std::fs::create_dir_all(launch.workspace.network_dir()).unwrap();
        std::fs::write(
            launch.workspace.compose_file(),
            "services:\n  xud:\n    volumes:\n      - /mnt/usb/xud-backup:/root/backup\n",
        )
        .unwrap();

        let (_tx, rx) = watch::channel(false);
        let coordinator = launch.coordinator(rx).await.unwrap();
        assert_eq!(coordinator.backup_dir(), std::path::Path::new("/mnt/usb/xud-backup"));
        assert!(coordinator.workspace().logs_dir().is_dir());
    }

    #[tokio::test]
    async fn separate_launches_generate_identical_descriptors() {
        let home = tempfile::tempdir().unwrap();
        let options = LaunchOptions {
            network: Some("simnet".into()),
            home_dir: Some(home.path().to_path_buf()),
            ..LaunchOptions::default()
        };
        let (_tx, rx) = watch::channel(false);

        let mut first = Launch::load(&options).unwrap().coordinator(rx.clone()).await.unwrap();
        first.gen().await.unwrap();
        let compose_file = first.workspace().compose_file();
        let before = std::fs::read_to_string(&compose_file).unwrap();
        assert!(first.workspace().connext_admin_token().is_file());

        let mut second = Launch::load(&options).unwrap().coordinator(rx).await.unwrap();
        second.gen().await.unwrap();
        assert_eq!(std::fs::read_to_string(&compose_file).unwrap(), before);
    }
}
