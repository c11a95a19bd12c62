//! Workspace location and state recovered from previous runs.
//!
//! All data lives under `~/.xud-docker/<network>/` unless `HOME_DIR` or
//! `NETWORK_DIR` say otherwise.

use std::path::{Path, PathBuf};

use rand::distributions::Alphanumeric;
use rand::Rng;
use serde_yaml::Value;
use tracing::{debug, info};

use crate::domain::{Network, Workspace};
use crate::error::Result;

/// Environment variable overriding the launcher home directory.
pub const HOME_DIR_ENV: &str = "HOME_DIR";
/// Environment variable overriding the network directory.
pub const NETWORK_DIR_ENV: &str = "NETWORK_DIR";

const BACKUP_MOUNT: &str = ":/root/backup";
const ADMIN_TOKEN_LEN: usize = 20;

/// Returns the default launcher home directory (`~/.xud-docker/`).
#[must_use]
pub fn default_home_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".xud-docker")
}

/// Resolve the workspace of `network`.
///
/// `home_dir` takes precedence over `HOME_DIR`; `NETWORK_DIR` replaces the
/// `<home>/<network>` default.
#[must_use]
pub fn resolve_workspace(network: Network, home_dir: Option<PathBuf>) -> Workspace {
    let home_dir = home_dir
        .or_else(|| env_path(HOME_DIR_ENV))
        .unwrap_or_else(default_home_dir);
    match env_path(NETWORK_DIR_ENV) {
        Some(network_dir) => Workspace::new(network, home_dir, network_dir),
        None => Workspace::under_home(network, home_dir),
    }
}

fn env_path(key: &str) -> Option<PathBuf> {
    std::env::var_os(key)
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
}

/// Create the network directory and its `data/` and `logs/` children.
pub async fn ensure_workspace(workspace: &Workspace) -> Result<()> {
    tokio::fs::create_dir_all(workspace.data_dir()).await?;
    tokio::fs::create_dir_all(workspace.logs_dir()).await?;
    Ok(())
}

/// Backup location mounted by a previously generated compose descriptor.
pub async fn recover_backup_dir(compose_file: &Path) -> Result<Option<PathBuf>> {
    let content = match tokio::fs::read_to_string(compose_file).await {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    let recovered = parse_backup_mount(&content);
    if let Some(dir) = &recovered {
        debug!(path = %dir.display(), "Recovered backup location");
    }
    Ok(recovered)
}

fn parse_backup_mount(descriptor: &str) -> Option<PathBuf> {
    let compose: Value = match serde_yaml::from_str(descriptor) {
        Ok(compose) => compose,
        Err(e) => {
            debug!(error = %e, "Ignoring unreadable compose descriptor");
            return None;
        }
    };
    compose
        .get("services")?
        .as_mapping()?
        .values()
        .filter_map(|service| service.get("volumes")?.as_sequence())
        .flatten()
        .filter_map(Value::as_str)
        .find_map(|volume| volume.strip_suffix(BACKUP_MOUNT))
        // Older descriptors doubled the colon before the mount target.
        .map(|dir| PathBuf::from(dir.trim_end_matches(':')))
        .filter(|dir| !dir.as_os_str().is_empty())
}

/// Payment hub admin token stored at `path`, created on first use.
pub async fn load_or_create_admin_token(path: &Path) -> Result<String> {
    match tokio::fs::read_to_string(path).await {
        Ok(token) if !token.trim().is_empty() => return Ok(token.trim().to_string()),
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(e.into()),
    }

    let token: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(ADMIN_TOKEN_LEN)
        .map(char::from)
        .collect();
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, &token).await?;
    info!(path = %path.display(), "Created payment hub admin token");
    Ok(token)
}

/// `EXTERNAL_IP` from a legacy `lnd.env` file.
pub async fn recover_external_ip(legacy_env: &Path) -> Result<Option<String>> {
    let content = match tokio::fs::read_to_string(legacy_env).await {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    Ok(content.lines().find_map(|line| {
        let (key, value) = line.split_once('=')?;
        let value = value.trim();
        (key.trim() == "EXTERNAL_IP" && !value.is_empty() && !value.contains('='))
            .then(|| value.to_string())
    }))
}
