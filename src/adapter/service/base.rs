//! Composition helper shared by every service adapter.
//!
//! Each adapter embeds a [`ServiceBase`] and calls it explicitly for the
//! common parts of `apply` and for the coarse container state.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpStream;
use tracing::debug;

use crate::domain::{Network, ServiceDescriptor, ServiceKind, Status};
use crate::error::{Error, Result, ServiceError};
use crate::infrastructure::config::services::CommonConfig;
use crate::port::outbound::{ContainerRuntime, ContainerState};
use crate::port::ApplyContext;

/// Timeout of port-connect probes.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(3);

/// Coarse container state, split on whether a fine probe should run.
#[derive(Debug, Clone, PartialEq)]
pub enum Coarse {
    Running(ContainerState),
    Stopped(Status),
}

/// State and behavior common to all service kinds.
pub struct ServiceBase {
    runtime: Arc<dyn ContainerRuntime>,
    descriptor: ServiceDescriptor,
    network: Network,
    container: String,
    data_dir: PathBuf,
}

impl ServiceBase {
    #[must_use]
    pub fn new(
        name: &str,
        kind: ServiceKind,
        network: Network,
        runtime: Arc<dyn ContainerRuntime>,
    ) -> Self {
        Self {
            runtime,
            descriptor: ServiceDescriptor::new(name, kind),
            network,
            container: format!("{network}_{name}_1"),
            data_dir: PathBuf::new(),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.descriptor.name
    }

    #[must_use]
    pub const fn network(&self) -> Network {
        self.network
    }

    #[must_use]
    pub fn container(&self) -> &str {
        &self.container
    }

    #[must_use]
    pub const fn descriptor(&self) -> &ServiceDescriptor {
        &self.descriptor
    }

    pub fn descriptor_mut(&mut self) -> &mut ServiceDescriptor {
        &mut self.descriptor
    }

    #[must_use]
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    #[must_use]
    pub fn runtime(&self) -> &Arc<dyn ContainerRuntime> {
        &self.runtime
    }

    /// Reset the descriptor and lower the options every kind shares.
    pub fn apply_common(
        &mut self,
        common: &CommonConfig,
        default_image: &str,
        disabled_by_default: bool,
        ctx: &ApplyContext<'_>,
    ) {
        let name = self.descriptor.name.clone();
        self.data_dir = common
            .dir
            .clone()
            .unwrap_or_else(|| ctx.default_data_dir(&name));

        let descriptor = &mut self.descriptor;
        descriptor.reset();
        descriptor.image = common
            .image
            .clone()
            .unwrap_or_else(|| default_image.to_string());
        descriptor.hostname = Some(name);
        descriptor.ports = common.expose_ports.clone();
        descriptor.disabled = common.disabled.unwrap_or(disabled_by_default);
        descriptor.set_env("NETWORK", ctx.network.as_str());
    }

    /// Mount this service's data directory at `target`.
    pub fn mount_data_dir(&mut self, target: &str) {
        let volume = format!("{}:{target}", self.data_dir.display());
        self.descriptor.volumes.push(volume);
    }

    /// Query the runtime for the coarse container state.
    pub async fn coarse(&self) -> Result<Coarse> {
        match self.runtime.inspect(&self.container).await? {
            None => Ok(Coarse::Stopped(Status::ContainerMissing)),
            Some(state) if state.is_running() => Ok(Coarse::Running(state)),
            Some(state) => Ok(Coarse::Stopped(Status::from_container_state(&state.status))),
        }
    }

    /// Coarse state with `running` mapped to `Ready`.
    pub async fn running_is_ready(&self) -> Result<Status> {
        match self.coarse().await? {
            Coarse::Running(_) => Ok(Status::Ready),
            Coarse::Stopped(status) => Ok(status),
        }
    }

    pub async fn exec(&self, command: &[&str]) -> Result<String> {
        self.runtime.exec(&self.container, command).await
    }

    /// Log lines written since the container last started.
    pub async fn logs_since(&self, state: &ContainerState) -> Result<Vec<String>> {
        let since = (!state.started_at.is_empty()).then_some(state.started_at.as_str());
        self.runtime.logs(&self.container, since, None).await
    }

    /// Fatal probe error attributed to this service.
    #[must_use]
    pub fn probe_fatal(&self, message: impl Into<String>) -> Error {
        ServiceError::ProbeFatal {
            service: self.name().to_string(),
            message: message.into(),
        }
        .into()
    }
}

/// True when a TCP connection to `addr` succeeds within [`CONNECT_TIMEOUT`].
pub async fn can_connect(addr: &str) -> bool {
    match tokio::time::timeout(CONNECT_TIMEOUT, TcpStream::connect(addr)).await {
        Ok(Ok(_)) => true,
        Ok(Err(e)) => {
            debug!(addr, error = %e, "Connect probe failed");
            false
        }
        Err(_) => {
            debug!(addr, "Connect probe timed out");
            false
        }
    }
}

/// Default image of a service: `exchangeunion/<name>:<tag>` where mainnet
/// pins `mainnet_tag` and other networks track `latest`.
#[must_use]
pub fn default_image(network: Network, repository: &str, mainnet_tag: &str) -> String {
    let tag = match network {
        Network::Mainnet => mainnet_tag,
        Network::Simnet | Network::Testnet => "latest",
    };
    format!("exchangeunion/{repository}:{tag}")
}
