//! Bring-up and tear-down coordinator.
//!
//! Owns the service registry for the process lifetime. Bring-up sequences the
//! dependent groups and fans out the independent layer-2 group with
//! cancel-on-first-error; tear-down runs in a reverse-biased order and is not
//! cancellable. The coordinator is also the control-channel handler, so a
//! backup relocation re-enters `apply` serially.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use futures_util::future::join_all;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

use super::artifact::write_artifacts;
use super::bootstrap::WalletBootstrap;
use super::control::InfoSnapshot;
use super::poller::{accept, Poller, StatusHook};
use crate::adapter::service::{ApplyInputs, Service, ServiceRegistry};
use crate::domain::{GatewayRpc, Network, RpcDescriptor, Status, Workspace};
use crate::error::{Error, Phase, PhaseExt, Result, ServiceError};
use crate::infrastructure::config::services::ServicesConfig;
use crate::port::inbound::{ControlHandler, ControlRequest, ControlResponse};
use crate::port::outbound::{ComposeEngine, ContainerRuntime, LogFollow, WalletApi};
use crate::port::ResolvedServices;

const PROXY: &str = "proxy";
const LNDBTC: &str = "lndbtc";
const LNDLTC: &str = "lndltc";
const CONNEXT: &str = "connext";
const XUD: &str = "xud";
const BOLTZ: &str = "boltz";

/// Collaborators and settings a [`Coordinator`] is built from.
pub struct CoordinatorDeps {
    pub workspace: Workspace,
    pub config: ServicesConfig,
    /// Backup location recovered from a previous run, if any.
    pub backup_dir: Option<PathBuf>,
    pub external_ip: Option<String>,
    pub runtime: Arc<dyn ContainerRuntime>,
    pub compose: Arc<dyn ComposeEngine>,
    pub wallet: Arc<dyn WalletApi>,
    pub poller: Poller,
}

/// Status of one service as rendered by `status`.
#[derive(Debug)]
pub struct ServiceReport {
    pub name: String,
    pub status: Result<Status>,
}

pub struct Coordinator {
    workspace: Workspace,
    registry: ServiceRegistry,
    config: ServicesConfig,
    backup_dir: PathBuf,
    external_ip: Option<String>,
    runtime: Arc<dyn ContainerRuntime>,
    compose: Arc<dyn ComposeEngine>,
    wallet: Arc<dyn WalletApi>,
    poller: Poller,
}

impl Coordinator {
    /// Build a coordinator over the fixed topology of the workspace network.
    pub fn new(deps: CoordinatorDeps) -> Result<Self> {
        let registry =
            ServiceRegistry::for_network(deps.workspace.network(), Arc::clone(&deps.runtime))?;
        Ok(Self::with_registry(deps, registry))
    }

    /// Build a coordinator over an explicit registry.
    #[must_use]
    pub fn with_registry(deps: CoordinatorDeps, registry: ServiceRegistry) -> Self {
        let backup_dir = deps
            .backup_dir
            .unwrap_or_else(|| deps.workspace.default_backup_dir());
        Self {
            workspace: deps.workspace,
            registry,
            config: deps.config,
            backup_dir,
            external_ip: deps.external_ip,
            runtime: deps.runtime,
            compose: deps.compose,
            wallet: deps.wallet,
            poller: deps.poller,
        }
    }

    #[must_use]
    pub fn network(&self) -> Network {
        self.workspace.network()
    }

    #[must_use]
    pub const fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    #[must_use]
    pub const fn registry(&self) -> &ServiceRegistry {
        &self.registry
    }

    #[must_use]
    pub fn backup_dir(&self) -> &Path {
        &self.backup_dir
    }

    /// Apply every service against the current configuration.
    pub fn apply(&mut self) -> Result<ResolvedServices> {
        let inputs = ApplyInputs {
            network_dir: self.workspace.network_dir(),
            backup_dir: &self.backup_dir,
            external_ip: self.external_ip.as_deref(),
        };
        self.registry.apply_all(&self.config, inputs)
    }

    fn ensure_applied(&mut self) -> Result<()> {
        if !self.registry.is_applied() {
            self.apply()?;
        }
        Ok(())
    }

    /// Apply all services and write both artifacts.
    pub async fn gen(&mut self) -> Result<()> {
        self.apply()?;
        write_artifacts(&self.workspace, &self.registry).await
    }

    /// Gateway endpoint as published by the applied gateway service.
    pub fn gateway(&mut self) -> Result<GatewayRpc> {
        self.ensure_applied()?;
        match self.registry.get(PROXY)?.rpc_params() {
            RpcDescriptor::Gateway(gateway) => Ok(gateway),
            _ => Err(ServiceError::DependencyUnresolved {
                service: XUD.to_string(),
                dependency: PROXY,
            }
            .into()),
        }
    }

    /// Bring the stack up.
    ///
    /// Ends once the order-matching daemon is usable and the swap helper has
    /// been started. Opening the control channel is left to the caller.
    pub async fn setup(&mut self) -> Result<()> {
        info!(network = %self.network(), "Setting up");
        tokio::fs::create_dir_all(self.workspace.logs_dir()).await?;

        self.progress("Generating files").await;
        self.gen().await.phase(Phase::Gen)?;

        self.progress("Pulling images").await;
        self.compose.pull().await.phase(Phase::Pull)?;

        self.up_and_wait(PROXY, accept::ready, None)
            .await
            .phase(Phase::UpProxy)?;

        self.progress("Waiting for XUD dependencies to be ready").await;
        tokio::try_join!(
            self.up_and_wait(LNDBTC, accept::channel_daemon, None),
            self.up_and_wait(LNDLTC, accept::channel_daemon, None),
            self.up_and_wait(CONNEXT, accept::ready, None),
        )
        .phase(Phase::UpLayer2)?;

        self.progress("Starting XUD").await;
        let bootstrap = self.wallet_bootstrap()?;
        self.up_and_wait(XUD, accept::order_matching, Some(&bootstrap))
            .await
            .phase(Phase::UpXud)?;

        if self.is_enabled(BOLTZ) {
            self.compose.up(BOLTZ).await.phase(Phase::UpBoltz)?;
        }

        self.progress("Setup complete").await;
        info!(network = %self.network(), "Setup complete");
        Ok(())
    }

    fn is_enabled(&self, name: &str) -> bool {
        self.registry
            .get(name)
            .is_ok_and(|service| !service.is_disabled())
    }

    fn wallet_bootstrap(&mut self) -> Result<WalletBootstrap> {
        let gateway = self.gateway()?;
        Ok(WalletBootstrap::new(
            Arc::clone(&self.wallet),
            gateway,
            self.workspace.default_password_marker(),
        ))
    }

    /// Start one service and poll it until `accept` holds.
    ///
    /// Disabled services are skipped.
    async fn up_and_wait<F>(
        &self,
        name: &str,
        accept: F,
        hook: Option<&dyn StatusHook>,
    ) -> Result<Status>
    where
        F: Fn(&Status) -> bool + Send + Sync,
    {
        let service = self.registry.get(name)?;
        if service.is_disabled() {
            debug!(service = name, "Skipping disabled service");
            return Ok(Status::Disabled);
        }
        info!(service = name, "Starting");
        self.compose.up(name).await?;
        let status = self.poller.wait_for(service, accept, hook).await?;
        info!(service = name, status = %status, "Service is up");
        Ok(status)
    }

    /// Stop the stack. Not cancellable.
    pub async fn stop(&mut self) -> Result<()> {
        self.ensure_applied()?;
        info!(network = %self.network(), "Stopping");

        if self.registry.contains(BOLTZ) {
            self.stop_service(BOLTZ).await.phase(Phase::StopBoltz)?;
        }
        self.stop_service(XUD).await.phase(Phase::StopXud)?;
        tokio::try_join!(
            self.stop_service(LNDBTC),
            self.stop_service(LNDLTC),
            self.stop_service(CONNEXT),
        )
        .phase(Phase::StopLayer2)?;
        self.stop_service(PROXY).await.phase(Phase::StopProxy)?;
        Ok(())
    }

    async fn stop_service(&self, name: &str) -> Result<()> {
        let service = self.registry.get(name)?;
        info!(service = name, "Stopping");
        match self.runtime.stop(service.container()).await {
            Ok(()) => self.poller.wait_stopped(service).await,
            Err(e) if e.is_no_such_container() => {
                debug!(service = name, "Container already removed");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    /// Stop the stack, shut the compose project down and remove leftovers.
    pub async fn down(&mut self) -> Result<()> {
        self.stop().await?;

        let compose_file = self.workspace.compose_file();
        if !tokio::fs::try_exists(&compose_file).await? {
            debug!(path = %compose_file.display(), "Regenerating missing compose descriptor");
            self.gen().await.phase(Phase::Down)?;
        }
        self.compose.down().await.phase(Phase::Down)?;
        self.remove_leftovers().await.phase(Phase::Down)
    }

    async fn remove_leftovers(&self) -> Result<()> {
        for service in self.registry.iter() {
            let container = service.container();
            if self.runtime.inspect(container).await?.is_none() {
                continue;
            }
            info!(service = %service.name(), "Removing leftover container");
            match self.runtime.remove(container).await {
                Err(e) if !e.is_no_such_container() => return Err(e),
                _ => {}
            }
        }

        let network = self.workspace.docker_network();
        if self.runtime.network_exists(&network).await? {
            info!(network = %network, "Removing network");
            self.runtime.remove_network(&network).await?;
        }
        Ok(())
    }

    /// Tear down, then delete the network directory if `confirm` agrees.
    ///
    /// Returns whether the directory was deleted.
    pub async fn cleanup<F>(&mut self, confirm: F) -> Result<bool>
    where
        F: FnOnce(&Path) -> bool,
    {
        self.down().await?;

        let network_dir = self.workspace.network_dir().to_path_buf();
        if !confirm(&network_dir) {
            info!(path = %network_dir.display(), "Keeping network directory");
            return Ok(false);
        }
        info!(path = %network_dir.display(), "Removing network directory");
        match tokio::fs::remove_dir_all(&network_dir).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(true),
            Err(e) => Err(Error::from(e).in_phase(Phase::FinalCleanup)),
        }
    }

    /// Status of every service, queried concurrently, in registry order.
    pub async fn status_all(&mut self) -> Result<Vec<ServiceReport>> {
        self.ensure_applied()?;
        let reports = self.registry.iter().map(|service| async move {
            ServiceReport {
                name: service.name().to_string(),
                status: current_status(service).await,
            }
        });
        Ok(join_all(reports).await)
    }

    pub async fn status_of(&mut self, name: &str) -> Result<Status> {
        self.ensure_applied()?;
        current_status(self.registry.get(name)?).await
    }

    /// Container name of a service.
    pub fn container_of(&self, name: &str) -> Result<String> {
        Ok(self.registry.get(name)?.container().to_string())
    }

    /// Recent log lines of a service's container.
    pub async fn logs(&self, name: &str, tail: Option<usize>) -> Result<Vec<String>> {
        let container = self.container_of(name)?;
        self.runtime.logs(&container, None, tail).await
    }

    /// Stream a service's container logs from a background task.
    pub async fn follow_logs(&self, name: &str, tail: Option<usize>) -> Result<LogFollow> {
        let container = self.container_of(name)?;
        self.runtime.follow_logs(&container, tail).await
    }

    /// Move the order-matching daemon's backups to `location`.
    ///
    /// Regenerates the artifacts and restarts the daemon in place.
    pub async fn backup_to(&mut self, location: impl Into<PathBuf>) -> Result<()> {
        let location = location.into();
        info!(location = %location.display(), "Changing backup location");
        let previous = std::mem::replace(&mut self.backup_dir, location);
        if let Err(e) = self.gen().await {
            self.backup_dir = previous;
            if let Err(restore) = self.gen().await {
                warn!(error = %restore, "Failed to restore previous artifacts");
            }
            return Err(e).phase(Phase::BackupTo);
        }

        let bootstrap = self.wallet_bootstrap().phase(Phase::BackupTo)?;
        self.up_and_wait(XUD, accept::order_matching, Some(&bootstrap))
            .await
            .phase(Phase::BackupTo)?;
        Ok(())
    }

    /// Snapshot answered to the gateway's `getinfo`.
    pub async fn info_snapshot(&self) -> Result<InfoSnapshot> {
        let default_password =
            tokio::fs::try_exists(self.workspace.default_password_marker()).await?;
        let default_location = self.backup_dir == self.workspace.default_backup_dir();
        Ok(InfoSnapshot::new(
            default_password,
            self.backup_dir.display().to_string(),
            default_location,
        ))
    }

    /// Append a line to the setup progress log. Failures are logged only.
    async fn progress(&self, line: &str) {
        let path = self.workspace.setup_log();
        let result = async {
            let mut file = tokio::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .await?;
            file.write_all(format!("{line}\n").as_bytes()).await
        }
        .await;
        if let Err(e) = result {
            warn!(path = %path.display(), error = %e, "Failed to write setup log");
        }
    }
}

async fn current_status(service: &dyn Service) -> Result<Status> {
    if service.is_disabled() {
        return Ok(Status::Disabled);
    }
    service.status().await
}

#[async_trait]
impl ControlHandler for Coordinator {
    async fn handle(&mut self, request: ControlRequest) -> Option<ControlResponse> {
        match request.method.as_str() {
            "getinfo" => {
                let snapshot = self
                    .info_snapshot()
                    .await
                    .and_then(|snapshot| Ok(serde_json::to_string(&snapshot)?));
                Some(match snapshot {
                    Ok(json) => ControlResponse::ok(request.id, json),
                    Err(e) => ControlResponse::err(request.id, e.to_string()),
                })
            }
            "backupto" => {
                let Some(location) = request.params.first() else {
                    return Some(ControlResponse::err(request.id, "missing backup location"));
                };
                match self.backup_to(location.as_str()).await {
                    Ok(()) => None,
                    Err(e) => {
                        warn!(error = %e, "Backup relocation failed");
                        Some(ControlResponse::err(request.id, e.to_string()))
                    }
                }
            }
            method => {
                warn!(method, "Unknown control method");
                None
            }
        }
    }
}
