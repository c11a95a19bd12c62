//! Lightning channel daemon, one instance per chain.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::warn;

use super::base::{Coarse, ServiceBase};
use super::sync::{NeutrinoSyncParser, SyncLogParser};
use super::Service;
use crate::domain::{GrpcRpc, Network, Protocol, RpcDescriptor, ServiceKind, Status, SyncProgress};
use crate::error::{Error, Result};
use crate::infrastructure::config::services::{ChainDataMode, LndConfig, ServicesConfig};
use crate::port::outbound::{ContainerRuntime, ContainerState};
use crate::port::ApplyContext;

/// gRPC port of the daemon inside the compose network.
const GRPC_PORT: u16 = 10009;

/// Chain a channel daemon operates on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Chain {
    Bitcoin,
    Litecoin,
}

impl Chain {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Bitcoin => "bitcoin",
            Self::Litecoin => "litecoin",
        }
    }

    /// Service name of the chain-data daemon backing this chain.
    #[must_use]
    pub const fn backend(self) -> &'static str {
        match self {
            Self::Bitcoin => "bitcoind",
            Self::Litecoin => "litecoind",
        }
    }

    const fn service_name(self) -> &'static str {
        match self {
            Self::Bitcoin => "lndbtc",
            Self::Litecoin => "lndltc",
        }
    }

    fn simnet_flags(self) -> Vec<String> {
        let chain = self.as_str();
        let (peer_port, max_cltv) = match self {
            Self::Bitcoin => (38555, 5000),
            Self::Litecoin => (39555, 20000),
        };
        vec![
            "--debuglevel=debug".into(),
            "--nobootstrap".into(),
            "--minbackoff=30s".into(),
            "--maxbackoff=24h".into(),
            format!("--{chain}.active"),
            format!("--{chain}.simnet"),
            format!("--{chain}.node=neutrino"),
            format!("--{chain}.defaultchanconfs=6"),
            "--routing.assumechanvalid".into(),
            format!("--neutrino.connect=btcd.simnet.exchangeunion.com:{peer_port}"),
            "--chan-enable-timeout=0m10s".into(),
            format!("--max-cltv-expiry={max_cltv}"),
        ]
    }
}

#[derive(Debug, Deserialize)]
struct NodeInfo {
    synced_to_chain: bool,
    block_height: u64,
}

pub struct Lnd {
    base: ServiceBase,
    chain: Chain,
    light_client: bool,
    rpc: Option<GrpcRpc>,
    sync_parser: Arc<dyn SyncLogParser>,
}

impl Lnd {
    #[must_use]
    pub fn new(chain: Chain, network: Network, runtime: Arc<dyn ContainerRuntime>) -> Self {
        Self {
            base: ServiceBase::new(chain.service_name(), ServiceKind::Lnd, network, runtime),
            chain,
            light_client: network == Network::Simnet,
            rpc: None,
            sync_parser: Arc::new(NeutrinoSyncParser),
        }
    }

    /// Replace the log parser used while the daemon syncs as a light client.
    #[must_use]
    pub fn with_sync_parser(mut self, parser: Arc<dyn SyncLogParser>) -> Self {
        self.sync_parser = parser;
        self
    }

    #[must_use]
    pub const fn chain(&self) -> Chain {
        self.chain
    }

    /// True when the daemon syncs through its own light client.
    #[must_use]
    pub const fn is_light_client(&self) -> bool {
        self.light_client
    }

    fn config<'a>(&self, config: &'a ServicesConfig) -> &'a LndConfig {
        match self.chain {
            Chain::Bitcoin => &config.lndbtc,
            Chain::Litecoin => &config.lndltc,
        }
    }

    fn default_image(&self, network: Network) -> String {
        let repository = self.base.name();
        match (network, self.chain) {
            (Network::Simnet, _) => format!("exchangeunion/{repository}-simnet:latest"),
            (Network::Testnet, _) => format!("exchangeunion/{repository}:latest"),
            (Network::Mainnet, Chain::Bitcoin) => "exchangeunion/lndbtc:0.11.1-beta".into(),
            (Network::Mainnet, Chain::Litecoin) => "exchangeunion/lndltc:0.11.0-beta.rc1".into(),
        }
    }

    async fn light_client_progress(&self, state: &ContainerState) -> Result<Status> {
        let lines = self.base.logs_since(state).await?;
        Ok(Status::Syncing(self.sync_parser.progress(&lines)))
    }
}

#[async_trait]
impl Service for Lnd {
    fn base(&self) -> &ServiceBase {
        &self.base
    }

    fn apply(&mut self, config: &ServicesConfig, ctx: &ApplyContext<'_>) -> Result<()> {
        let lnd_config = self.config(config).clone();
        let image = self.default_image(ctx.network);
        let name = self.base.name().to_string();

        self.base.apply_common(&lnd_config.common, &image, false, ctx);
        self.base.mount_data_dir("/root/.lnd");

        let descriptor = self.base.descriptor_mut();
        descriptor.set_env("CHAIN", self.chain.as_str());
        descriptor.set_env("PRESERVE_CONFIG", lnd_config.preserve_config.to_string());
        if let Some(ip) = ctx.external_ip.filter(|ip| !ip.is_empty()) {
            descriptor.set_env("EXTERNAL_IP", ip);
        }

        if ctx.network == Network::Simnet {
            descriptor.command = self.chain.simnet_flags();
            self.light_client = true;
        } else {
            let backend = ctx.resolved.require(&name, self.chain.backend())?;
            let mode = backend.mode.as_deref().unwrap_or_default();
            self.light_client =
                mode == ChainDataMode::Neutrino.as_str() || mode == ChainDataMode::Light.as_str();

            match backend.rpc.as_chain() {
                Some(rpc) if mode == ChainDataMode::External.as_str() => {
                    descriptor.set_env("RPCHOST", rpc.host.clone());
                    descriptor.set_env("RPCPORT", rpc.port.to_string());
                    descriptor.set_env("RPCUSER", rpc.username.clone());
                    descriptor.set_env("RPCPASS", rpc.password.clone());
                    descriptor.set_env("ZMQPUBRAWBLOCK", rpc.zmqpubrawblock.clone());
                    descriptor.set_env("ZMQPUBRAWTX", rpc.zmqpubrawtx.clone());
                }
                _ => descriptor.set_env("NEUTRINO", "True"),
            }
        }

        let data_dir = format!("/root/network/data/{name}");
        self.rpc = Some(GrpcRpc {
            protocol: Protocol::Grpc,
            host: name,
            port: GRPC_PORT,
            tls_cert: format!("{data_dir}/tls.cert"),
            macaroon: Some(format!(
                "{data_dir}/data/chain/{}/{}/readonly.macaroon",
                self.chain.as_str(),
                ctx.network
            )),
        });
        Ok(())
    }

    async fn status(&self) -> Result<Status> {
        let state = match self.base.coarse().await? {
            Coarse::Running(state) => state,
            Coarse::Stopped(status) => return Ok(status),
        };

        let network = self.base.network().as_str();
        let command = ["lncli", "-n", network, "-c", self.chain.as_str(), "getinfo"];
        match self.base.exec(&command).await {
            Ok(output) => {
                let info: NodeInfo = serde_json::from_str(&output).map_err(|_| {
                    self.base
                        .probe_fatal(format!("failed to parse output as JSON: {}", output.trim()))
                })?;
                if info.synced_to_chain {
                    return Ok(Status::Ready);
                }
                let lines = self.base.logs_since(&state).await?;
                let synced = self.sync_parser.latest_block(&lines).unwrap_or(0);
                Ok(Status::Syncing(SyncProgress::new(synced, info.block_height)))
            }
            Err(Error::Exec(err)) => {
                let output = err.output.to_lowercase();
                if output.contains("wallet is encrypted") {
                    Ok(Status::WalletLocked)
                } else if output.contains("admin.macaroon: no such file") && self.light_client {
                    self.light_client_progress(&state).await
                } else if output.contains("open /root/.lnd/tls.cert: no such file or directory")
                    || output.contains("connection refused")
                {
                    Ok(Status::Starting)
                } else {
                    warn!(
                        service = %self.base.name(),
                        output = %err.output.trim(),
                        "Unrecognized probe failure"
                    );
                    Err(self.base.probe_fatal(err.to_string()))
                }
            }
            Err(e) => Err(e),
        }
    }

    fn rpc_params(&self) -> RpcDescriptor {
        self.rpc
            .clone()
            .map_or_else(super::unresolved_rpc, RpcDescriptor::Grpc)
    }
}
