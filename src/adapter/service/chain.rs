//! UTXO chain-data daemons (`bitcoind`, `litecoind`).

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;

use super::base::{can_connect, default_image, Coarse, ServiceBase};
use super::Service;
use crate::domain::{ChainRpc, Network, Protocol, RpcDescriptor, ServiceKind, Status, SyncProgress};
use crate::error::{Error, Result, ServiceError};
use crate::infrastructure::config::services::{ChainDataConfig, ChainDataMode, ServicesConfig};
use crate::port::outbound::ContainerRuntime;
use crate::port::ApplyContext;

/// Which UTXO daemon an adapter drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainDaemon {
    Bitcoind,
    Litecoind,
}

impl ChainDaemon {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Bitcoind => "bitcoind",
            Self::Litecoind => "litecoind",
        }
    }

    const fn cli(self) -> &'static str {
        match self {
            Self::Bitcoind => "bitcoin-cli",
            Self::Litecoind => "litecoin-cli",
        }
    }

    const fn rpc_port(self, network: Network) -> u16 {
        match (self, network) {
            (Self::Bitcoind, Network::Mainnet) => 8332,
            (Self::Bitcoind, _) => 18332,
            (Self::Litecoind, Network::Mainnet) => 9332,
            (Self::Litecoind, _) => 19332,
        }
    }

    const fn mainnet_tag(self) -> &'static str {
        match self {
            Self::Bitcoind => "0.20.1",
            Self::Litecoind => "0.18.1",
        }
    }
}

#[derive(Debug, Deserialize)]
struct BlockchainInfo {
    blocks: u64,
    headers: u64,
}

pub struct ChainData {
    base: ServiceBase,
    daemon: ChainDaemon,
    mode: ChainDataMode,
    rpc: ChainRpc,
}

impl ChainData {
    /// Fails with [`ServiceError::Forbidden`] on simnet, which has no
    /// chain-data daemons.
    pub fn new(
        daemon: ChainDaemon,
        network: Network,
        runtime: Arc<dyn ContainerRuntime>,
    ) -> Result<Self> {
        if network == Network::Simnet {
            return Err(ServiceError::Forbidden {
                service: daemon.name().into(),
                network: network.to_string(),
            }
            .into());
        }
        Ok(Self {
            base: ServiceBase::new(daemon.name(), ServiceKind::ChainData, network, runtime),
            daemon,
            mode: ChainDataMode::default(),
            rpc: ChainRpc::unavailable(),
        })
    }

    fn config<'a>(&self, config: &'a ServicesConfig) -> &'a ChainDataConfig {
        match self.daemon {
            ChainDaemon::Bitcoind => &config.bitcoind,
            ChainDaemon::Litecoind => &config.litecoind,
        }
    }

    async fn native_status(&self) -> Result<Status> {
        if let Coarse::Stopped(status) = self.base.coarse().await? {
            return Ok(status);
        }
        let mut command = vec![self.daemon.cli(), "-rpcuser=xu", "-rpcpassword=xu"];
        if self.base.network() == Network::Testnet {
            command.push("-testnet");
        }
        command.push("getblockchaininfo");

        match self.base.exec(&command).await {
            Ok(output) => {
                let info: BlockchainInfo = serde_json::from_str(&output).map_err(|_| {
                    self.base
                        .probe_fatal(format!("failed to parse output as JSON: {}", output.trim()))
                })?;
                if info.blocks == info.headers && info.blocks > 0 {
                    Ok(Status::Ready)
                } else {
                    Ok(Status::Syncing(SyncProgress::new(info.blocks, info.headers)))
                }
            }
            Err(Error::Exec(err)) => Ok(Status::Other(err.output.trim().to_string())),
            Err(e) => Err(e),
        }
    }
}

#[async_trait]
impl Service for ChainData {
    fn base(&self) -> &ServiceBase {
        &self.base
    }

    fn apply(&mut self, config: &ServicesConfig, ctx: &ApplyContext<'_>) -> Result<()> {
        let config = self.config(config).clone();
        let image = default_image(ctx.network, self.daemon.name(), self.daemon.mainnet_tag());
        self.base.apply_common(&config.common, &image, true, ctx);
        self.base
            .mount_data_dir(&format!("/root/.{}", self.daemon.name()));

        self.mode = config.mode;
        self.rpc = match config.mode {
            ChainDataMode::Native => {
                let host = self.daemon.name().to_string();
                ChainRpc {
                    protocol: Protocol::JsonRpc,
                    port: self.daemon.rpc_port(ctx.network),
                    username: "xu".into(),
                    password: "xu".into(),
                    zmqpubrawblock: format!("tcp://{host}:28332"),
                    zmqpubrawtx: format!("tcp://{host}:28333"),
                    host,
                }
            }
            ChainDataMode::External => ChainRpc {
                protocol: Protocol::JsonRpc,
                host: config.rpchost,
                port: config.rpcport,
                username: config.rpcuser,
                password: config.rpcpass,
                zmqpubrawblock: config.zmqpubrawblock,
                zmqpubrawtx: config.zmqpubrawtx,
            },
            ChainDataMode::Neutrino | ChainDataMode::Light => ChainRpc::unavailable(),
        };
        Ok(())
    }

    async fn status(&self) -> Result<Status> {
        match self.mode {
            ChainDataMode::External => {
                let addr = format!("{}:{}", self.rpc.host, self.rpc.port);
                if can_connect(&addr).await {
                    Ok(Status::Other("Ready (Connected to external)".into()))
                } else {
                    Ok(Status::Other("Unavailable (Connection to external failed)".into()))
                }
            }
            ChainDataMode::Neutrino | ChainDataMode::Light => {
                Ok(Status::Other("Ready (Connected to Neutrino)".into()))
            }
            ChainDataMode::Native => self.native_status().await,
        }
    }

    fn rpc_params(&self) -> RpcDescriptor {
        RpcDescriptor::Chain(self.rpc.clone())
    }

    fn mode(&self) -> Option<&str> {
        Some(self.mode.as_str())
    }
}
