//! Order-matching daemon.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use super::base::{default_image, Coarse, ServiceBase};
use super::Service;
use crate::domain::{GrpcRpc, Network, Protocol, RpcDescriptor, ServiceKind, Status};
use crate::error::{Error, Result};
use crate::infrastructure::config::services::ServicesConfig;
use crate::port::outbound::ContainerRuntime;
use crate::port::ApplyContext;

/// Key-material marker written by the daemon once a wallet exists.
pub const NODE_KEY_FILE: &str = "nodekey.dat";

const NO_ACTIVE_CHANNELS: &str = "has no active channels";

/// Probe output fragments meaning the daemon is still coming up.
const STARTING_MARKERS: [&str; 3] = [
    "tls cert could not be found at /root/.xud/tls.cert",
    "xud is starting",
    "is xud running?",
];

/// Sub-statuses the daemon reports for its dependencies.
#[derive(Debug, Clone, PartialEq, Eq)]
struct DependencyStatus {
    lndbtc: String,
    lndltc: String,
    connext: String,
}

impl DependencyStatus {
    fn parse(output: &str) -> Option<Self> {
        let info: Value = serde_json::from_str(output).ok()?;
        let mut lndbtc = String::new();
        let mut lndltc = String::new();
        for entry in info.get("lndMap")?.as_array()? {
            let currency = entry.get(0).and_then(Value::as_str);
            let status = entry
                .get(1)
                .and_then(|lnd| lnd.get("status"))
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            match currency {
                Some("BTC") => lndbtc = status,
                Some("LTC") => lndltc = status,
                _ => {}
            }
        }
        let connext = info.get("connext")?.get("status")?.as_str()?.to_string();
        Some(Self {
            lndbtc,
            lndltc,
            connext,
        })
    }

    fn status(&self) -> Status {
        let entries = [
            ("lndbtc", &self.lndbtc),
            ("lndltc", &self.lndltc),
            ("connext", &self.connext),
        ];
        let not_ready: Vec<String> = entries
            .iter()
            .filter(|(_, status)| status.as_str() != "Ready")
            .map(|(name, _)| (*name).to_string())
            .collect();

        if not_ready.is_empty() {
            Status::Ready
        } else if entries
            .iter()
            .any(|(_, status)| status.contains(NO_ACTIVE_CHANNELS))
        {
            Status::WaitingForChannels
        } else {
            Status::WaitingFor(not_ready)
        }
    }
}

pub struct Xud {
    base: ServiceBase,
    rpc: Option<GrpcRpc>,
}

impl Xud {
    #[must_use]
    pub fn new(network: Network, runtime: Arc<dyn ContainerRuntime>) -> Self {
        Self {
            base: ServiceBase::new("xud", ServiceKind::Xud, network, runtime),
            rpc: None,
        }
    }

    /// Distinguish a daemon without key material from a locked one.
    async fn locked_status(&self) -> Result<Status> {
        let marker = self.base.data_dir().join(NODE_KEY_FILE);
        if tokio::fs::try_exists(&marker).await? {
            Ok(Status::WalletLocked)
        } else {
            Ok(Status::WalletMissing)
        }
    }
}

#[async_trait]
impl Service for Xud {
    fn base(&self) -> &ServiceBase {
        &self.base
    }

    fn apply(&mut self, config: &ServicesConfig, ctx: &ApplyContext<'_>) -> Result<()> {
        let config = &config.xud;
        let image = default_image(ctx.network, "xud", "1.2.6");
        let name = self.base.name().to_string();
        let lndbtc = ctx.resolved.require(&name, "lndbtc")?.data_dir.clone();
        let lndltc = ctx.resolved.require(&name, "lndltc")?.data_dir.clone();

        self.base.apply_common(&config.common, &image, false, ctx);
        self.base.mount_data_dir("/root/.xud");

        let descriptor = self.base.descriptor_mut();
        descriptor.set_env("NODE_ENV", "production");
        descriptor.set_env("PRESERVE_CONFIG", config.preserve_config.to_string());
        descriptor.add_volume(lndbtc.display(), "/root/.lndbtc");
        descriptor.add_volume(lndltc.display(), "/root/.lndltc");
        descriptor.add_volume(ctx.backup_dir.display(), "/root/backup");
        descriptor
            .ports
            .push(ctx.network.pick("28885", "18885", "8885").into());

        self.rpc = Some(GrpcRpc {
            protocol: Protocol::Grpc,
            tls_cert: format!("/root/network/data/{name}/tls.cert"),
            host: name,
            port: ctx.network.pick(28886, 18886, 8886),
            macaroon: None,
        });
        Ok(())
    }

    async fn status(&self) -> Result<Status> {
        if let Coarse::Stopped(status) = self.base.coarse().await? {
            return Ok(status);
        }

        match self.base.exec(&["xucli", "getinfo", "-j"]).await {
            Ok(output) => DependencyStatus::parse(&output)
                .map(|deps| deps.status())
                .ok_or_else(|| self.base.probe_fatal(format!("get info: {}", output.trim()))),
            Err(Error::Exec(err)) => {
                if err.output.contains("xud is locked") {
                    self.locked_status().await
                } else if STARTING_MARKERS.iter().any(|m| err.output.contains(m)) {
                    Ok(Status::Starting)
                } else {
                    Err(self.base.probe_fatal(format!("get info: {err}")))
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
