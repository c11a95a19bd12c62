//! Payment-channel hub.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::json;

use super::base::{default_image, Coarse, ServiceBase};
use super::Service;
use crate::domain::{HttpRpc, Network, Protocol, RpcDescriptor, ServiceKind, Status};
use crate::error::{ConfigError, Error, Result};
use crate::infrastructure::config::services::ServicesConfig;
use crate::port::outbound::ContainerRuntime;
use crate::port::ApplyContext;

const CHAIN_ID: &str = "1337";
const CHANNEL_FACTORY_ADDRESS: &str = "0x09f37Ee0662E13e7d07e84CE77705E981Be79406";
const TRANSFER_REGISTRY_ADDRESS: &str = "0xE70F6686f0AF6a858256B073ABB74fC5C79cE343";
const SIMNET_ETH_PROVIDER: &str = "http://35.234.110.95:8545";
const MESSAGING_URL: &str = "https://messaging.connext.network";
/// Required at startup; replaced by the order-matching daemon.
const PLACEHOLDER_MNEMONIC: &str =
    "crazy angry east hood fiber awake leg knife entire excite output scheme";

pub struct Connext {
    base: ServiceBase,
}

impl Connext {
    #[must_use]
    pub fn new(network: Network, runtime: Arc<dyn ContainerRuntime>) -> Self {
        Self {
            base: ServiceBase::new("connext", ServiceKind::Connext, network, runtime),
        }
    }

    fn vector_config(&self, admin_token: &str) -> Result<String> {
        let config = json!({
            "adminToken": admin_token,
            "chainAddresses": {
                CHAIN_ID: {
                    "channelFactoryAddress": CHANNEL_FACTORY_ADDRESS,
                    "transferRegistryAddress": TRANSFER_REGISTRY_ADDRESS,
                },
            },
            "chainProviders": { CHAIN_ID: SIMNET_ETH_PROVIDER },
            "domainName": "",
            "logLevel": "debug",
            "messagingUrl": MESSAGING_URL,
            "production": true,
            "mnemonic": PLACEHOLDER_MNEMONIC,
        });

        let mut out = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
        config.serialize(&mut serializer)?;
        Ok(String::from_utf8_lossy(&out).into_owned())
    }
}

#[async_trait]
impl Service for Connext {
    fn base(&self) -> &ServiceBase {
        &self.base
    }

    fn apply(&mut self, config: &ServicesConfig, ctx: &ApplyContext<'_>) -> Result<()> {
        let config = &config.connext;
        let image = ctx.network.pick(
            "connextproject/vector_node:0.0.34".to_string(),
            default_image(ctx.network, "connext", "1.3.6"),
            default_image(ctx.network, "connext", "1.3.6"),
        );
        self.base.apply_common(&config.common, &image, false, ctx);
        self.base.mount_data_dir("/app/connext-store");

        let vector = self.base.descriptor().image.contains("vector_node");
        let vector_config = if vector {
            // Persisted by the launcher so every run renders the same value.
            let token = config
                .admin_token
                .as_deref()
                .ok_or(ConfigError::MissingField {
                    field: "services.connext.admin_token",
                })?;
            Some(self.vector_config(token)?)
        } else {
            None
        };

        let eth_provider = if ctx.network == Network::Simnet {
            None
        } else {
            let geth = ctx.resolved.require(self.base.name(), "geth")?;
            let uri = geth.rpc.as_eth().map(|rpc| rpc.uri()).ok_or_else(|| {
                self.base.probe_fatal("geth did not publish a JSON-RPC endpoint")
            })?;
            Some(uri)
        };

        let descriptor = self.base.descriptor_mut();
        if let Some(vector_config) = vector_config {
            descriptor.set_env("VECTOR_CONFIG", vector_config);
            descriptor.set_env("VECTOR_SQLITE_FILE", "/database/store.db");
            descriptor.set_env("VECTOR_PROD", "true");
        } else {
            descriptor.set_env("LEGACY_MODE", "true");
            let node_url = ctx.network.pick(
                "https://connext.simnet.exchangeunion.com",
                "https://connext.testnet.exchangeunion.com",
                "https://connext.boltz.exchange",
            );
            descriptor.set_env("CONNEXT_NODE_URL", node_url);
            if ctx.network == Network::Simnet {
                descriptor.set_env(
                    "CONNEXT_ETH_PROVIDER_URL",
                    "http://connext.simnet.exchangeunion.com:8545",
                );
            }
        }
        if let Some(uri) = eth_provider {
            descriptor.set_env("CONNEXT_ETH_PROVIDER_URL", uri);
        }
        Ok(())
    }

    async fn status(&self) -> Result<Status> {
        if let Coarse::Stopped(status) = self.base.coarse().await? {
            return Ok(status);
        }
        match self
            .base
            .exec(&["curl", "-s", "http://localhost:5040/health"])
            .await
        {
            Ok(output) if output.is_empty() => Ok(Status::Ready),
            Ok(_) | Err(Error::Exec(_)) => Ok(Status::Starting),
            Err(e) => Err(e),
        }
    }

    fn rpc_params(&self) -> RpcDescriptor {
        RpcDescriptor::Http(HttpRpc {
            protocol: Protocol::Http,
            host: "connext".into(),
            port: 5040,
        })
    }
}
