//! Ethereum chain-data daemon and its alternative providers.

use std::sync::Arc;

use async_trait::async_trait;

use super::base::{default_image, ServiceBase};
use super::Service;
use crate::domain::{EthRpc, Network, Protocol, RpcDescriptor, ServiceKind, Status};
use crate::error::{ConfigError, Result};
use crate::infrastructure::config::services::{GethConfig, GethMode, ServicesConfig};
use crate::port::outbound::ContainerRuntime;
use crate::port::ApplyContext;

const SIMNET_PROVIDER_HOST: &str = "35.234.110.95";
const LIGHT_PROVIDER_HOST: &str = "eth.kilrau.com";

pub struct Geth {
    base: ServiceBase,
    mode: GethMode,
    rpc: EthRpc,
}

impl Geth {
    #[must_use]
    pub fn new(network: Network, runtime: Arc<dyn ContainerRuntime>) -> Self {
        Self {
            base: ServiceBase::new("geth", ServiceKind::Geth, network, runtime),
            mode: GethMode::default(),
            rpc: rpc("http", "", "", 0),
        }
    }

    fn provider(network: Network, config: &GethConfig) -> Result<EthRpc> {
        if network == Network::Simnet {
            return Ok(rpc("http", SIMNET_PROVIDER_HOST, "", 8545));
        }
        let provider = match config.mode {
            GethMode::Native => rpc("http", "geth", "", 8545),
            GethMode::External => rpc(&config.rpcscheme, &config.rpchost, "", config.rpcport),
            GethMode::Infura => {
                if config.infura_project_id.is_empty() {
                    return Err(ConfigError::MissingField {
                        field: "services.geth.infura_project_id",
                    }
                    .into());
                }
                let host = network.pick("", "rinkeby.infura.io", "mainnet.infura.io");
                let path = format!("/v3/{}", config.infura_project_id);
                rpc("https", host, &path, 0)
            }
            GethMode::Light => rpc(
                "http",
                LIGHT_PROVIDER_HOST,
                "",
                network.pick(0, 52041, 41007),
            ),
        };
        Ok(provider)
    }
}

fn rpc(scheme: &str, host: &str, path: &str, port: u16) -> EthRpc {
    EthRpc {
        protocol: Protocol::JsonRpc,
        scheme: scheme.to_string(),
        host: host.to_string(),
        path: path.to_string(),
        port,
    }
}

#[async_trait]
impl Service for Geth {
    fn base(&self) -> &ServiceBase {
        &self.base
    }

    fn apply(&mut self, config: &ServicesConfig, ctx: &ApplyContext<'_>) -> Result<()> {
        let config = &config.geth;
        let image = default_image(ctx.network, "geth", "1.9.24");
        self.base.apply_common(&config.common, &image, true, ctx);
        self.base.mount_data_dir("/root/.ethereum");

        let descriptor = self.base.descriptor_mut();
        if let Some(cache) = config.cache.as_deref().filter(|c| !c.is_empty()) {
            descriptor.command.push("--cache".into());
            descriptor.command.push(cache.to_string());
        }
        if let Some(dir) = &config.ancient_chaindata_dir {
            descriptor.add_volume(dir.display(), "/root/.ethereum-ancient-chaindata");
        }

        self.mode = config.mode;
        self.rpc = Self::provider(ctx.network, config)?;
        Ok(())
    }

    async fn status(&self) -> Result<Status> {
        self.base.running_is_ready().await
    }

    fn rpc_params(&self) -> RpcDescriptor {
        RpcDescriptor::Eth(self.rpc.clone())
    }

    fn mode(&self) -> Option<&str> {
        Some(self.mode.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::port::ResolvedServices;
    use crate::testkit::domain::apply_context;
    use crate::testkit::runtime::FakeRuntime;

    fn applied(network: Network, config: &ServicesConfig) -> Result<Geth> {
        let mut geth = Geth::new(network, Arc::new(FakeRuntime::new()));
        let resolved = ResolvedServices::new();
        geth.apply(config, &apply_context(network, &resolved))?;
        Ok(geth)
    }

    fn uri(geth: &Geth) -> String {
        geth.rpc_params().as_eth().unwrap().uri()
    }

    #[test]
    fn light_provider_per_network() {
        let config = ServicesConfig::default();
        let mainnet = applied(Network::Mainnet, &config).unwrap();
        assert_eq!(uri(&mainnet), "http://eth.kilrau.com:41007");
        assert!(mainnet.is_disabled());
        assert_eq!(mainnet.descriptor().image, "exchangeunion/geth:1.9.24");

        let testnet = applied(Network::Testnet, &config).unwrap();
        assert_eq!(uri(&testnet), "http://eth.kilrau.com:52041");
    }

    #[test]
    fn infura_builds_project_path() {
        let mut config = ServicesConfig::default();
        config.geth.mode = GethMode::Infura;
        config.geth.infura_project_id = "abc123".into();

        let geth = applied(Network::Testnet, &config).unwrap();
        assert_eq!(uri(&geth), "https://rinkeby.infura.io/v3/abc123");
        assert_eq!(geth.mode(), Some("infura"));
    }

    #[test]
    fn infura_without_project_is_rejected() {
        let mut config = ServicesConfig::default();
        config.geth.mode = GethMode::Infura;
        assert!(applied(Network::Mainnet, &config).is_err());
    }

    #[test]
    fn native_mode_with_cache_and_ancient_dir() {
        let mut config = ServicesConfig::default();
        config.geth.mode = GethMode::Native;
        config.geth.cache = Some("10240".into());
        config.geth.ancient_chaindata_dir = Some("/mnt/hdd/ancient".into());

        let geth = applied(Network::Mainnet, &config).unwrap();
        assert_eq!(uri(&geth), "http://geth:8545");
        assert_eq!(geth.descriptor().command, ["--cache", "10240"]);
        assert!(geth
            .descriptor()
            .volumes
            .iter()
            .any(|v| v == "/mnt/hdd/ancient:/root/.ethereum-ancient-chaindata"));
    }

    #[test]
    fn simnet_uses_fixed_provider() {
        let geth = applied(Network::Simnet, &ServicesConfig::default()).unwrap();
        assert_eq!(uri(&geth), "http://35.234.110.95:8545");
    }
}
