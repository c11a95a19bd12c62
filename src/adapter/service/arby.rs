//! Arbitrage bot trading between the order-matching daemon and a
//! centralized exchange.

use std::sync::Arc;

use async_trait::async_trait;

use super::base::{default_image, ServiceBase};
use super::Service;
use crate::domain::{Network, ServiceKind, Status};
use crate::error::Result;
use crate::infrastructure::config::services::ServicesConfig;
use crate::port::outbound::ContainerRuntime;
use crate::port::ApplyContext;

pub struct Arby {
    base: ServiceBase,
}

impl Arby {
    #[must_use]
    pub fn new(network: Network, runtime: Arc<dyn ContainerRuntime>) -> Self {
        Self {
            base: ServiceBase::new("arby", ServiceKind::Arby, network, runtime),
        }
    }
}

#[async_trait]
impl Service for Arby {
    fn base(&self) -> &ServiceBase {
        &self.base
    }

    fn apply(&mut self, config: &ServicesConfig, ctx: &ApplyContext<'_>) -> Result<()> {
        let config = &config.arby;
        let image = default_image(ctx.network, "arby", "1.4.0");
        let xud = ctx.resolved.require(self.base.name(), "xud")?;
        let xud_rpc = xud
            .rpc
            .as_grpc()
            .ok_or_else(|| self.base.probe_fatal("xud did not publish a gRPC endpoint"))?;
        let (xud_host, xud_port, xud_dir) =
            (xud_rpc.host.clone(), xud_rpc.port, xud.data_dir.clone());

        self.base.apply_common(&config.common, &image, true, ctx);
        self.base.mount_data_dir("/root/.arby");

        let descriptor = self.base.descriptor_mut();
        descriptor.add_volume(xud_dir.display(), "/root/.xud");
        descriptor.set_env("NODE_ENV", "production");
        descriptor.set_env("LOG_LEVEL", "trace");
        descriptor.set_env("OPENDEX_CERT_PATH", "/root/.xud/tls.cert");
        descriptor.set_env("OPENDEX_RPC_HOST", xud_host);
        descriptor.set_env("OPENDEX_RPC_PORT", xud_port.to_string());
        descriptor.set_env("BASEASSET", config.base_asset.clone());
        descriptor.set_env("QUOTEASSET", config.quote_asset.clone());
        descriptor.set_env("CEX_BASEASSET", config.cex_base_asset.clone());
        descriptor.set_env("CEX_QUOTEASSET", config.cex_quote_asset.clone());
        descriptor.set_env("CEX", config.cex.clone());
        descriptor.set_env("CEX_API_KEY", config.cex_api_key.clone());
        descriptor.set_env("CEX_API_SECRET", config.cex_api_secret.clone());
        descriptor.set_env("TEST_MODE", config.test_mode.to_string());
        descriptor.set_env("MARGIN", config.margin.clone());
        descriptor.set_env(
            "TEST_CENTRALIZED_EXCHANGE_BASEASSET_BALANCE",
            config.test_centralized_baseasset_balance.clone(),
        );
        descriptor.set_env(
            "TEST_CENTRALIZED_EXCHANGE_QUOTEASSET_BALANCE",
            config.test_centralized_quoteasset_balance.clone(),
        );
        Ok(())
    }

    async fn status(&self) -> Result<Status> {
        self.base.running_is_ready().await
    }
}
