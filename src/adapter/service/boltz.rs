//! Channel-swap helper.

use std::sync::Arc;

use async_trait::async_trait;

use super::base::{default_image, Coarse, ServiceBase};
use super::Service;
use crate::domain::{GrpcRpc, Network, Protocol, RpcDescriptor, ServiceKind, Status, SwapRpc};
use crate::error::{Error, Result, ServiceError};
use crate::infrastructure::config::services::ServicesConfig;
use crate::port::outbound::ContainerRuntime;
use crate::port::ApplyContext;

pub struct Boltz {
    base: ServiceBase,
}

impl Boltz {
    /// Fails with [`ServiceError::Forbidden`] on simnet.
    pub fn new(network: Network, runtime: Arc<dyn ContainerRuntime>) -> Result<Self> {
        if network == Network::Simnet {
            return Err(ServiceError::Forbidden {
                service: "boltz".into(),
                network: network.to_string(),
            }
            .into());
        }
        Ok(Self {
            base: ServiceBase::new("boltz", ServiceKind::Boltz, network, runtime),
        })
    }

    /// `up` or `down` for one chain's wrapper.
    async fn chain_state(&self, chain: &str) -> Result<&'static str> {
        match self.base.exec(&["wrapper", chain, "getinfo"]).await {
            Ok(_) => Ok("up"),
            Err(Error::Exec(_)) => Ok("down"),
            Err(e) => Err(e),
        }
    }

    fn grpc(&self, chain: &str, port: u16) -> GrpcRpc {
        let dir = format!("/root/network/{}/{chain}", self.base.name());
        GrpcRpc {
            protocol: Protocol::Grpc,
            host: "boltz".into(),
            port,
            tls_cert: format!("{dir}/tls.cert"),
            macaroon: Some(format!("{dir}/admin.macaroon")),
        }
    }
}

#[async_trait]
impl Service for Boltz {
    fn base(&self) -> &ServiceBase {
        &self.base
    }

    fn apply(&mut self, config: &ServicesConfig, ctx: &ApplyContext<'_>) -> Result<()> {
        let image = default_image(ctx.network, "boltz", "1.2.0");
        let name = self.base.name().to_string();
        let lndbtc = ctx.resolved.require(&name, "lndbtc")?.data_dir.clone();
        let lndltc = ctx.resolved.require(&name, "lndltc")?.data_dir.clone();

        self.base.apply_common(&config.boltz.common, &image, false, ctx);
        self.base.mount_data_dir("/root/.boltz");
        let descriptor = self.base.descriptor_mut();
        descriptor.add_volume(lndbtc.display(), "/root/.lndbtc");
        descriptor.add_volume(lndltc.display(), "/root/.lndltc");
        Ok(())
    }

    async fn status(&self) -> Result<Status> {
        if let Coarse::Stopped(status) = self.base.coarse().await? {
            return Ok(status);
        }
        let btc = self.chain_state("btc").await?;
        let ltc = self.chain_state("ltc").await?;
        if btc == "up" && ltc == "up" {
            Ok(Status::Ready)
        } else {
            Ok(Status::Other(format!("btc {btc}; ltc {ltc}")))
        }
    }

    fn rpc_params(&self) -> RpcDescriptor {
        RpcDescriptor::Swap(SwapRpc {
            bitcoin: self.grpc("bitcoin", 9002),
            litecoin: self.grpc("litecoin", 9102),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::port::ResolvedServices;
    use crate::testkit::domain::{apply_context, lnd_resolved};
    use crate::testkit::runtime::{ExecReply, FakeRuntime};

    fn applied(runtime: Arc<FakeRuntime>) -> Boltz {
        let mut boltz = Boltz::new(Network::Testnet, runtime).unwrap();
        let mut resolved = ResolvedServices::new();
        resolved.insert("lndbtc", lnd_resolved("/data/lndbtc"));
        resolved.insert("lndltc", lnd_resolved("/data/lndltc"));
        boltz
            .apply(&ServicesConfig::default(), &apply_context(Network::Testnet, &resolved))
            .unwrap();
        boltz
    }

    #[test]
    fn absent_on_simnet() {
        assert!(Boltz::new(Network::Simnet, Arc::new(FakeRuntime::new())).is_err());
    }

    #[test]
    fn rpc_lists_both_chains() {
        let boltz = applied(Arc::new(FakeRuntime::new()));
        let value = serde_json::to_value(boltz.rpc_params()).unwrap();
        assert_eq!(value["bitcoin"]["port"], 9002);
        assert_eq!(value["litecoin"]["port"], 9102);
        assert_eq!(
            value["litecoin"]["macaroon"],
            "/root/network/boltz/litecoin/admin.macaroon"
        );
        assert_eq!(boltz.descriptor().volumes.len(), 3);
    }

    #[tokio::test]
    async fn reports_each_chain_wrapper() {
        let runtime = Arc::new(FakeRuntime::new());
        runtime.set_state("testnet_boltz_1", "running");
        runtime.script_exec(
            "testnet_boltz_1",
            "wrapper btc getinfo",
            vec![ExecReply::ok("{}")],
        );
        runtime.script_exec(
            "testnet_boltz_1",
            "wrapper ltc getinfo",
            vec![ExecReply::fail("connection refused"), ExecReply::ok("{}")],
        );
        let boltz = applied(runtime);

        assert_eq!(
            boltz.status().await.unwrap(),
            Status::Other("btc up; ltc down".into())
        );
        assert_eq!(boltz.status().await.unwrap(), Status::Ready);
    }
}
