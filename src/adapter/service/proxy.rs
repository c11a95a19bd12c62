//! Gateway: reverse proxy in front of every service API, plus the
//! management API and control endpoint used by the launcher.

use std::sync::Arc;

use async_trait::async_trait;

use super::base::{can_connect, default_image, Coarse, ServiceBase};
use super::Service;
use crate::domain::{
    GatewayRpc, Network, Protocol, RpcDescriptor, ServiceKind, Status,
};
use crate::error::Result;
use crate::infrastructure::config::services::ServicesConfig;
use crate::port::outbound::ContainerRuntime;
use crate::port::ApplyContext;

/// Host port the gateway's API is published on.
#[must_use]
pub fn api_port(network: Network) -> u16 {
    network.pick(28889, 18889, 8889)
}

pub struct Proxy {
    base: ServiceBase,
    rpc: GatewayRpc,
}

impl Proxy {
    #[must_use]
    pub fn new(network: Network, runtime: Arc<dyn ContainerRuntime>) -> Self {
        Self {
            base: ServiceBase::new("proxy", ServiceKind::Proxy, network, runtime),
            rpc: GatewayRpc {
                protocol: Protocol::Http,
                scheme: "https".into(),
                port: api_port(network),
            },
        }
    }
}

#[async_trait]
impl Service for Proxy {
    fn base(&self) -> &ServiceBase {
        &self.base
    }

    fn apply(&mut self, config: &ServicesConfig, ctx: &ApplyContext<'_>) -> Result<()> {
        let config = &config.proxy;
        let image = default_image(ctx.network, "proxy", "1.2.0");
        self.base.apply_common(&config.common, &image, false, ctx);
        self.base.mount_data_dir("/root/.proxy");

        let port = api_port(ctx.network);
        let descriptor = self.base.descriptor_mut();
        descriptor.add_volume(ctx.network_dir.display(), "/root/network");
        descriptor.add_volume("/var/run/docker.sock", "/var/run/docker.sock");
        if config.tls {
            descriptor.command.push("--tls".into());
        }
        descriptor.ports.push(format!("127.0.0.1:{port}:8080"));

        self.rpc = GatewayRpc {
            protocol: Protocol::Http,
            scheme: if config.tls { "https" } else { "http" }.into(),
            port,
        };
        Ok(())
    }

    async fn status(&self) -> Result<Status> {
        if let Coarse::Stopped(status) = self.base.coarse().await? {
            return Ok(status);
        }
        if can_connect(&format!("127.0.0.1:{}", self.rpc.port)).await {
            Ok(Status::Ready)
        } else {
            Ok(Status::Starting)
        }
    }

    fn rpc_params(&self) -> RpcDescriptor {
        RpcDescriptor::Gateway(self.rpc.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testkit::domain::apply_context;
    use crate::testkit::runtime::FakeRuntime;
    use crate::port::ResolvedServices;

    #[test]
    fn apply_publishes_loopback_port_and_tls() {
        let mut proxy = Proxy::new(Network::Mainnet, Arc::new(FakeRuntime::new()));
        let resolved = ResolvedServices::new();
        let ctx = apply_context(Network::Mainnet, &resolved);

        proxy.apply(&ServicesConfig::default(), &ctx).unwrap();

        let descriptor = proxy.descriptor();
        assert_eq!(descriptor.image, "exchangeunion/proxy:1.2.0");
        assert_eq!(descriptor.command, ["--tls"]);
        assert_eq!(descriptor.ports, ["127.0.0.1:8889:8080"]);
        assert!(descriptor
            .volumes
            .iter()
            .any(|v| v == "/var/run/docker.sock:/var/run/docker.sock"));

        let rpc = proxy.rpc_params();
        let gateway = rpc.as_gateway().unwrap();
        assert_eq!(gateway.api_url(), "https://127.0.0.1:8889");
    }

    #[test]
    fn plain_http_without_tls() {
        let mut proxy = Proxy::new(Network::Simnet, Arc::new(FakeRuntime::new()));
        let resolved = ResolvedServices::new();
        let ctx = apply_context(Network::Simnet, &resolved);
        let mut config = ServicesConfig::default();
        config.proxy.tls = false;

        proxy.apply(&config, &ctx).unwrap();

        assert!(proxy.descriptor().command.is_empty());
        let rpc = proxy.rpc_params();
        assert_eq!(
            rpc.as_gateway().unwrap().control_url(),
            "ws://127.0.0.1:28889/launcher"
        );
    }
}
