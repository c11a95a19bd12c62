//! Ordered set of service adapters for one network profile.
//!
//! Registry order is a topological order of the dependency graph: every
//! service comes after the services it reads in `apply`. Artifacts list
//! services in the same order.

use std::path::Path;
use std::sync::Arc;

use tracing::debug;

use super::{
    Arby, Boltz, Chain, ChainDaemon, ChainData, Connext, Geth, Lnd, Proxy, Service, Webui, Xud,
};
use crate::domain::Network;
use crate::error::{Result, ServiceError};
use crate::infrastructure::config::services::ServicesConfig;
use crate::port::outbound::ContainerRuntime;
use crate::port::{ApplyContext, ResolvedServices};

/// Apply inputs that do not depend on other services.
#[derive(Debug, Clone, Copy)]
pub struct ApplyInputs<'a> {
    pub network_dir: &'a Path,
    pub backup_dir: &'a Path,
    pub external_ip: Option<&'a str>,
}

pub struct ServiceRegistry {
    network: Network,
    services: Vec<Box<dyn Service>>,
    applied: bool,
}

impl ServiceRegistry {
    /// Build the fixed topology of `network`.
    pub fn for_network(network: Network, runtime: Arc<dyn ContainerRuntime>) -> Result<Self> {
        let rt = || Arc::clone(&runtime);
        let mut services: Vec<Box<dyn Service>> = vec![Box::new(Proxy::new(network, rt()))];
        if network != Network::Simnet {
            services.push(Box::new(ChainData::new(ChainDaemon::Bitcoind, network, rt())?));
            services.push(Box::new(ChainData::new(ChainDaemon::Litecoind, network, rt())?));
            services.push(Box::new(Geth::new(network, rt())));
        }
        services.push(Box::new(Lnd::new(Chain::Bitcoin, network, rt())));
        services.push(Box::new(Lnd::new(Chain::Litecoin, network, rt())));
        services.push(Box::new(Connext::new(network, rt())));
        services.push(Box::new(Xud::new(network, rt())));
        services.push(Box::new(Arby::new(network, rt())));
        if network != Network::Simnet {
            services.push(Box::new(Boltz::new(network, rt())?));
        }
        services.push(Box::new(Webui::new(network, rt())));

        Ok(Self::with_services(network, services))
    }

    /// Registry over an explicit, already ordered list.
    #[must_use]
    pub fn with_services(network: Network, services: Vec<Box<dyn Service>>) -> Self {
        Self {
            network,
            services,
            applied: false,
        }
    }

    #[must_use]
    pub const fn network(&self) -> Network {
        self.network
    }

    /// True once [`apply_all`](Self::apply_all) has succeeded.
    #[must_use]
    pub const fn is_applied(&self) -> bool {
        self.applied
    }

    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.services.iter().map(|s| s.name()).collect()
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.services.iter().any(|s| s.name() == name)
    }

    /// Look up a service by name.
    pub fn get(&self, name: &str) -> Result<&dyn Service> {
        self.services
            .iter()
            .find(|s| s.name() == name)
            .map(|s| &**s)
            .ok_or_else(|| ServiceError::UnknownService(name.to_string()).into())
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn Service> {
        self.services.iter().map(|s| &**s)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.services.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }

    /// Apply every service in registry order.
    ///
    /// Each service sees what the services before it published. On failure
    /// the registry is left unapplied.
    pub fn apply_all(
        &mut self,
        config: &ServicesConfig,
        inputs: ApplyInputs<'_>,
    ) -> Result<ResolvedServices> {
        self.applied = false;
        let mut resolved = ResolvedServices::new();
        for service in &mut self.services {
            let ctx = ApplyContext {
                network: self.network,
                network_dir: inputs.network_dir,
                backup_dir: inputs.backup_dir,
                external_ip: inputs.external_ip,
                resolved: &resolved,
            };
            service.apply(config, &ctx)?;
            debug!(
                service = %service.name(),
                image = %service.descriptor().image,
                disabled = service.is_disabled(),
                "Applied service"
            );
            let published = service.resolved();
            resolved.insert(service.name(), published);
        }
        self.applied = true;
        Ok(resolved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testkit::runtime::FakeRuntime;

    fn inputs() -> ApplyInputs<'static> {
        ApplyInputs {
            network_dir: Path::new("/home/op/.xud-docker/testnet"),
            backup_dir: Path::new("/home/op/.xud-docker/testnet/backup"),
            external_ip: None,
        }
    }

    #[test]
    fn simnet_profile_order() {
        let registry =
            ServiceRegistry::for_network(Network::Simnet, Arc::new(FakeRuntime::new())).unwrap();
        assert_eq!(
            registry.names(),
            ["proxy", "lndbtc", "lndltc", "connext", "xud", "arby", "webui"]
        );
    }

    #[test]
    fn testnet_profile_order() {
        let registry =
            ServiceRegistry::for_network(Network::Testnet, Arc::new(FakeRuntime::new())).unwrap();
        assert_eq!(
            registry.names(),
            [
                "proxy", "bitcoind", "litecoind", "geth", "lndbtc", "lndltc", "connext", "xud",
                "arby", "boltz", "webui"
            ]
        );
    }

    #[test]
    fn apply_all_resolves_every_service() {
        let mut registry =
            ServiceRegistry::for_network(Network::Testnet, Arc::new(FakeRuntime::new())).unwrap();
        assert!(!registry.is_applied());

        let resolved = registry
            .apply_all(&ServicesConfig::default(), inputs())
            .unwrap();

        assert!(registry.is_applied());
        assert_eq!(resolved.len(), registry.len());
        assert_eq!(resolved.get("bitcoind").unwrap().mode.as_deref(), Some("light"));
        assert_eq!(
            registry.get("connext").unwrap().descriptor().environment["CONNEXT_ETH_PROVIDER_URL"],
            "http://eth.kilrau.com:52041"
        );
    }

    #[test]
    fn unknown_service_lookup_fails() {
        let registry =
            ServiceRegistry::for_network(Network::Simnet, Arc::new(FakeRuntime::new())).unwrap();
        let err = registry.get("boltz").err().unwrap();
        assert_eq!(err.to_string(), "service not found: boltz");
    }
}
