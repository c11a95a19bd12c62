//! A coordinator over scripted services sharing one fake runtime.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use xud_launcher::adapter::service::{Service, ServiceRegistry};
use xud_launcher::application::{Coordinator, CoordinatorDeps, Poller};
use xud_launcher::domain::{GatewayRpc, Network, Protocol, RpcDescriptor, Status, Workspace};
use xud_launcher::error::Error;
use xud_launcher::infrastructure::config::ServicesConfig;
use xud_launcher::testkit::runtime::{FakeRuntime, RecordingCompose};
use xud_launcher::testkit::service::ScriptedService;
use xud_launcher::testkit::wallet::ScriptedWalletApi;

pub struct Stack {
    pub dir: tempfile::TempDir,
    pub runtime: Arc<FakeRuntime>,
    pub compose: Arc<RecordingCompose>,
    pub wallet: Arc<ScriptedWalletApi>,
    pub shutdown: watch::Sender<bool>,
    pub coordinator: Coordinator,
}

pub struct StackBuilder {
    network: Network,
    gateway_port: u16,
    services: Vec<(String, Vec<Status>, Option<Error>)>,
}

impl StackBuilder {
    pub fn new(network: Network) -> Self {
        Self {
            network,
            gateway_port: 28889,
            services: Vec::new(),
        }
    }

    pub fn gateway_port(mut self, port: u16) -> Self {
        self.gateway_port = port;
        self
    }

    pub fn service(mut self, name: &str, statuses: Vec<Status>) -> Self {
        self.services.push((name.to_string(), statuses, None));
        self
    }

    /// A service that errors once `statuses` are used up.
    pub fn failing(mut self, name: &str, statuses: Vec<Status>, error: Error) -> Self {
        self.services.push((name.to_string(), statuses, Some(error)));
        self
    }

    pub fn build(self) -> Stack {
        let dir = tempfile::tempdir().unwrap();
        let runtime = Arc::new(FakeRuntime::new());
        let compose = Arc::new(RecordingCompose::new(self.network, runtime.clone()));
        let wallet = Arc::new(ScriptedWalletApi::new());
        let (shutdown, rx) = watch::channel(false);

        let gateway = RpcDescriptor::Gateway(GatewayRpc {
            protocol: Protocol::Http,
            scheme: "http".into(),
            port: self.gateway_port,
        });
        let services: Vec<Box<dyn Service>> = self
            .services
            .into_iter()
            .map(|(name, statuses, error)| {
                let mut service = ScriptedService::new(&name, self.network, runtime.clone())
                    .with_statuses(statuses);
                if name == "proxy" {
                    service = service.with_rpc(gateway.clone());
                }
                if let Some(error) = error {
                    service = service.then_fail(error);
                }
                Box::new(service) as Box<dyn Service>
            })
            .collect();

        let deps = CoordinatorDeps {
            workspace: Workspace::under_home(self.network, dir.path().to_path_buf()),
            config: ServicesConfig::default(),
            backup_dir: None,
            external_ip: None,
            runtime: runtime.clone(),
            compose: compose.clone(),
            wallet: wallet.clone(),
            poller: Poller::new(Duration::from_millis(5), rx),
        };
        let registry = ServiceRegistry::with_services(self.network, services);
        Stack {
            dir,
            coordinator: Coordinator::with_registry(deps, registry),
            runtime,
            compose,
            wallet,
            shutdown,
        }
    }
}

/// Every service of the simnet profile, ready on first probe.
pub fn ready_simnet() -> StackBuilder {
    StackBuilder::new(Network::Simnet)
        .service("proxy", vec![Status::Ready])
        .service("lndbtc", vec![Status::Ready])
        .service("lndltc", vec![Status::Ready])
        .service("connext", vec![Status::Ready])
        .service("xud", vec![Status::Ready])
}
