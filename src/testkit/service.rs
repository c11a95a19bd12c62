//! A service adapter that replays a status script.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::adapter::service::{unresolved_rpc, Service, ServiceBase};
use crate::domain::{Network, RpcDescriptor, ServiceKind, Status};
use crate::error::{Error, Result};
use crate::infrastructure::config::services::{CommonConfig, ServicesConfig};
use crate::port::outbound::ContainerRuntime;
use crate::port::ApplyContext;

/// Scripted step of a [`ScriptedService`] status probe.
pub enum Step {
    Status(Status),
    Fail(Error),
}

/// Service whose `status` pops the next scripted step; the last status
/// repeats once the script is exhausted.
pub struct ScriptedService {
    base: ServiceBase,
    script: Mutex<VecDeque<Step>>,
    last: Mutex<Status>,
    status_calls: Arc<AtomicUsize>,
    rpc: RpcDescriptor,
}

impl ScriptedService {
    pub fn new(name: &str, network: Network, runtime: Arc<dyn ContainerRuntime>) -> Self {
        Self {
            base: ServiceBase::new(name, ServiceKind::Webui, network, runtime),
            script: Mutex::new(VecDeque::new()),
            last: Mutex::new(Status::Starting),
            status_calls: Arc::new(AtomicUsize::new(0)),
            rpc: unresolved_rpc(),
        }
    }

    /// Publish `rpc` to dependents instead of an empty descriptor.
    #[must_use]
    pub fn with_rpc(mut self, rpc: RpcDescriptor) -> Self {
        self.rpc = rpc;
        self
    }

    #[must_use]
    pub fn with_statuses(self, statuses: Vec<Status>) -> Self {
        self.script
            .lock()
            .unwrap()
            .extend(statuses.into_iter().map(Step::Status));
        self
    }

    #[must_use]
    pub fn then_fail(self, error: Error) -> Self {
        self.script.lock().unwrap().push_back(Step::Fail(error));
        self
    }

    /// Number of `status` calls so far.
    pub fn status_calls(&self) -> usize {
        self.status_calls.load(Ordering::SeqCst)
    }

    /// Shared `status` call count that stays readable after the service is
    /// boxed into a registry.
    pub fn status_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.status_calls)
    }
}

#[async_trait]
impl Service for ScriptedService {
    fn base(&self) -> &ServiceBase {
        &self.base
    }

    fn apply(&mut self, _config: &ServicesConfig, ctx: &ApplyContext<'_>) -> Result<()> {
        let image = format!("exchangeunion/{}:latest", self.base.name());
        self.base
            .apply_common(&CommonConfig::default(), &image, false, ctx);
        Ok(())
    }

    fn rpc_params(&self) -> RpcDescriptor {
        self.rpc.clone()
    }

    async fn status(&self) -> Result<Status> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        let step = self.script.lock().unwrap().pop_front();
        match step {
            Some(Step::Status(status)) => {
                *self.last.lock().unwrap() = status.clone();
                Ok(status)
            }
            Some(Step::Fail(error)) => Err(error),
            None => Ok(self.last.lock().unwrap().clone()),
        }
    }
}
