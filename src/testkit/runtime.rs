//! In-memory container runtime and compose engine.
//!
//! - [`FakeRuntime`] - Container states, exec replies and log lines are set
//!   by the test; every mutating call is recorded.
//! - [`RecordingCompose`] - Records engine calls and marks containers as
//!   running on `up`, so status probes see the effect.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::domain::Network;
use crate::error::{Error, ExecError, Result};
use crate::port::outbound::{ComposeEngine, ContainerRuntime, ContainerState, LogFollow};

/// Scripted outcome of one `exec`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecReply {
    Ok(String),
    /// Non-zero exit with the given output.
    Fail(String),
}

impl ExecReply {
    pub fn ok(output: &str) -> Self {
        Self::Ok(output.to_string())
    }

    pub fn fail(output: &str) -> Self {
        Self::Fail(output.to_string())
    }
}

#[derive(Default)]
struct RuntimeState {
    containers: HashMap<String, ContainerState>,
    scripts: HashMap<(String, String), VecDeque<ExecReply>>,
    logs: HashMap<String, Vec<String>>,
    networks: HashSet<String>,
    calls: Vec<String>,
}

/// Container runtime backed by in-memory state.
///
/// Exec replies are consumed in order per `(container, command)`; the last
/// reply repeats once the script is exhausted. Unscripted commands fail with
/// exit code 127.
#[derive(Default)]
pub struct FakeRuntime {
    state: Mutex<RuntimeState>,
}

impl FakeRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, RuntimeState> {
        self.state.lock().unwrap()
    }

    /// Create or update a container with the given coarse status.
    pub fn set_state(&self, container: &str, status: &str) {
        self.lock().containers.insert(
            container.to_string(),
            ContainerState {
                status: status.to_string(),
                started_at: "2020-11-01T00:00:00Z".to_string(),
            },
        );
    }

    pub fn remove_state(&self, container: &str) {
        self.lock().containers.remove(container);
    }

    /// Coarse status of a container, if it exists.
    pub fn state_of(&self, container: &str) -> Option<String> {
        self.lock()
            .containers
            .get(container)
            .map(|state| state.status.clone())
    }

    /// Replace the exec script of `command` (space-joined) in `container`.
    pub fn script_exec(&self, container: &str, command: &str, replies: Vec<ExecReply>) {
        self.lock()
            .scripts
            .insert((container.to_string(), command.to_string()), replies.into());
    }

    pub fn set_logs(&self, container: &str, lines: &[&str]) {
        self.lock().logs.insert(
            container.to_string(),
            lines.iter().map(|l| (*l).to_string()).collect(),
        );
    }

    pub fn add_network(&self, network: &str) {
        self.lock().networks.insert(network.to_string());
    }

    /// Mutating calls in the order they were made, e.g. `stop testnet_xud_1`.
    pub fn calls(&self) -> Vec<String> {
        self.lock().calls.clone()
    }

    fn record(&self, call: String) {
        self.lock().calls.push(call);
    }
}

#[async_trait]
impl ContainerRuntime for FakeRuntime {
    async fn inspect(&self, container: &str) -> Result<Option<ContainerState>> {
        Ok(self.lock().containers.get(container).cloned())
    }

    async fn stop(&self, container: &str) -> Result<()> {
        self.record(format!("stop {container}"));
        let mut state = self.lock();
        match state.containers.get_mut(container) {
            Some(existing) => {
                existing.status = "exited".to_string();
                Ok(())
            }
            None => Err(Error::NoSuchContainer(container.to_string())),
        }
    }

    async fn remove(&self, container: &str) -> Result<()> {
        self.record(format!("remove {container}"));
        match self.lock().containers.remove(container) {
            Some(_) => Ok(()),
            None => Err(Error::NoSuchContainer(container.to_string())),
        }
    }

    async fn logs(
        &self,
        container: &str,
        _since: Option<&str>,
        tail: Option<usize>,
    ) -> Result<Vec<String>> {
        let lines = self.lock().logs.get(container).cloned().unwrap_or_default();
        Ok(match tail {
            Some(n) if n < lines.len() => lines[lines.len() - n..].to_vec(),
            _ => lines,
        })
    }

    async fn follow_logs(&self, container: &str, tail: Option<usize>) -> Result<LogFollow> {
        let lines = self.logs(container, None, tail).await?;
        let (tx, rx) = mpsc::channel(16);
        let task = tokio::spawn(async move {
            for line in lines {
                if tx.send(line).await.is_err() {
                    break;
                }
            }
            Ok(())
        });
        Ok(LogFollow { lines: rx, task })
    }

    async fn exec(&self, container: &str, command: &[&str]) -> Result<String> {
        let joined = command.join(" ");
        self.record(format!("exec {container} {joined}"));
        let reply = {
            let mut state = self.lock();
            let key = (container.to_string(), joined.clone());
            state.scripts.get_mut(&key).and_then(|script| {
                if script.len() > 1 {
                    script.pop_front()
                } else {
                    script.front().cloned()
                }
            })
        };
        match reply {
            Some(ExecReply::Ok(output)) => Ok(output),
            Some(ExecReply::Fail(output)) => Err(ExecError {
                command: joined,
                exit_code: 1,
                output,
            }
            .into()),
            None => Err(ExecError {
                command: joined.clone(),
                exit_code: 127,
                output: format!("unscripted command: {joined}"),
            }
            .into()),
        }
    }

    async fn network_exists(&self, network: &str) -> Result<bool> {
        Ok(self.lock().networks.contains(network))
    }

    async fn remove_network(&self, network: &str) -> Result<()> {
        self.record(format!("remove_network {network}"));
        self.lock().networks.remove(network);
        Ok(())
    }
}

/// Compose engine that records calls against a [`FakeRuntime`].
pub struct RecordingCompose {
    network: Network,
    runtime: Arc<FakeRuntime>,
    calls: Mutex<Vec<String>>,
    failures: Mutex<HashMap<String, String>>,
}

impl RecordingCompose {
    pub fn new(network: Network, runtime: Arc<FakeRuntime>) -> Self {
        Self {
            network,
            runtime,
            calls: Mutex::new(Vec::new()),
            failures: Mutex::new(HashMap::new()),
        }
    }

    /// Make `up <service>` fail with `message`.
    pub fn fail_up(&self, service: &str, message: &str) {
        self.failures
            .lock()
            .unwrap()
            .insert(service.to_string(), message.to_string());
    }

    /// Calls in order: `up <service>`, `pull`, `down`.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn container(&self, service: &str) -> String {
        format!("{}_{service}_1", self.network)
    }
}

#[async_trait]
impl ComposeEngine for RecordingCompose {
    async fn up(&self, service: &str) -> Result<()> {
        self.calls.lock().unwrap().push(format!("up {service}"));
        if let Some(message) = self.failures.lock().unwrap().get(service) {
            return Err(Error::Command {
                command: format!("up {service}"),
                message: message.clone(),
            });
        }
        self.runtime.set_state(&self.container(service), "running");
        self.runtime.add_network(&format!("{}_default", self.network));
        Ok(())
    }

    async fn pull(&self) -> Result<()> {
        self.calls.lock().unwrap().push("pull".to_string());
        Ok(())
    }

    async fn down(&self) -> Result<()> {
        self.calls.lock().unwrap().push("down".to_string());
        let prefix = format!("{}_", self.network);
        let containers: Vec<String> = self
            .runtime
            .lock()
            .containers
            .keys()
            .filter(|name| name.starts_with(&prefix))
            .cloned()
            .collect();
        for container in containers {
            self.runtime.remove_state(&container);
        }
        self.runtime
            .lock()
            .networks
            .remove(&format!("{}_default", self.network));
        Ok(())
    }
}
