//! Container runtime port.
//!
//! The runtime owns container identity; the launcher addresses containers by
//! the `<network>_<service>_1` name the compose engine assigns.

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::error::Result;

/// Coarse container state as reported by inspect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerState {
    /// `created`, `running`, `exited`, `restarting`, ...
    pub status: String,
    /// RFC 3339 start timestamp, usable as a log `since` filter.
    pub started_at: String,
}

impl ContainerState {
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.status == "running"
    }
}

/// A live log stream owned by a background task.
///
/// The task ends when the container stops producing output or the receiver is
/// dropped; its handle is the stream's completion signal.
pub struct LogFollow {
    pub lines: mpsc::Receiver<String>,
    pub task: JoinHandle<Result<()>>,
}

/// Primitive operations on single containers and networks.
#[async_trait]
pub trait ContainerRuntime: Send + Sync {
    /// Inspect a container; `None` when no such container exists.
    async fn inspect(&self, container: &str) -> Result<Option<ContainerState>>;

    /// Stop a running container.
    ///
    /// Fails with [`Error::NoSuchContainer`](crate::error::Error::NoSuchContainer)
    /// when the container does not exist.
    async fn stop(&self, container: &str) -> Result<()>;

    /// Force-remove a container.
    async fn remove(&self, container: &str) -> Result<()>;

    /// Fetch log lines of both output streams, oldest first.
    async fn logs(&self, container: &str, since: Option<&str>, tail: Option<usize>)
        -> Result<Vec<String>>;

    /// Stream log lines until the container stops or the receiver is dropped.
    async fn follow_logs(&self, container: &str, tail: Option<usize>) -> Result<LogFollow>;

    /// Run a command inside a running container and return combined output.
    ///
    /// A non-zero exit code fails with [`Error::Exec`](crate::error::Error::Exec)
    /// carrying the captured output.
    async fn exec(&self, container: &str, command: &[&str]) -> Result<String>;

    /// True when the named network exists.
    async fn network_exists(&self, network: &str) -> Result<bool>;

    async fn remove_network(&self, network: &str) -> Result<()>;
}
