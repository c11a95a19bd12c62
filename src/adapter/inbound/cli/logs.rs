//! Handler for the `logs` command.

use tokio::sync::watch;
use tracing::debug;

use crate::adapter::inbound::cli::output;
use crate::application::Coordinator;
use crate::error::{Error, Result};

pub async fn execute(
    coordinator: &Coordinator,
    service: &str,
    tail: Option<usize>,
    follow: bool,
    mut shutdown: watch::Receiver<bool>,
) -> Result<()> {
    if !follow {
        for line in coordinator.logs(service, tail).await? {
            output::log_line(service, &line);
        }
        return Ok(());
    }

    let mut stream = coordinator.follow_logs(service, tail).await?;
    loop {
        tokio::select! {
            line = stream.lines.recv() => match line {
                Some(line) => output::log_line(service, &line),
                None => break,
            },
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    stream.task.abort();
                    return Err(Error::Interrupted);
                }
            }
        }
    }
    debug!(service, "Log stream ended");
    stream
        .task
        .await
        .map_err(|e| Error::Connection(format!("log stream task: {e}")))?
}
