//! Container runtime backed by the `docker` CLI.

use std::process::Stdio;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc;
use tracing::{debug, trace};

use crate::error::{Error, ExecError, Result};
use crate::port::outbound::{ContainerRuntime, ContainerState, LogFollow};

/// Buffered lines of a followed log stream.
const FOLLOW_BUFFER: usize = 256;

/// Captured result of one CLI invocation.
struct Captured {
    exit_code: Option<i32>,
    stdout: String,
    stderr: String,
}

impl Captured {
    fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    fn is_no_such(&self) -> bool {
        self.stderr.contains("No such container") || self.stderr.contains("No such object")
    }

    /// Stdout followed by stderr.
    fn combined(&self) -> String {
        let mut out = self.stdout.clone();
        out.push_str(&self.stderr);
        out
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct InspectState {
    status: String,
    #[serde(default)]
    started_at: String,
}

/// Drives containers through the `docker` binary.
#[derive(Debug, Clone)]
pub struct DockerCli {
    binary: String,
}

impl Default for DockerCli {
    fn default() -> Self {
        Self::new("docker")
    }
}

impl DockerCli {
    #[must_use]
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    async fn run(&self, args: &[&str]) -> Result<Captured> {
        trace!(binary = %self.binary, ?args, "Running");
        let output = Command::new(&self.binary)
            .args(args)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| Error::Command {
                command: format!("{} {}", self.binary, args.join(" ")),
                message: e.to_string(),
            })?;
        Ok(Captured {
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }

    fn failure(&self, args: &[&str], captured: &Captured) -> Error {
        Error::Command {
            command: format!("{} {}", self.binary, args.join(" ")),
            message: captured.stderr.trim().to_string(),
        }
    }

    /// Run a container command, mapping a missing container to
    /// [`Error::NoSuchContainer`].
    async fn run_on(&self, container: &str, args: &[&str]) -> Result<Captured> {
        let captured = self.run(args).await?;
        if captured.success() {
            Ok(captured)
        } else if captured.is_no_such() {
            Err(Error::NoSuchContainer(container.to_string()))
        } else {
            Err(self.failure(args, &captured))
        }
    }
}

fn logs_args<'a>(
    container: &'a str,
    since: Option<&'a str>,
    tail: Option<&'a str>,
    follow: bool,
) -> Vec<&'a str> {
    let mut args = vec!["logs"];
    if follow {
        args.push("--follow");
    } else {
        args.push("--timestamps");
    }
    if let Some(since) = since {
        args.extend(["--since", since]);
    }
    if let Some(tail) = tail {
        args.extend(["--tail", tail]);
    }
    args.push(container);
    args
}

/// Interleave timestamped stdout and stderr lines into one chronological
/// list with the timestamps stripped. Each stream is already in order; on a
/// tie stdout goes first.
fn merge_timestamped(stdout: &str, stderr: &str) -> Vec<String> {
    fn split(line: &str) -> (&str, &str) {
        line.split_once(' ').unwrap_or((line, ""))
    }

    let mut out = stdout.lines().map(split).peekable();
    let mut err = stderr.lines().map(split).peekable();
    let mut merged = Vec::new();
    loop {
        let from_err = match (out.peek(), err.peek()) {
            (Some((a, _)), Some((b, _))) => b < a,
            (Some(_), None) => false,
            (None, Some(_)) => true,
            (None, None) => break,
        };
        let next = if from_err { err.next() } else { out.next() };
        if let Some((_, line)) = next {
            merged.push(line.to_string());
        }
    }
    merged
}

#[async_trait]
impl ContainerRuntime for DockerCli {
    async fn inspect(&self, container: &str) -> Result<Option<ContainerState>> {
        let args = [
            "inspect",
            "--type",
            "container",
            "--format",
            "{{json .State}}",
            container,
        ];
        match self.run_on(container, &args).await {
            Ok(captured) => {
                let state: InspectState = serde_json::from_str(captured.stdout.trim())?;
                Ok(Some(ContainerState {
                    status: state.status,
                    started_at: state.started_at,
                }))
            }
            Err(Error::NoSuchContainer(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn stop(&self, container: &str) -> Result<()> {
        debug!(container, "docker stop");
        self.run_on(container, &["stop", container]).await?;
        Ok(())
    }

    async fn remove(&self, container: &str) -> Result<()> {
        debug!(container, "docker rm");
        self.run_on(container, &["rm", "--force", container]).await?;
        Ok(())
    }

    async fn logs(
        &self,
        container: &str,
        since: Option<&str>,
        tail: Option<usize>,
    ) -> Result<Vec<String>> {
        let tail = tail.map(|n| n.to_string());
        let args = logs_args(container, since, tail.as_deref(), false);
        let captured = self.run_on(container, &args).await?;
        Ok(merge_timestamped(&captured.stdout, &captured.stderr))
    }

    async fn follow_logs(&self, container: &str, tail: Option<usize>) -> Result<LogFollow> {
        let tail = tail.map(|n| n.to_string());
        let args = logs_args(container, None, tail.as_deref(), true);
        let mut child = Command::new(&self.binary)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| Error::Command {
                command: format!("{} {}", self.binary, args.join(" ")),
                message: e.to_string(),
            })?;

        let stdout = child.stdout.take().ok_or_else(|| Error::Command {
            command: format!("{} logs", self.binary),
            message: "stdout not captured".to_string(),
        })?;
        let stderr = child.stderr.take().ok_or_else(|| Error::Command {
            command: format!("{} logs", self.binary),
            message: "stderr not captured".to_string(),
        })?;

        let (tx, rx) = mpsc::channel(FOLLOW_BUFFER);
        let task = tokio::spawn(async move {
            let mut out = BufReader::new(stdout).lines();
            let mut err = BufReader::new(stderr).lines();
            let (mut out_open, mut err_open) = (true, true);
            loop {
                let line = tokio::select! {
                    line = out.next_line(), if out_open => {
                        let line = line?;
                        out_open = line.is_some();
                        line
                    }
                    line = err.next_line(), if err_open => {
                        let line = line?;
                        err_open = line.is_some();
                        line
                    }
                    else => break,
                };
                if let Some(line) = line {
                    if tx.send(line).await.is_err() {
                        break;
                    }
                }
            }
            child.kill().await.ok();
            Ok::<_, Error>(())
        });
        Ok(LogFollow { lines: rx, task })
    }

    async fn exec(&self, container: &str, command: &[&str]) -> Result<String> {
        let mut args = vec!["exec", container];
        args.extend_from_slice(command);
        let captured = self.run(&args).await?;
        if captured.success() {
            return Ok(captured.combined());
        }
        if captured.is_no_such() {
            return Err(Error::NoSuchContainer(container.to_string()));
        }
        Err(ExecError {
            command: command.join(" "),
            exit_code: captured.exit_code.unwrap_or(-1),
            output: captured.combined(),
        }
        .into())
    }

    async fn network_exists(&self, network: &str) -> Result<bool> {
        let args = ["network", "inspect", network];
        let captured = self.run(&args).await?;
        if captured.success() {
            Ok(true)
        } else if captured.stderr.contains("No such network") || captured.is_no_such() {
            Ok(false)
        } else {
            Err(self.failure(&args, &captured))
        }
    }

    async fn remove_network(&self, network: &str) -> Result<()> {
        debug!(network, "docker network rm");
        let args = ["network", "rm", network];
        let captured = self.run(&args).await?;
        if captured.success() || captured.stderr.contains("No such network") {
            Ok(())
        } else {
            Err(self.failure(&args, &captured))
        }
    }
}
