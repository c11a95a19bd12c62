//! Compose engine backed by the `docker-compose` CLI.

use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, info};

use crate::domain::Workspace;
use crate::error::{Error, Result};
use crate::port::outbound::ComposeEngine;

/// Runs `docker-compose -p <network> -f <file>` in the network directory.
#[derive(Debug, Clone)]
pub struct DockerCompose {
    binary: String,
    project: String,
    file: PathBuf,
    workdir: PathBuf,
}

impl DockerCompose {
    #[must_use]
    pub fn new(workspace: &Workspace) -> Self {
        Self::with_binary("docker-compose", workspace)
    }

    #[must_use]
    pub fn with_binary(binary: impl Into<String>, workspace: &Workspace) -> Self {
        Self {
            binary: binary.into(),
            project: workspace.network().to_string(),
            file: workspace.compose_file(),
            workdir: workspace.network_dir().to_path_buf(),
        }
    }

    fn base_args(&self) -> Vec<String> {
        vec![
            "-p".to_string(),
            self.project.clone(),
            "-f".to_string(),
            self.file.display().to_string(),
        ]
    }

    /// Run one engine command; output is logged, never interpreted.
    async fn run(&self, command: &[&str]) -> Result<()> {
        let mut args = self.base_args();
        args.extend(command.iter().map(|arg| (*arg).to_string()));
        let rendered = format!("{} {}", self.binary, args.join(" "));
        debug!(command = %rendered, "Running compose");

        let output = Command::new(&self.binary)
            .args(&args)
            .current_dir(&self.workdir)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| Error::Command {
                command: rendered.clone(),
                message: e.to_string(),
            })?;

        for line in String::from_utf8_lossy(&output.stdout)
            .lines()
            .chain(String::from_utf8_lossy(&output.stderr).lines())
        {
            debug!(project = %self.project, "{line}");
        }

        if output.status.success() {
            Ok(())
        } else {
            Err(Error::Command {
                command: rendered,
                message: format!("exit status {}", output.status),
            })
        }
    }
}

#[async_trait]
impl ComposeEngine for DockerCompose {
    async fn up(&self, service: &str) -> Result<()> {
        info!(service, "Compose up");
        self.run(&["up", "-d", service]).await
    }

    async fn pull(&self) -> Result<()> {
        info!(project = %self.project, "Pulling images");
        self.run(&["pull"]).await
    }

    async fn down(&self) -> Result<()> {
        info!(project = %self.project, "Compose down");
        self.run(&["down"]).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Network;

    fn workspace() -> Workspace {
        Workspace::under_home(Network::Testnet, PathBuf::from("/home/op/.xud-docker"))
    }

    #[test]
    fn arguments_scope_project_and_file() {
        let compose = DockerCompose::new(&workspace());
        assert_eq!(
            compose.base_args(),
            [
                "-p",
                "testnet",
                "-f",
                "/home/op/.xud-docker/testnet/docker-compose.yml"
            ]
        );
    }

    #[tokio::test]
    async fn failed_spawn_names_the_command() {
        let dir = tempfile::tempdir().unwrap();
        let workspace = Workspace::under_home(Network::Simnet, dir.path().to_path_buf());
        std::fs::create_dir_all(workspace.network_dir()).unwrap();
        let compose = DockerCompose::with_binary("/nonexistent/docker-compose", &workspace);

        let err = compose.pull().await.unwrap_err();
        assert!(
            err.to_string().starts_with("[run] /nonexistent/docker-compose -p simnet"),
            "{err}"
        );
    }
}
