//! Handlers for `gen`, `stop`, `down` and `cleanup`.

use std::path::Path;

use dialoguer::theme::ColorfulTheme;
use dialoguer::Confirm;
use serde_json::json;

use crate::adapter::inbound::cli::output;
use crate::application::Coordinator;
use crate::error::Result;

pub async fn gen(coordinator: &mut Coordinator) -> Result<()> {
    coordinator.gen().await?;
    let workspace = coordinator.workspace();
    if output::is_json() {
        output::json_output(json!({
            "command": "gen",
            "compose": workspace.compose_file().display().to_string(),
            "inventory": workspace.inventory_file().display().to_string(),
        }));
        return Ok(());
    }
    output::success("Generated files");
    output::field("Compose", workspace.compose_file().display());
    output::field("Inventory", workspace.inventory_file().display());
    Ok(())
}

pub async fn stop(coordinator: &mut Coordinator) -> Result<()> {
    let pb = output::spinner("Stopping services");
    match coordinator.stop().await {
        Ok(()) => {
            output::spinner_success(&pb, "Stopped");
            Ok(())
        }
        Err(e) => {
            output::spinner_fail(&pb, "Stop failed");
            Err(e)
        }
    }
}

pub async fn down(coordinator: &mut Coordinator) -> Result<()> {
    let pb = output::spinner("Shutting down");
    match coordinator.down().await {
        Ok(()) => {
            output::spinner_success(&pb, "Containers and network removed");
            Ok(())
        }
        Err(e) => {
            output::spinner_fail(&pb, "Shutdown failed");
            Err(e)
        }
    }
}

pub async fn cleanup(coordinator: &mut Coordinator, yes: bool) -> Result<()> {
    let removed = coordinator
        .cleanup(|dir| yes || confirm_removal(dir))
        .await?;
    let dir = coordinator.workspace().network_dir().display().to_string();
    if output::is_json() {
        output::json_output(json!({
            "command": "cleanup",
            "directory": dir,
            "removed": removed,
        }));
    } else if removed {
        output::success(&format!("Removed {dir}"));
    } else {
        output::note(&format!("Kept {dir}"));
    }
    Ok(())
}

/// Ask before deleting. A prompt that cannot be answered counts as "no".
fn confirm_removal(dir: &Path) -> bool {
    Confirm::with_theme(&ColorfulTheme::default())
        .with_prompt(format!("Delete {}?", dir.display()))
        .default(false)
        .interact()
        .unwrap_or(false)
}
