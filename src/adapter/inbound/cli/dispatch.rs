//! Routes a parsed subcommand to its handler.

use tokio::sync::watch;

use crate::adapter::inbound::cli::command::Commands;
use crate::adapter::inbound::cli::{lifecycle, logs, setup, status};
use crate::application::Coordinator;
use crate::error::Result;

/// Run `command` until it completes or `shutdown` interrupts it.
pub async fn execute(
    command: Commands,
    coordinator: &mut Coordinator,
    shutdown: watch::Receiver<bool>,
) -> Result<()> {
    match command {
        Commands::Setup => setup::execute(coordinator, shutdown).await,
        Commands::Gen => lifecycle::gen(coordinator).await,
        Commands::Stop => lifecycle::stop(coordinator).await,
        Commands::Down => lifecycle::down(coordinator).await,
        Commands::Cleanup(args) => lifecycle::cleanup(coordinator, args.yes).await,
        Commands::Status(args) => status::execute(coordinator, args.service.as_deref()).await,
        Commands::Logs(args) => {
            logs::execute(coordinator, &args.service, args.tail, args.follow, shutdown).await
        }
    }
}
