use clap::Parser;
use tokio::signal;
use tokio::sync::watch;
use tracing::{error, info};

use xud_launcher::adapter::inbound::cli::command::Cli;
use xud_launcher::adapter::inbound::cli::{dispatch, output};
use xud_launcher::error::Result;
use xud_launcher::infrastructure::builder::{Launch, LaunchOptions};

/// Exit code after an operator interrupt.
const EXIT_INTERRUPTED: i32 = 130;

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();
    output::configure(output::OutputConfig::new(cli.json, cli.quiet));

    let (shutdown_tx, shutdown) = watch::channel(false);
    tokio::spawn(async move {
        if signal::ctrl_c().await.is_ok() {
            info!("Shutdown signal received");
            let _ = shutdown_tx.send(true);
            // Receivers must observe the flag, not a closed channel.
            std::future::pending::<()>().await;
        }
    });

    let code = match run(cli, shutdown).await {
        Ok(()) => 0,
        Err(e) if e.is_interrupted() => {
            output::warning("Interrupted");
            EXIT_INTERRUPTED
        }
        Err(e) => {
            error!(error = %e, "Command failed");
            output::error(&e.to_string());
            1
        }
    };
    std::process::exit(code);
}

async fn run(cli: Cli, shutdown: watch::Receiver<bool>) -> Result<()> {
    let options = LaunchOptions {
        network: cli.network,
        home_dir: cli.home_dir,
        config_file: cli.config,
        log_level: cli.log_level,
        json_logs: cli.json_logs,
    };
    let launch = Launch::load(&options)?;
    launch.config.init_logging();

    let mut coordinator = launch.coordinator(shutdown.clone()).await?;
    dispatch::execute(cli.command, &mut coordinator, shutdown).await
}
