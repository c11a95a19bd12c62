//! Command-line interface definitions.
//!
//! Global flags select the network and workspace; every subcommand then
//! operates on the stack of that network.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Lifecycle controller for the xud trading-node container stack
#[derive(Parser, Debug)]
#[command(name = "xud-launcher")]
#[command(version)]
pub struct Cli {
    /// Network profile [simnet, testnet, mainnet]
    #[arg(long, global = true, hide_possible_values = true)]
    pub network: Option<String>,

    /// Launcher home directory (default: ~/.xud-docker)
    #[arg(long, global = true)]
    pub home_dir: Option<PathBuf>,

    /// Configuration file (default: <network dir>/launcher.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log level filter, e.g. `debug` or `xud_launcher=trace`
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub json_logs: bool,

    /// JSON output for scripting
    #[arg(long, global = true)]
    pub json: bool,

    /// Decrease output verbosity
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Bring the stack up and serve gateway requests until interrupted
    Setup,

    /// Generate the compose descriptor and service inventory
    Gen,

    /// Stop all services in dependency order
    Stop,

    /// Stop services and remove containers and the network
    Down,

    /// Tear down and delete the network directory
    Cleanup(CleanupArgs),

    /// Show service status
    Status(StatusArgs),

    /// Print a service's container logs
    Logs(LogsArgs),
}

#[derive(Args, Debug)]
pub struct CleanupArgs {
    /// Delete without asking for confirmation
    #[arg(short, long)]
    pub yes: bool,
}

#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Only show this service
    pub service: Option<String>,
}

#[derive(Args, Debug)]
pub struct LogsArgs {
    /// Service name, e.g. `xud` or `lndbtc`
    pub service: String,

    /// Number of lines to show from the end of the logs
    #[arg(long)]
    pub tail: Option<usize>,

    /// Keep streaming new lines
    #[arg(short, long)]
    pub follow: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn global_flags_follow_the_subcommand() {
        let cli = Cli::try_parse_from([
            "xud-launcher",
            "status",
            "--network",
            "testnet",
            "--home-dir",
            "/srv/xud",
            "--json",
        ])
        .unwrap();
        assert_eq!(cli.network.as_deref(), Some("testnet"));
        assert_eq!(cli.home_dir, Some(PathBuf::from("/srv/xud")));
        assert!(cli.json);
        assert!(matches!(cli.command, Commands::Status(StatusArgs { service: None })));
    }

    #[test]
    fn logs_arguments() {
        let cli =
            Cli::try_parse_from(["xud-launcher", "logs", "xud", "--tail", "50", "-f"]).unwrap();
        let Commands::Logs(args) = cli.command else {
            panic!("expected logs command");
        };
        assert_eq!(args.service, "xud");
        assert_eq!(args.tail, Some(50));
        assert!(args.follow);
    }

    #[test]
    fn cleanup_defaults_to_asking() {
        let cli = Cli::try_parse_from(["xud-launcher", "cleanup"]).unwrap();
        assert!(matches!(cli.command, Commands::Cleanup(CleanupArgs { yes: false })));

        let cli = Cli::try_parse_from(["xud-launcher", "cleanup", "--yes"]).unwrap();
        assert!(matches!(cli.command, Commands::Cleanup(CleanupArgs { yes: true })));
    }

    #[test]
    fn logs_requires_a_service() {
        assert!(Cli::try_parse_from(["xud-launcher", "logs"]).is_err());
    }
}
