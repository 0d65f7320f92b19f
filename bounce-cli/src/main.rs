//! Bounce CLI - Command-line interface
//!
//! Runs the time reference server, prints trajectories, or acts as a
//! headless viewer.

mod commands;

use std::path::PathBuf;

use bounce_core::tracing_setup::{CliLogLevel, init_tracing};
use clap::Parser;

#[derive(Parser)]
#[command(name = "bounce")]
#[command(about = "Synchronised bouncing-logo screensaver")]
struct Cli {
    #[command(subcommand)]
    command: commands::Commands,

    /// Console log level
    #[arg(long, global = true, value_enum, default_value_t = CliLogLevel::Info)]
    log_level: CliLogLevel,

    /// Also write a full trace log to this file
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.log_level.as_tracing_level(), cli.log_file.as_deref())
        .map_err(|e| anyhow::anyhow!("failed to initialise tracing: {e}"))?;

    commands::handle_command(cli.command).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "bounce",
            "simulate",
            "--seed",
            "abc",
            "--to",
            "5",
            "--log-level",
            "debug",
        ])
        .unwrap();
        assert_eq!(cli.log_level, CliLogLevel::Debug);
        assert!(matches!(
            cli.command,
            commands::Commands::Simulate { ref seed, from: 0, to: 5, step: 1, .. } if seed == "abc"
        ));
    }

    #[test]
    fn test_watch_rejects_zero_fps() {
        assert!(Cli::try_parse_from(["bounce", "watch", "--seed", "x", "--fps", "0"]).is_err());
    }
}
