mod commands;
mod config;
mod logging;
mod render;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use calsync_core::SyncError;
use clap::{Parser, Subcommand};
use owo_colors::OwoColorize;
use tracing::error;

use crate::commands::sync::SyncArgs;
use crate::config::AppConfig;

#[derive(Parser)]
#[command(name = "calsync", version)]
#[command(about = "Sync upcoming appointments from a local calendar into Google Calendar")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Number of days to sync, starting today (overrides sync.window_days)
    #[arg(long)]
    days: Option<u32>,

    /// Show what would be updated and inserted without writing anything
    #[arg(long)]
    dry_run: bool,

    /// Config file (default: <config dir>/calsync/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Debug logging and full event listings
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Authorize with Google again, replacing the cached token
    Auth,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = logging::init(cli.verbose) {
        eprintln!("{:#}", e);
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let code = exit_code(&e);
            error!(kind = e.downcast_ref::<SyncError>().map(SyncError::kind), "run failed");
            eprintln!("{} {:#}", "error:".red(), e);
            ExitCode::from(code)
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = AppConfig::load(cli.config.as_deref())?;

    match cli.command {
        Some(Commands::Auth) => commands::auth::run(&config).await,
        None => {
            let args = SyncArgs {
                days: cli.days,
                dry_run: cli.dry_run,
                verbose: cli.verbose,
            };
            commands::sync::run(&config, args).await
        }
    }
}

/// Kind-specific code for sync failures, 1 for anything else.
fn exit_code(error: &anyhow::Error) -> u8 {
    error
        .downcast_ref::<SyncError>()
        .map(SyncError::exit_code)
        .unwrap_or(1)
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
    fn bare_invocation_is_a_sync() {
        let cli = Cli::try_parse_from(["calsync"]).unwrap();

        assert!(cli.command.is_none());
        assert!(!cli.dry_run);
        assert_eq!(cli.days, None);
    }

    #[test]
    fn sync_flags_parse() {
        let cli = Cli::try_parse_from(["calsync", "--days", "14", "--dry-run", "-v"]).unwrap();

        assert_eq!(cli.days, Some(14));
        assert!(cli.dry_run);
        assert!(cli.verbose);
    }

    #[test]
    fn auth_subcommand_accepts_config() {
        let cli = Cli::try_parse_from(["calsync", "auth", "--config", "/tmp/c.toml"]).unwrap();

        assert!(matches!(cli.command, Some(Commands::Auth)));
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/c.toml")));
    }

    #[test]
    fn exit_code_follows_error_kind() {
        let auth = anyhow::Error::new(SyncError::auth("denied"));
        let wrapped = anyhow::Error::new(SyncError::Config("bad".into())).context("loading");
        let other = anyhow::anyhow!("boom");

        assert_eq!(exit_code(&auth), 77);
        assert_eq!(exit_code(&wrapped), 78);
        assert_eq!(exit_code(&other), 1);
    }
}
