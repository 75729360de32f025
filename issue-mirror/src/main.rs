pub mod asana;
pub mod backend;
pub mod commands;
pub mod config;
pub mod discovery;
pub mod dry_run;
pub mod error;
pub mod fetcher;
pub mod gitlab;
pub mod logging;
pub mod matcher;
pub mod pagination;
pub mod reconcile;
pub mod reference;
pub mod render;
pub mod sync;
pub mod types;

#[cfg(test)]
mod testing;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use commands::sync::SyncArgs;
use commands::TargetArgs;
use types::LogFormat;

#[derive(Parser)]
#[command(
    name = "issue-mirror",
    version,
    about = "Mirror GitLab issues into Asana subtasks",
    long_about = "issue-mirror finds Asana tasks whose custom field lists GitLab issues \
                  (group/project#123), mirrors each issue as a subtask, keeps the subtask's \
                  comments in step with the issue's notes and mirrors open/closed state onto \
                  completion. Every run is a full, idempotent pass."
)]
struct Cli {
    /// Path to issue-mirror.config.yaml (default: walk up from the current directory)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log format: text or json
    #[arg(long, global = true, default_value = "text", value_name = "FORMAT")]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run one full reconciliation pass (default)
    Sync(SyncArgs),

    /// Run discovery only and print which tasks reference which issues
    Index(TargetArgs),

    /// Show the effective configuration
    Config,

    /// Check configuration, credentials and Asana lookups
    Doctor(TargetArgs),
}

fn main() {
    let cli = Cli::parse();
    logging::init_tracing(cli.verbose, cli.log_format);

    let config_path = cli.config.as_deref();

    match cli.command.unwrap_or_else(|| Command::Sync(SyncArgs::default())) {
        Command::Sync(args) => {
            if let Err(e) = commands::sync::run(config_path, &args) {
                eprintln!("Sync error: {:#}", e);
                std::process::exit(1);
            }
        }
        Command::Index(target) => {
            if let Err(e) = commands::index::run(config_path, &target) {
                eprintln!("Index error: {:#}", e);
                std::process::exit(1);
            }
        }
        Command::Config => {
            if let Err(e) = commands::config::run(config_path) {
                eprintln!("Config error: {:#}", e);
                std::process::exit(1);
            }
        }
        Command::Doctor(target) => {
            if let Err(e) = commands::doctor::run(config_path, &target) {
                eprintln!("Doctor error: {:#}", e);
                std::process::exit(1);
            }
        }
    }
}
