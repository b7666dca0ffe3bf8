//! dirsync CLI
//!
//! One-way mirror of configured directories from a source root to a target
//! root, typically a removable device.

mod cli;
mod commands;
mod context;
mod error;
mod logging;

use clap::Parser;
use colored::Colorize;

use cli::{Cli, Commands};
use commands::SyncArgs;
use error::Result;

fn main() {
    if let Err(e) = run() {
        eprintln!("{}: {}", "error".red().bold(), e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    if let Err(e) = logging::init(cli.verbose) {
        eprintln!("{}: logging disabled: {}", "warning".yellow().bold(), e);
    }
    tracing::debug!(command = ?cli.command, "starting");

    let cwd = std::env::current_dir()?;
    let config = context::resolve_config(&cli.config, &cwd)?;

    match cli.command {
        Commands::Sync {
            dry_run,
            json,
            jobs,
            merged,
        } => {
            let args = SyncArgs {
                dry_run,
                json,
                jobs,
                merged,
            };
            commands::run_sync(config, &args, cli.verbose).map(drop)
        }
        Commands::Status { json, merged } => commands::run_status(config, json, merged),
    }
}
