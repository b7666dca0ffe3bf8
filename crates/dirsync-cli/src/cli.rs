//! CLI argument parsing using clap derive

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// dirsync - Mirror configured directories from a source to a target device
#[derive(Parser, Debug)]
#[command(name = "dirsync")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(flatten)]
    pub config: ConfigArgs,

    /// The command to run
    #[command(subcommand)]
    pub command: Commands,
}

/// Where the configuration comes from, and values that override it
#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigArgs {
    /// Configuration file (YAML, TOML or JSON). Defaults to ./config.yaml
    #[arg(short, long, global = true, env = "DIRSYNC_CONFIG")]
    pub config: Option<PathBuf>,

    /// Source root, overriding SOURCE_PATH
    #[arg(long, global = true)]
    pub source: Option<PathBuf>,

    /// Target root, overriding TARGET_PATH
    #[arg(long, global = true)]
    pub target: Option<PathBuf>,

    /// Sync directory, overriding SYNC_DIRECTORIES. Repeat for several
    #[arg(long = "dir", global = true)]
    pub dirs: Vec<String>,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Copy new and newer files to the target and remove deleted ones
    ///
    /// Examples:
    ///   dirsync sync                 # Use ./config.yaml
    ///   dirsync sync --dry-run       # Show what would change
    ///   dirsync -c dev.toml sync -j4 # Four copy workers
    Sync {
        /// Preview changes without applying them
        #[arg(long)]
        dry_run: bool,

        /// Output the report as JSON for scripting
        #[arg(long)]
        json: bool,

        /// Worker threads for copying and deleting
        #[arg(short, long)]
        jobs: Option<usize>,

        /// Diff all sync directories as one tree
        #[arg(long)]
        merged: bool,
    },

    /// Show pending changes without applying them
    Status {
        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,

        /// Diff all sync directories as one tree
        #[arg(long)]
        merged: bool,
    },
}
