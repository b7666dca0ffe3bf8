//! Reconciliation engine for dirsync
//!
//! One pass runs Preflight, builds source and target snapshots, diffs them
//! into a change set and applies it:
//!
//! - [`snapshot`]: relative path to modification time, per sync directory
//! - [`diff`]: added / updated / removed classification
//! - [`apply`]: copy and delete batches, then pruning of emptied directories
//! - [`preflight`]: target root and sync directory checks
//! - [`engine`]: the [`SyncEngine`] that strings the phases together

pub mod apply;
pub mod cancel;
pub mod config;
pub mod diff;
pub mod engine;
pub mod error;
pub mod preflight;
pub mod report;
pub mod snapshot;

pub use apply::{ApplyOptions, PhaseOutcome};
pub use cancel::CancelToken;
pub use config::{SyncConfig, SyncMode};
pub use diff::{ChangeCounts, ChangeSet};
pub use engine::{SyncEngine, SyncOptions};
pub use error::{Error, Result};
pub use report::{
    DirectoryReport, FileFailure, NullReporter, Operation, Phase, Reporter, SyncReport,
    TracingReporter,
};
pub use snapshot::{Snapshot, TargetDirs};

pub use dirsync_fs::SyncPath;
