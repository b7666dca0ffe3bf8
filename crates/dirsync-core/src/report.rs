//! Reporting interface and structured pass results
//!
//! Components never print. They call an injected [`Reporter`] as work
//! happens, and the engine returns a [`SyncReport`] the caller formats.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use dirsync_fs::SyncPath;

use crate::apply::PhaseOutcome;
use crate::diff::{ChangeCounts, ChangeSet};

/// Phases of one pass, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Preflight,
    Snapshot,
    Diff,
    Copy,
    Delete,
    Prune,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Preflight => "preflight",
            Self::Snapshot => "snapshot",
            Self::Diff => "diff",
            Self::Copy => "copy",
            Self::Delete => "delete",
            Self::Prune => "prune",
        };
        f.write_str(name)
    }
}

/// File operation a failure belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    /// Reading a tree into a snapshot
    Scan,
    Copy,
    Delete,
    Prune,
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Scan => "scan",
            Self::Copy => "copy",
            Self::Delete => "delete",
            Self::Prune => "prune",
        };
        f.write_str(name)
    }
}

/// A single path that could not be scanned, copied, deleted or pruned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileFailure {
    pub path: SyncPath,
    pub operation: Operation,
    pub cause: String,
}

impl std::fmt::Display for FileFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}: {}", self.operation, self.path, self.cause)
    }
}

/// Receives progress events during a pass.
///
/// Shared by apply workers, hence `Send + Sync`. Every method has an empty
/// default so implementations pick the events they care about.
pub trait Reporter: Send + Sync {
    fn phase_started(&self, _phase: Phase, _scope: &str) {}
    fn directory_created(&self, _name: &str) {}
    fn changes_detected(&self, _scope: &str, _changes: &ChangeSet) {}
    fn file_copied(&self, _path: &SyncPath) {}
    fn file_deleted(&self, _path: &SyncPath) {}
    fn directory_pruned(&self, _path: &Path) {}
    fn operation_failed(&self, _failure: &FileFailure) {}
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullReporter;

impl Reporter for NullReporter {}

/// Emits every event as a `tracing` event.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn phase_started(&self, phase: Phase, scope: &str) {
        info!(%phase, scope, "phase started");
    }

    fn directory_created(&self, name: &str) {
        info!(directory = name, "created sync directory on target");
    }

    fn changes_detected(&self, scope: &str, changes: &ChangeSet) {
        let counts = changes.counts();
        info!(
            scope,
            added = counts.added,
            updated = counts.updated,
            removed = counts.removed,
            "changes detected"
        );
    }

    fn file_copied(&self, path: &SyncPath) {
        debug!(%path, "copied");
    }

    fn file_deleted(&self, path: &SyncPath) {
        debug!(%path, "deleted");
    }

    fn directory_pruned(&self, path: &Path) {
        debug!(path = %path.display(), "pruned");
    }

    fn operation_failed(&self, failure: &FileFailure) {
        warn!(
            path = %failure.path,
            operation = %failure.operation,
            cause = %failure.cause,
            "file operation failed"
        );
    }
}

/// Result of reconciling one sync directory (or the merged set).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryReport {
    /// Sync directory name, or the comma-joined names in merged mode
    pub name: String,
    pub changes: ChangeSet,
    pub copied: Vec<SyncPath>,
    pub deleted: Vec<SyncPath>,
    pub pruned: Vec<PathBuf>,
    pub failures: Vec<FileFailure>,
    /// Paths not attempted because the pass was cancelled
    pub skipped: Vec<SyncPath>,
    /// Why the directory could not be snapshotted, if it could not
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DirectoryReport {
    pub fn new(name: impl Into<String>, changes: ChangeSet) -> Self {
        Self {
            name: name.into(),
            changes,
            ..Self::default()
        }
    }

    /// A directory whose snapshot could not be built.
    pub fn failed(name: impl Into<String>, error: impl std::fmt::Display) -> Self {
        Self {
            name: name.into(),
            error: Some(error.to_string()),
            ..Self::default()
        }
    }

    pub(crate) fn record_copies(&mut self, outcome: PhaseOutcome) {
        self.copied = outcome.completed;
        self.failures.extend(outcome.failures);
        self.skipped.extend(outcome.skipped);
    }

    pub(crate) fn record_deletes(&mut self, outcome: PhaseOutcome) {
        self.deleted = outcome.completed;
        self.pruned = outcome.pruned;
        self.failures.extend(outcome.failures);
        self.skipped.extend(outcome.skipped);
    }
}

/// Result of one complete pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncReport {
    /// Nothing was written to the target
    pub dry_run: bool,
    /// Sync directories created (or, in a dry run, missing) on the target
    pub created_dirs: Vec<String>,
    pub directories: Vec<DirectoryReport>,
    /// Cancellation was requested before the pass finished
    pub cancelled: bool,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl SyncReport {
    pub(crate) fn begin(dry_run: bool) -> Self {
        let now = Utc::now();
        Self {
            dry_run,
            created_dirs: Vec::new(),
            directories: Vec::new(),
            cancelled: false,
            started_at: now,
            finished_at: now,
        }
    }

    pub(crate) fn finish(mut self) -> Self {
        self.finished_at = Utc::now();
        self
    }

    /// Change counts summed over every directory.
    pub fn counts(&self) -> ChangeCounts {
        let mut total = ChangeCounts::default();
        for directory in &self.directories {
            total += directory.changes.counts();
        }
        total
    }

    pub fn added_count(&self) -> usize {
        self.counts().added
    }

    pub fn updated_count(&self) -> usize {
        self.counts().updated
    }

    pub fn removed_count(&self) -> usize {
        self.counts().removed
    }

    pub fn copied_count(&self) -> usize {
        self.directories.iter().map(|d| d.copied.len()).sum()
    }

    pub fn deleted_count(&self) -> usize {
        self.directories.iter().map(|d| d.deleted.len()).sum()
    }

    pub fn pruned_count(&self) -> usize {
        self.directories.iter().map(|d| d.pruned.len()).sum()
    }

    /// Every per-path failure across directories.
    pub fn failures(&self) -> impl Iterator<Item = &FileFailure> {
        self.directories.iter().flat_map(|d| d.failures.iter())
    }

    pub fn failure_count(&self) -> usize {
        self.failures().count()
    }

    /// Directories that could not be snapshotted, with the reason.
    pub fn directory_errors(&self) -> impl Iterator<Item = (&str, &str)> {
        self.directories
            .iter()
            .filter_map(|d| d.error.as_deref().map(|e| (d.name.as_str(), e)))
    }

    pub fn has_failures(&self) -> bool {
        self.failure_count() > 0 || self.directory_errors().next().is_some()
    }

    /// True when no directory had anything to change.
    pub fn is_noop(&self) -> bool {
        self.directories.iter().all(|d| d.changes.is_empty())
    }

    pub fn elapsed(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }
}
