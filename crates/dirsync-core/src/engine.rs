//! SyncEngine: one pass from preflight to pruning
//!
//! Per scope (a single sync directory, or all of them when merged):
//! snapshot source and target concurrently, diff, copy, delete, prune.
//! Preflight failures abort the pass before any snapshot is built.

use std::path::Path;
use std::slice;

use tracing::{debug, info};

use crate::apply::{self, ApplyOptions, default_jobs};
use crate::cancel::CancelToken;
use crate::config::{SyncConfig, SyncMode};
use crate::diff::ChangeSet;
use crate::preflight;
use crate::report::{DirectoryReport, Phase, Reporter, SyncReport};
use crate::snapshot::{self, TargetDirs};
use crate::{Error, Result};

/// Options that shape a pass without being part of the configuration file.
#[derive(Debug, Clone, Default)]
pub struct SyncOptions {
    /// If true, report what would change without touching the target
    pub dry_run: bool,
    /// Overrides the configured mode
    pub mode: Option<SyncMode>,
    /// Overrides the configured worker count
    pub jobs: Option<usize>,
    pub retry: Option<dirsync_fs::RetryPolicy>,
}

/// Engine for one-way synchronization of the configured sync directories.
pub struct SyncEngine {
    config: SyncConfig,
    options: SyncOptions,
}

impl SyncEngine {
    /// Create an engine for a validated configuration.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if `config` does not validate or the
    /// job override is zero.
    pub fn new(config: SyncConfig, options: SyncOptions) -> Result<Self> {
        config.validate()?;
        if options.jobs == Some(0) {
            return Err(Error::configuration("jobs must be at least 1"));
        }
        Ok(Self { config, options })
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    pub fn mode(&self) -> SyncMode {
        self.options.mode.unwrap_or(self.config.mode)
    }

    fn apply_options(&self) -> ApplyOptions {
        ApplyOptions {
            jobs: self
                .options
                .jobs
                .or(self.config.jobs)
                .unwrap_or_else(default_jobs),
            retry: self.options.retry.unwrap_or_default(),
        }
    }

    /// Run one pass.
    ///
    /// # Errors
    ///
    /// - [`Error::Configuration`] if the source or target root is missing
    /// - [`Error::Cancelled`] if cancellation was requested before the pass
    ///   started
    /// - [`Error::Filesystem`] in merged mode if any sync directory cannot be
    ///   walked
    ///
    /// Per-path copy and delete failures are not errors; they are listed in
    /// the returned report.
    pub fn run(&self, reporter: &dyn Reporter, cancel: &CancelToken) -> Result<SyncReport> {
        self.execute(self.options.dry_run, reporter, cancel)
    }

    /// Compute what a pass would do without writing anything.
    pub fn plan(&self, reporter: &dyn Reporter) -> Result<SyncReport> {
        self.execute(true, reporter, &CancelToken::new())
    }

    fn execute(
        &self,
        dry_run: bool,
        reporter: &dyn Reporter,
        cancel: &CancelToken,
    ) -> Result<SyncReport> {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        let source_root = self.config.source_path.as_path();
        let target_root = self.config.target_path.as_path();
        let sync_dirs = self.config.sync_directories.as_slice();

        reporter.phase_started(Phase::Preflight, &target_root.display().to_string());
        preflight::check_source_root(source_root)?;
        let mut report = SyncReport::begin(dry_run);
        report.created_dirs = if dry_run {
            preflight::check_target_root(target_root)?;
            preflight::missing_sync_dirs(target_root, sync_dirs)
        } else {
            preflight::preflight(target_root, sync_dirs, reporter)?
        };

        let target_dirs = if dry_run {
            TargetDirs::MayBeMissing
        } else {
            TargetDirs::MustExist
        };

        match self.mode() {
            SyncMode::PerDirectory => {
                for sync_dir in sync_dirs {
                    if cancel.is_cancelled() {
                        report.cancelled = true;
                        break;
                    }
                    let scope = slice::from_ref(sync_dir);
                    let directory = self
                        .sync_scope(sync_dir, scope, target_dirs, dry_run, reporter, cancel)
                        .unwrap_or_else(|e| {
                            debug!(sync_dir = %sync_dir, error = %e, "sync directory failed");
                            DirectoryReport::failed(sync_dir.as_str(), e)
                        });
                    report.directories.push(directory);
                }
            }
            SyncMode::Merged => {
                let name = sync_dirs.join(", ");
                let directory =
                    self.sync_scope(&name, sync_dirs, target_dirs, dry_run, reporter, cancel)?;
                report.directories.push(directory);
            }
        }

        report.cancelled |= cancel.is_cancelled();
        let report = report.finish();
        info!(
            added = report.added_count(),
            updated = report.updated_count(),
            removed = report.removed_count(),
            failures = report.failure_count(),
            dry_run,
            "sync pass finished"
        );
        Ok(report)
    }

    fn sync_scope(
        &self,
        name: &str,
        sync_dirs: &[String],
        target_dirs: TargetDirs,
        dry_run: bool,
        reporter: &dyn Reporter,
        cancel: &CancelToken,
    ) -> Result<DirectoryReport> {
        let source_root = self.config.source_path.as_path();
        let target_root = self.config.target_path.as_path();

        reporter.phase_started(Phase::Snapshot, name);
        let (source, target) =
            snapshot::build_pair(source_root, target_root, sync_dirs, target_dirs)?;

        reporter.phase_started(Phase::Diff, name);
        let changes = ChangeSet::between(&source, &target);
        reporter.changes_detected(name, &changes);

        let mut directory = DirectoryReport::new(name, changes);
        for failure in source.skipped().iter().chain(target.skipped()) {
            reporter.operation_failed(failure);
            directory.failures.push(failure.clone());
        }
        drop((source, target));
        if dry_run || directory.changes.is_empty() {
            return Ok(directory);
        }

        self.apply(&mut directory, source_root, target_root, reporter, cancel);
        Ok(directory)
    }

    fn apply(
        &self,
        directory: &mut DirectoryReport,
        source_root: &Path,
        target_root: &Path,
        reporter: &dyn Reporter,
        cancel: &CancelToken,
    ) {
        let options = self.apply_options();

        reporter.phase_started(Phase::Copy, &directory.name);
        let copies = apply::apply_copies(
            &directory.changes.to_copy(),
            source_root,
            target_root,
            &options,
            reporter,
            cancel,
        );
        directory.record_copies(copies);

        reporter.phase_started(Phase::Delete, &directory.name);
        let deletes = apply::apply_deletes(
            &directory.name,
            &directory.changes.removed,
            target_root,
            &options,
            reporter,
            cancel,
        );
        directory.record_deletes(deletes);
    }
}
