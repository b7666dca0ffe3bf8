//! Apply a change set: copy batch, delete batch, then pruning
//!
//! Each batch is best-effort. A path that fails is recorded and the batch
//! moves on; nothing that already succeeded is rolled back.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

use dirsync_fs::{RetryPolicy, SyncPath, io};

use crate::cancel::CancelToken;
use crate::report::{FileFailure, Operation, Phase, Reporter};

/// Settings for the copy and delete batches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApplyOptions {
    /// Upper bound on worker threads per batch
    pub jobs: usize,
    /// Retry settings for transient copy failures
    pub retry: RetryPolicy,
}

impl Default for ApplyOptions {
    fn default() -> Self {
        Self {
            jobs: default_jobs(),
            retry: RetryPolicy::default(),
        }
    }
}

/// Worker count when none is configured.
pub fn default_jobs() -> usize {
    thread::available_parallelism().map_or(1, |n| n.get())
}

/// What one batch did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PhaseOutcome {
    /// Paths the batch finished, in input order
    pub completed: Vec<SyncPath>,
    pub failures: Vec<FileFailure>,
    /// Paths left alone after cancellation
    pub skipped: Vec<SyncPath>,
    /// Directories removed by pruning (delete batch only)
    pub pruned: Vec<PathBuf>,
}

enum Attempt {
    Done,
    Failed(FileFailure),
    Skipped,
}

/// Copy every path from `source_root` to `target_root`.
///
/// Missing parent directories on the target are created and existing files
/// overwritten.
pub fn apply_copies(
    paths: &[SyncPath],
    source_root: &Path,
    target_root: &Path,
    options: &ApplyOptions,
    reporter: &dyn Reporter,
    cancel: &CancelToken,
) -> PhaseOutcome {
    run_batch(paths, Operation::Copy, options, reporter, cancel, |path| {
        let source = path.to_native_under(source_root);
        let destination = path.to_native_under(target_root);
        io::copy_file(&source, &destination, options.retry)?;
        reporter.file_copied(path);
        Ok(())
    })
}

/// Delete every path under `target_root`, then prune directories the
/// deletions left empty.
///
/// A file that is already gone counts as deleted. Pruning starts only once
/// the whole batch has finished; `scope` names the pass in the
/// [`Phase::Prune`] event sent to `reporter` at that point.
pub fn apply_deletes(
    scope: &str,
    paths: &[SyncPath],
    target_root: &Path,
    options: &ApplyOptions,
    reporter: &dyn Reporter,
    cancel: &CancelToken,
) -> PhaseOutcome {
    let mut outcome = run_batch(paths, Operation::Delete, options, reporter, cancel, |path| {
        io::remove_file_if_exists(&path.to_native_under(target_root))?;
        reporter.file_deleted(path);
        Ok(())
    });

    reporter.phase_started(Phase::Prune, scope);
    let (pruned, failures) = prune_empty_dirs(&prune_candidates(&outcome), target_root, reporter);
    outcome.pruned = pruned;
    outcome.failures.extend(failures);
    outcome
}

/// Parent directories of every completed deletion.
fn prune_candidates(outcome: &PhaseOutcome) -> Vec<SyncPath> {
    outcome
        .completed
        .iter()
        .filter_map(SyncPath::parent)
        .collect()
}

/// Remove empty directories from each candidate upward.
///
/// Candidates are deduplicated and handled one at a time, deepest first, so
/// branches sharing a parent never race for it. The walk for a candidate
/// stops before its sync directory (`target_root/<first component>`) and
/// never reaches `target_root`. A non-empty directory ends that walk
/// quietly.
fn prune_empty_dirs(
    candidates: &[SyncPath],
    target_root: &Path,
    reporter: &dyn Reporter,
) -> (Vec<PathBuf>, Vec<FileFailure>) {
    let mut unique: Vec<&SyncPath> = candidates
        .iter()
        .filter(|dir| dir.depth() > 1)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    unique.sort_by(|a, b| b.depth().cmp(&a.depth()).then_with(|| a.cmp(b)));

    let mut pruned = Vec::new();
    let mut failures = Vec::new();

    for dir in unique {
        let Some(sync_dir) = dir.sync_dir() else {
            continue;
        };
        let stop = target_root.join(sync_dir);
        match io::prune_empty_ancestors(&dir.to_native_under(target_root), &stop) {
            Ok(removed) => {
                for path in &removed {
                    reporter.directory_pruned(path);
                }
                pruned.extend(removed);
            }
            Err(e) => {
                let failure = FileFailure {
                    path: dir.clone(),
                    operation: Operation::Prune,
                    cause: e.to_string(),
                };
                reporter.operation_failed(&failure);
                failures.push(failure);
            }
        }
    }

    (pruned, failures)
}

/// Run `op` over `paths` on a bounded pool of scoped workers.
///
/// Workers claim the next index from a shared counter, so every path is
/// attempted exactly once. The cancel token is checked before each claim
/// is attempted.
fn run_batch<F>(
    paths: &[SyncPath],
    operation: Operation,
    options: &ApplyOptions,
    reporter: &dyn Reporter,
    cancel: &CancelToken,
    op: F,
) -> PhaseOutcome
where
    F: Fn(&SyncPath) -> dirsync_fs::Result<()> + Sync,
{
    if paths.is_empty() {
        return PhaseOutcome::default();
    }

    let next = AtomicUsize::new(0);
    let workers = options.jobs.clamp(1, paths.len());

    let worker = || {
        let mut attempts = Vec::new();
        loop {
            let index = next.fetch_add(1, Ordering::Relaxed);
            let Some(path) = paths.get(index) else {
                break;
            };

            if cancel.is_cancelled() {
                attempts.push((index, Attempt::Skipped));
                continue;
            }

            let attempt = match op(path) {
                Ok(()) => Attempt::Done,
                Err(e) => {
                    let failure = FileFailure {
                        path: path.clone(),
                        operation,
                        cause: e.to_string(),
                    };
                    reporter.operation_failed(&failure);
                    Attempt::Failed(failure)
                }
            };
            attempts.push((index, attempt));
        }
        attempts
    };

    let mut attempts: Vec<(usize, Attempt)> = thread::scope(|scope| {
        let handles: Vec<_> = (0..workers).map(|_| scope.spawn(&worker)).collect();
        handles
            .into_iter()
            .flat_map(|handle| {
                handle
                    .join()
                    .unwrap_or_else(|payload| std::panic::resume_unwind(payload))
            })
            .collect()
    });
    attempts.sort_by_key(|(index, _)| *index);

    let mut outcome = PhaseOutcome::default();
    for (index, attempt) in attempts {
        match attempt {
            Attempt::Done => outcome.completed.push(paths[index].clone()),
            Attempt::Failed(failure) => outcome.failures.push(failure),
            Attempt::Skipped => outcome.skipped.push(paths[index].clone()),
        }
    }
    outcome
}
