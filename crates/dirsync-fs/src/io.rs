//! File operations used by the apply phase

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

use backoff::ExponentialBackoffBuilder;
use filetime::FileTime;
use tracing::debug;

use crate::{Error, Result};

/// Retry settings for transient I/O failures.
///
/// Only errors that are plausibly temporary (interrupted, would block,
/// timed out, resource busy) are retried. Everything else fails on the
/// first attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Delay before the first retry
    pub initial_interval: Duration,
    /// Give up once this much time has passed since the first attempt
    pub max_elapsed: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            initial_interval: Duration::from_millis(50),
            max_elapsed: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries.
    pub fn none() -> Self {
        Self {
            initial_interval: Duration::ZERO,
            max_elapsed: Duration::ZERO,
        }
    }

    fn run<T>(&self, mut op: impl FnMut() -> std::io::Result<T>) -> std::io::Result<T> {
        if self.max_elapsed.is_zero() {
            return op();
        }

        let policy = ExponentialBackoffBuilder::new()
            .with_initial_interval(self.initial_interval)
            .with_max_elapsed_time(Some(self.max_elapsed))
            .build();

        backoff::retry(policy, || {
            op().map_err(|e| {
                if is_transient(&e) {
                    debug!(error = %e, "transient I/O error, retrying");
                    backoff::Error::transient(e)
                } else {
                    backoff::Error::permanent(e)
                }
            })
        })
        .map_err(|e| match e {
            backoff::Error::Permanent(err) => err,
            backoff::Error::Transient { err, .. } => err,
        })
    }
}

fn is_transient(error: &std::io::Error) -> bool {
    matches!(
        error.kind(),
        ErrorKind::Interrupted | ErrorKind::WouldBlock | ErrorKind::TimedOut | ErrorKind::ResourceBusy
    )
}

/// Create every missing directory above `path`.
pub fn ensure_parent_dirs(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
    }
    Ok(())
}

/// Copy `source` over `destination`, creating missing parent directories.
///
/// An existing destination is overwritten. The destination's modification
/// time is set to the source's as read before the copy, so a later
/// comparison sees the two as unchanged unless the source moves on.
/// Returns the number of bytes copied.
pub fn copy_file(source: &Path, destination: &Path, retry: RetryPolicy) -> Result<u64> {
    let metadata = fs::metadata(source).map_err(|e| Error::io(source, e))?;
    ensure_parent_dirs(destination)?;

    let bytes = retry
        .run(|| fs::copy(source, destination))
        .map_err(|e| Error::io(source, e))?;

    let mtime = FileTime::from_last_modification_time(&metadata);
    filetime::set_file_mtime(destination, mtime).map_err(|e| Error::io(destination, e))?;

    debug!(from = %source.display(), to = %destination.display(), bytes, "copied file");
    Ok(bytes)
}

/// Remove a file, treating an already missing file as done.
///
/// Returns `true` if a file was removed, `false` if there was nothing to
/// remove.
pub fn remove_file_if_exists(path: &Path) -> Result<bool> {
    match fs::remove_file(path) {
        Ok(()) => {
            debug!(path = %path.display(), "removed file");
            Ok(true)
        }
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(e) => Err(Error::io(path, e)),
    }
}

/// Outcome of trying to remove a single directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirRemoval {
    /// The directory was empty and is gone now
    Removed,
    /// The directory still has entries
    NotEmpty,
    /// The directory did not exist
    Absent,
}

/// Remove `path` if it is an empty directory.
///
/// A non-empty or missing directory is reported, not treated as an error.
pub fn remove_dir_if_empty(path: &Path) -> Result<DirRemoval> {
    match fs::read_dir(path) {
        Ok(mut entries) => {
            if entries.next().is_some() {
                return Ok(DirRemoval::NotEmpty);
            }
        }
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(DirRemoval::Absent),
        Err(e) => return Err(Error::io(path, e)),
    }

    match fs::remove_dir(path) {
        Ok(()) => Ok(DirRemoval::Removed),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(DirRemoval::Absent),
        Err(e) if e.kind() == ErrorKind::DirectoryNotEmpty => Ok(DirRemoval::NotEmpty),
        Err(e) => Err(Error::io(path, e)),
    }
}

/// Remove empty directories from `start` upward, never touching `stop`.
///
/// Walks the ancestor chain one directory at a time. The walk ends at the
/// first non-empty directory, when it reaches `stop`, or when it leaves the
/// subtree under `stop`. A directory that is already gone counts as removed
/// and the walk continues with its parent. Returns the directories this call
/// removed, deepest first.
pub fn prune_empty_ancestors(start: &Path, stop: &Path) -> Result<Vec<PathBuf>> {
    let mut removed = Vec::new();
    let mut current = start.to_path_buf();

    while current != stop && current.starts_with(stop) {
        match remove_dir_if_empty(&current)? {
            DirRemoval::Removed => {
                debug!(path = %current.display(), "pruned empty directory");
                removed.push(current.clone());
            }
            DirRemoval::Absent => {}
            DirRemoval::NotEmpty => break,
        }

        match current.parent() {
            Some(parent) => current = parent.to_path_buf(),
            None => break,
        }
    }

    Ok(removed)
}
