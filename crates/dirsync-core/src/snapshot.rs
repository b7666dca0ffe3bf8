//! Snapshot: relative path to last-modification time for one tree

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use std::thread;
use std::time::SystemTime;

use tracing::{debug, warn};
use walkdir::WalkDir;

use dirsync_fs::SyncPath;

use crate::report::{FileFailure, Operation};
use crate::{Error, Result};

/// Files under one root at one moment, keyed by their path relative to
/// that root (so every key starts with its sync directory).
///
/// Only regular files are entries. Directories, symbolic links and other
/// special files are left out. A file whose name cannot be used as a key
/// (not valid UTF-8) is not an entry either; it is listed in
/// [`Snapshot::skipped`] and the walk goes on.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    files: BTreeMap<SyncPath, SystemTime>,
    skipped: Vec<FileFailure>,
}

/// How the target side of [`build_pair`] treats a sync directory that does
/// not exist yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetDirs {
    /// A missing directory is a filesystem error
    MustExist,
    /// A missing directory contributes no entries
    MayBeMissing,
}

impl Snapshot {
    /// Walk `root/sync_dir` and record every regular file.
    pub fn build(root: &Path, sync_dir: &str) -> Result<Self> {
        let mut snapshot = Self::default();
        snapshot.extend_from(root, sync_dir)?;
        Ok(snapshot)
    }

    /// Walk every sync directory under `root` into a single snapshot.
    pub fn build_merged<S: AsRef<str>>(root: &Path, sync_dirs: &[S]) -> Result<Self> {
        let mut snapshot = Self::default();
        for sync_dir in sync_dirs {
            snapshot.extend_from(root, sync_dir.as_ref())?;
        }
        Ok(snapshot)
    }

    /// Create a snapshot from explicit entries.
    pub fn from_entries(entries: impl IntoIterator<Item = (SyncPath, SystemTime)>) -> Self {
        entries.into_iter().collect()
    }

    fn extend_from(&mut self, root: &Path, sync_dir: &str) -> Result<()> {
        require_dir(root)?;
        let dir = root.join(sync_dir);
        require_dir(&dir)?;

        let before = self.files.len();
        for entry in WalkDir::new(&dir).follow_links(false) {
            let entry = entry.map_err(|e| walk_error(&dir, e))?;
            if !entry.file_type().is_file() {
                continue;
            }

            let modified = entry
                .metadata()
                .map_err(|e| walk_error(&dir, e))?
                .modified()
                .map_err(|e| Error::filesystem(entry.path(), e))?;
            let key = match SyncPath::from_relative(root, entry.path()) {
                Ok(key) => key,
                Err(dirsync_fs::Error::InvalidPath { reason, .. }) => {
                    warn!(path = %entry.path().display(), %reason, "skipping file");
                    self.skipped.push(FileFailure {
                        path: SyncPath::from_relative_lossy(root, entry.path()),
                        operation: Operation::Scan,
                        cause: reason,
                    });
                    continue;
                }
                Err(e) => return Err(e.into()),
            };
            self.files.insert(key, modified);
        }

        debug!(
            root = %root.display(),
            sync_dir,
            files = self.files.len() - before,
            "walked sync directory"
        );
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn get(&self, path: &SyncPath) -> Option<&SystemTime> {
        self.files.get(path)
    }

    pub fn contains(&self, path: &SyncPath) -> bool {
        self.files.contains_key(path)
    }

    /// Paths in sorted order.
    pub fn paths(&self) -> impl Iterator<Item = &SyncPath> {
        self.files.keys()
    }

    /// Files seen during the walk that could not be keyed.
    pub fn skipped(&self) -> &[FileFailure] {
        &self.skipped
    }

    /// Entries in path order.
    pub fn iter(&self) -> impl Iterator<Item = (&SyncPath, &SystemTime)> {
        self.files.iter()
    }
}

impl FromIterator<(SyncPath, SystemTime)> for Snapshot {
    fn from_iter<I: IntoIterator<Item = (SyncPath, SystemTime)>>(iter: I) -> Self {
        Self {
            files: iter.into_iter().collect(),
            skipped: Vec::new(),
        }
    }
}

/// Build the source and target snapshots for `sync_dirs` concurrently.
///
/// The two walks share nothing and run on separate threads; both are joined
/// before this returns, so the caller can diff immediately.
pub fn build_pair<S: AsRef<str> + Sync>(
    source_root: &Path,
    target_root: &Path,
    sync_dirs: &[S],
    target_dirs: TargetDirs,
) -> Result<(Snapshot, Snapshot)> {
    let (source, target) = thread::scope(|scope| {
        let source = scope.spawn(|| Snapshot::build_merged(source_root, sync_dirs));
        let target = match target_dirs {
            TargetDirs::MustExist => Snapshot::build_merged(target_root, sync_dirs),
            TargetDirs::MayBeMissing => {
                let existing: Vec<&str> = sync_dirs
                    .iter()
                    .map(|dir| dir.as_ref())
                    .filter(|dir| target_root.join(dir).exists())
                    .collect();
                Snapshot::build_merged(target_root, &existing)
            }
        };
        let source = source
            .join()
            .unwrap_or_else(|payload| std::panic::resume_unwind(payload));
        (source, target)
    });

    Ok((source?, target?))
}

fn require_dir(path: &Path) -> Result<()> {
    let metadata = fs::metadata(path).map_err(|e| Error::filesystem(path, e))?;
    if !metadata.is_dir() {
        return Err(Error::filesystem(
            path,
            std::io::Error::new(ErrorKind::NotADirectory, "not a directory"),
        ));
    }
    Ok(())
}

fn walk_error(dir: &Path, error: walkdir::Error) -> Error {
    let path = error
        .path()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| dir.to_path_buf());
    Error::filesystem(path, error.into())
}
