//! [`SyncFixture`] builder for source/target test scenarios.

use std::fs;
use std::path::{Path, PathBuf};

use filetime::FileTime;
use tempfile::TempDir;
use walkdir::WalkDir;

/// A temporary directory holding a `source/` and a `target/` root, with
/// helpers to lay out files with pinned modification times and to assert on
/// the resulting target tree.
///
/// # Example
///
/// ```rust,no_run
/// use dirsync_test_utils::tree::SyncFixture;
///
/// let fixture = SyncFixture::new();
/// fixture.write_source("music/rock/song.mp3", "riff", 100);
/// fixture.assert_target_missing("music/rock/song.mp3");
/// ```
pub struct SyncFixture {
    temp_dir: TempDir,
}

impl Default for SyncFixture {
    fn default() -> Self {
        Self::new()
    }
}

impl SyncFixture {
    /// Create a fixture with both roots present.
    pub fn new() -> Self {
        let fixture = Self::without_target();
        fs::create_dir(fixture.target_root())
            .unwrap_or_else(|e| panic!("SyncFixture: failed to create target root: {e}"));
        fixture
    }

    /// Create a fixture whose target root does not exist (an unplugged device).
    pub fn without_target() -> Self {
        let temp_dir = TempDir::new()
            .unwrap_or_else(|e| panic!("SyncFixture: failed to create temp dir: {e}"));
        fs::create_dir(temp_dir.path().join("source"))
            .unwrap_or_else(|e| panic!("SyncFixture: failed to create source root: {e}"));
        Self { temp_dir }
    }

    /// Directory that contains both roots.
    pub fn base(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn source_root(&self) -> PathBuf {
        self.base().join("source")
    }

    pub fn target_root(&self) -> PathBuf {
        self.base().join("target")
    }

    /// Write a file under the source root with the given mtime (unix seconds).
    pub fn write_source(&self, path: &str, content: &str, mtime: i64) -> PathBuf {
        write_with_mtime(&self.source_root(), path, content, mtime)
    }

    /// Write a file under the target root with the given mtime (unix seconds).
    pub fn write_target(&self, path: &str, content: &str, mtime: i64) -> PathBuf {
        write_with_mtime(&self.target_root(), path, content, mtime)
    }

    /// Create a directory (and parents) under the source root.
    pub fn mkdir_source(&self, path: &str) -> PathBuf {
        mkdir(&self.source_root(), path)
    }

    /// Create a directory (and parents) under the target root.
    pub fn mkdir_target(&self, path: &str) -> PathBuf {
        mkdir(&self.target_root(), path)
    }

    /// All regular files under the target root, relative and `/`-separated,
    /// sorted.
    pub fn target_files(&self) -> Vec<String> {
        list_files(&self.target_root())
    }

    /// All regular files under the source root, relative and `/`-separated,
    /// sorted.
    pub fn source_files(&self) -> Vec<String> {
        list_files(&self.source_root())
    }

    /// Assert that the target file at `path` holds exactly `content`.
    ///
    /// # Panics
    /// Panics if the file cannot be read or the content differs.
    pub fn assert_target_content(&self, path: &str, content: &str) {
        let full_path = self.target_root().join(path);
        let actual = fs::read_to_string(&full_path)
            .unwrap_or_else(|_| panic!("Could not read file: {}", full_path.display()));
        assert_eq!(
            actual,
            content,
            "Unexpected content in {}",
            full_path.display()
        );
    }

    /// Assert that `path` (relative to the target root) exists.
    pub fn assert_target_exists(&self, path: &str) {
        let full_path = self.target_root().join(path);
        assert!(
            full_path.exists(),
            "Expected path to exist: {}",
            full_path.display()
        );
    }

    /// Assert that `path` (relative to the target root) does **not** exist.
    pub fn assert_target_missing(&self, path: &str) {
        let full_path = self.target_root().join(path);
        assert!(
            !full_path.exists(),
            "Expected path NOT to exist: {}",
            full_path.display()
        );
    }

    /// Modification time of a target file in unix seconds.
    pub fn target_mtime(&self, path: &str) -> i64 {
        let metadata = fs::metadata(self.target_root().join(path))
            .unwrap_or_else(|e| panic!("Could not stat {path}: {e}"));
        FileTime::from_last_modification_time(&metadata).unix_seconds()
    }
}

fn write_with_mtime(root: &Path, path: &str, content: &str, mtime: i64) -> PathBuf {
    let full_path = root.join(path);
    if let Some(parent) = full_path.parent() {
        fs::create_dir_all(parent)
            .unwrap_or_else(|e| panic!("Could not create {}: {e}", parent.display()));
    }
    fs::write(&full_path, content)
        .unwrap_or_else(|e| panic!("Could not write {}: {e}", full_path.display()));
    filetime::set_file_mtime(&full_path, FileTime::from_unix_time(mtime, 0))
        .unwrap_or_else(|e| panic!("Could not set mtime on {}: {e}", full_path.display()));
    full_path
}

fn mkdir(root: &Path, path: &str) -> PathBuf {
    let full_path = root.join(path);
    fs::create_dir_all(&full_path)
        .unwrap_or_else(|e| panic!("Could not create {}: {e}", full_path.display()));
    full_path
}

fn list_files(root: &Path) -> Vec<String> {
    let mut files: Vec<String> = WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| {
            let relative = entry.path().strip_prefix(root).unwrap_or(entry.path());
            relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect::<Vec<_>>()
                .join("/")
        })
        .collect();

    files.sort();
    files
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_listing_is_sorted_and_skips_directories() {
        let fixture = SyncFixture::new();
        fixture.write_source("music/rock/b.mp3", "b", 1);
        fixture.write_source("music/a.mp3", "a", 1);
        fixture.mkdir_source("music/empty");

        assert_eq!(fixture.source_files(), vec!["music/a.mp3", "music/rock/b.mp3"]);
        assert!(fixture.target_files().is_empty());
    }

    #[test]
    fn test_listing_missing_root_is_empty() {
        let fixture = SyncFixture::without_target();
        assert!(fixture.target_files().is_empty());
    }
}
