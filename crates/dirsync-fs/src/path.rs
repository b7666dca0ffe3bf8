//! Relative path keys shared by source and target snapshots

use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// A path relative to a sync root, normalized to forward slashes.
///
/// Snapshots of the source and target trees are keyed by `SyncPath` so the
/// same file compares equal on both sides regardless of where each root
/// lives. The first component is always the sync directory the file belongs
/// to. Conversion to a native path happens only when joined onto a root.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SyncPath {
    /// Components joined with `/`, no leading, trailing or doubled separators
    inner: String,
}

impl SyncPath {
    /// Create a SyncPath from a relative path string.
    ///
    /// Platform separators are folded to `/`, and empty or `.` components
    /// are dropped.
    pub fn new(path: impl AsRef<str>) -> Self {
        let inner = path
            .as_ref()
            .split(std::path::is_separator)
            .filter(|part| !part.is_empty() && *part != ".")
            .collect::<Vec<_>>()
            .join("/");
        Self { inner }
    }

    /// Build the key of `path` relative to `root`.
    ///
    /// Fails if `path` is not under `root` or contains components that
    /// cannot be expressed as a plain relative path.
    pub fn from_relative(root: &Path, path: &Path) -> Result<Self> {
        let relative = path
            .strip_prefix(root)
            .map_err(|_| Error::invalid_path(path, format!("not under {}", root.display())))?;

        let mut parts = Vec::new();
        for component in relative.components() {
            match component {
                Component::Normal(part) => {
                    let part = part.to_str().ok_or_else(|| {
                        Error::invalid_path(path, "path is not valid UTF-8")
                    })?;
                    parts.push(part);
                }
                Component::CurDir => {}
                _ => return Err(Error::invalid_path(path, "unexpected path component")),
            }
        }

        Ok(Self {
            inner: parts.join("/"),
        })
    }

    /// Display key for `path` relative to `root`, replacing anything that is
    /// not valid UTF-8. Only for reporting; it may not round-trip to disk.
    pub fn from_relative_lossy(root: &Path, path: &Path) -> Self {
        let relative = path.strip_prefix(root).unwrap_or(path);
        Self::new(relative.to_string_lossy())
    }

    /// Get the internal normalized string representation.
    pub fn as_str(&self) -> &str {
        &self.inner
    }

    /// True for the empty path (the root itself).
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Iterate over the path components.
    pub fn components(&self) -> impl Iterator<Item = &str> {
        self.inner.split('/').filter(|part| !part.is_empty())
    }

    /// Number of components.
    pub fn depth(&self) -> usize {
        self.components().count()
    }

    /// The sync directory this path belongs to (its first component).
    pub fn sync_dir(&self) -> Option<&str> {
        self.components().next()
    }

    /// Join this path with a relative segment.
    pub fn join(&self, segment: &str) -> Self {
        if self.inner.is_empty() {
            return Self::new(segment);
        }
        Self::new(format!("{}/{}", self.inner, segment))
    }

    /// Get the parent path, or `None` for a single component.
    pub fn parent(&self) -> Option<Self> {
        self.inner.rfind('/').map(|idx| Self {
            inner: self.inner[..idx].to_string(),
        })
    }

    /// Get the file name component.
    pub fn file_name(&self) -> Option<&str> {
        self.components().last()
    }

    /// Resolve this path under `root` as a native path.
    pub fn to_native_under(&self, root: &Path) -> PathBuf {
        let mut native = root.to_path_buf();
        for part in self.components() {
            native.push(part);
        }
        native
    }
}

impl std::fmt::Display for SyncPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.inner)
    }
}

impl AsRef<str> for SyncPath {
    fn as_ref(&self) -> &str {
        &self.inner
    }
}

impl From<&str> for SyncPath {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for SyncPath {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

/// Validate a configured sync directory name.
///
/// A sync directory must be a single normal path component: not empty, not
/// `.` or `..`, and free of separators.
pub fn validate_dir_name(name: &str) -> Result<()> {
    let reason = if name.trim().is_empty() {
        Some("name is empty")
    } else if name == "." || name == ".." {
        Some("name refers to a relative parent or self")
    } else if name.chars().any(std::path::is_separator) {
        Some("name must be a single directory, not a path")
    } else if name.contains('\0') {
        Some("name contains a NUL byte")
    } else {
        None
    };

    match reason {
        Some(reason) => Err(Error::invalid_path(name, reason)),
        None => Ok(()),
    }
}
