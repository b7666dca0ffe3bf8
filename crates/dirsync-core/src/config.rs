//! Sync configuration: roots, sync directories and pass mode

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use dirsync_fs::{ConfigStore, validate_dir_name};

use crate::{Error, Result};

/// How configured sync directories are grouped into passes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SyncMode {
    /// One snapshot pair and change set per sync directory. A directory that
    /// cannot be read fails alone.
    #[default]
    PerDirectory,
    /// One snapshot pair accumulated across every sync directory.
    Merged,
}

impl std::str::FromStr for SyncMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "per-directory" => Ok(Self::PerDirectory),
            "merged" => Ok(Self::Merged),
            other => Err(Error::configuration(format!(
                "Unknown sync mode '{other}' (expected 'per-directory' or 'merged')"
            ))),
        }
    }
}

/// Configuration for one sync pass.
///
/// Upper-case keys (`SOURCE_PATH`, `TARGET_PATH`, `SYNC_DIRECTORIES`) are
/// accepted alongside the snake_case names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncConfig {
    #[serde(alias = "SOURCE_PATH")]
    pub source_path: PathBuf,

    #[serde(alias = "TARGET_PATH")]
    pub target_path: PathBuf,

    #[serde(alias = "SYNC_DIRECTORIES")]
    pub sync_directories: Vec<String>,

    #[serde(default, alias = "MODE")]
    pub mode: SyncMode,

    /// Worker threads for the apply phase; defaults to available parallelism
    #[serde(default, alias = "JOBS", skip_serializing_if = "Option::is_none")]
    pub jobs: Option<usize>,
}

impl SyncConfig {
    pub fn new(
        source_path: impl Into<PathBuf>,
        target_path: impl Into<PathBuf>,
        sync_directories: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            source_path: source_path.into(),
            target_path: target_path.into(),
            sync_directories: sync_directories.into_iter().map(Into::into).collect(),
            mode: SyncMode::default(),
            jobs: None,
        }
    }

    /// Read a configuration file (YAML, TOML or JSON).
    ///
    /// The result is not validated, so callers can apply overrides first;
    /// [`SyncEngine::new`](crate::SyncEngine::new) validates before a pass.
    pub fn load(path: &Path) -> Result<Self> {
        Ok(ConfigStore::new().load(path)?)
    }

    /// Check the configuration without touching the target.
    ///
    /// Rejects an empty or duplicated directory list, directory names that
    /// are not a single path component, a zero job count, and roots that
    /// are the same or nested inside one another.
    pub fn validate(&self) -> Result<()> {
        if self.sync_directories.is_empty() {
            return Err(Error::configuration("No sync directories configured"));
        }

        let mut seen = HashSet::new();
        for name in &self.sync_directories {
            validate_dir_name(name)
                .map_err(|e| Error::configuration(format!("Invalid sync directory: {e}")))?;
            if !seen.insert(name.as_str()) {
                return Err(Error::configuration(format!(
                    "Sync directory '{name}' is listed more than once"
                )));
            }
        }

        if self.jobs == Some(0) {
            return Err(Error::configuration("jobs must be at least 1"));
        }

        let source = resolve(&self.source_path);
        let target = resolve(&self.target_path);
        if source == target {
            return Err(Error::configuration(format!(
                "Source and target are the same directory: {}",
                source.display()
            )));
        }
        if source.starts_with(&target) || target.starts_with(&source) {
            return Err(Error::configuration(format!(
                "Source {} and target {} must not be nested",
                source.display(),
                target.display()
            )));
        }

        Ok(())
    }
}

fn resolve(path: &Path) -> PathBuf {
    dunce::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}
