//! Error types for dirsync-core

use std::path::PathBuf;

/// Result type for dirsync-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in dirsync-core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Source or target root unusable, or invalid configuration. Fatal.
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// A sync directory could not be walked
    #[error("Cannot read {path}: {source}")]
    Filesystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The pass was cancelled before any change was applied
    #[error("Sync cancelled")]
    Cancelled,

    /// Filesystem error from dirsync-fs
    #[error(transparent)]
    Fs(#[from] dirsync_fs::Error),
}

impl Error {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn filesystem(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Filesystem {
            path: path.into(),
            source,
        }
    }
}
