//! Filesystem primitives for dirsync
//!
//! Provides the relative path key used by snapshots, the file operations the
//! apply phase is built from, and format-agnostic config loading.

pub mod config;
pub mod error;
pub mod io;
pub mod path;

pub use config::ConfigStore;
pub use error::{Error, Result};
pub use io::{DirRemoval, RetryPolicy};
pub use path::{SyncPath, validate_dir_name};
