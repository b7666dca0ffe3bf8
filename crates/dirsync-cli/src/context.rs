//! Configuration discovery
//!
//! `--config` (or `DIRSYNC_CONFIG`) names the file explicitly; otherwise
//! `config.yaml` in the working directory is used if present. Command-line
//! roots and directories override whatever the file says, and are enough on
//! their own when no file exists.

use std::path::{Path, PathBuf};

use tracing::debug;

use dirsync_core::SyncConfig;

use crate::cli::ConfigArgs;
use crate::error::{CliError, Result};

/// File looked up in the working directory when none is named.
pub const DEFAULT_CONFIG_FILE: &str = "config.yaml";

/// Build the effective configuration for this invocation.
///
/// The result is not validated here; `SyncEngine::new` does that.
pub fn resolve_config(args: &ConfigArgs, cwd: &Path) -> Result<SyncConfig> {
    let mut config = match config_file(args, cwd) {
        Some(path) => {
            debug!(path = %path.display(), "loading configuration");
            SyncConfig::load(&path)?
        }
        None => from_flags(args)?,
    };

    if let Some(source) = &args.source {
        config.source_path = source.clone();
    }
    if let Some(target) = &args.target {
        config.target_path = target.clone();
    }
    if !args.dirs.is_empty() {
        config.sync_directories = args.dirs.clone();
    }

    Ok(config)
}

fn config_file(args: &ConfigArgs, cwd: &Path) -> Option<PathBuf> {
    match &args.config {
        Some(path) => Some(cwd.join(path)),
        None => {
            let default = cwd.join(DEFAULT_CONFIG_FILE);
            default.is_file().then_some(default)
        }
    }
}

fn from_flags(args: &ConfigArgs) -> Result<SyncConfig> {
    match (&args.source, &args.target) {
        (Some(source), Some(target)) if !args.dirs.is_empty() => {
            Ok(SyncConfig::new(
                source.clone(),
                target.clone(),
                args.dirs.iter().cloned(),
            ))
        }
        _ => Err(CliError::user(format!(
            "No configuration found. Pass --config, set DIRSYNC_CONFIG, create \
             {DEFAULT_CONFIG_FILE}, or give --source, --target and --dir"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::TempDir;

    const YAML: &str = "\
SOURCE_PATH: /srv/library
TARGET_PATH: /media/player
SYNC_DIRECTORIES:
  - music
  - podcasts
";

    #[test]
    fn test_default_file_in_working_directory() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join(DEFAULT_CONFIG_FILE), YAML).unwrap();

        let config = resolve_config(&ConfigArgs::default(), temp.path()).unwrap();

        assert_eq!(config.source_path, PathBuf::from("/srv/library"));
        assert_eq!(config.sync_directories, vec!["music", "podcasts"]);
    }

    #[test]
    fn test_explicit_file_is_relative_to_working_directory() {
        let temp = TempDir::new().unwrap();
        fs::write(
            temp.path().join("alt.toml"),
            "source_path = \"/a\"\ntarget_path = \"/b\"\nsync_directories = [\"books\"]\n",
        )
        .unwrap();
        let args = ConfigArgs {
            config: Some(PathBuf::from("alt.toml")),
            ..ConfigArgs::default()
        };

        let config = resolve_config(&args, temp.path()).unwrap();

        assert_eq!(config.sync_directories, vec!["books"]);
    }

    #[test]
    fn test_flags_override_file() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join(DEFAULT_CONFIG_FILE), YAML).unwrap();
        let args = ConfigArgs {
            target: Some(PathBuf::from("/media/other")),
            dirs: vec!["audiobooks".into()],
            ..ConfigArgs::default()
        };

        let config = resolve_config(&args, temp.path()).unwrap();

        assert_eq!(config.source_path, PathBuf::from("/srv/library"));
        assert_eq!(config.target_path, PathBuf::from("/media/other"));
        assert_eq!(config.sync_directories, vec!["audiobooks"]);
    }

    #[test]
    fn test_flags_alone_are_enough() {
        let temp = TempDir::new().unwrap();
        let args = ConfigArgs {
            source: Some(PathBuf::from("/a")),
            target: Some(PathBuf::from("/b")),
            dirs: vec!["music".into()],
            ..ConfigArgs::default()
        };

        let config = resolve_config(&args, temp.path()).unwrap();

        assert_eq!(config, SyncConfig::new("/a", "/b", ["music"]));
    }

    #[test]
    fn test_nothing_configured_is_user_error() {
        let temp = TempDir::new().unwrap();

        let result = resolve_config(&ConfigArgs::default(), temp.path());

        assert!(matches!(result, Err(CliError::User { .. })));
    }

    #[test]
    fn test_missing_explicit_file_is_error() {
        let temp = TempDir::new().unwrap();
        let args = ConfigArgs {
            config: Some(PathBuf::from("nope.yaml")),
            ..ConfigArgs::default()
        };

        let result = resolve_config(&args, temp.path());

        assert!(matches!(result, Err(CliError::Core(_))));
    }
}
