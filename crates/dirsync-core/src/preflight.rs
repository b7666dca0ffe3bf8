//! Target preflight: the device must be there before anything is touched

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::report::Reporter;
use crate::{Error, Result};

/// Fail with a configuration error unless `source_root` is a directory.
pub fn check_source_root(source_root: &Path) -> Result<()> {
    if !source_root.is_dir() {
        return Err(Error::configuration(format!(
            "Source not found at '{}'",
            source_root.display()
        )));
    }
    Ok(())
}

/// Fail with a configuration error unless `target_root` is a directory.
pub fn check_target_root(target_root: &Path) -> Result<()> {
    if !target_root.is_dir() {
        return Err(Error::configuration(format!(
            "Target not found at '{}'. Is the device connected?",
            target_root.display()
        )));
    }
    Ok(())
}

/// Sync directories that do not exist under `target_root` yet.
pub fn missing_sync_dirs<S: AsRef<str>>(target_root: &Path, sync_dirs: &[S]) -> Vec<String> {
    sync_dirs
        .iter()
        .map(|dir| dir.as_ref())
        .filter(|dir| !target_root.join(dir).exists())
        .map(String::from)
        .collect()
}

/// Verify the target root and create any missing sync directories.
///
/// Each missing directory is created one level deep with `create_dir`;
/// the target root itself is never created. Returns the names created.
pub fn preflight<S: AsRef<str>>(
    target_root: &Path,
    sync_dirs: &[S],
    reporter: &dyn Reporter,
) -> Result<Vec<String>> {
    check_target_root(target_root)?;

    let missing = missing_sync_dirs(target_root, sync_dirs);
    for name in &missing {
        let path = target_root.join(name);
        fs::create_dir(&path).map_err(|e| dirsync_fs::Error::io(&path, e))?;
        debug!(path = %path.display(), "created sync directory");
        reporter.directory_created(name);
    }

    Ok(missing)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::NullReporter;
    use tempfile::TempDir;

    #[test]
    fn test_missing_target_root_is_configuration_error() {
        let temp = TempDir::new().unwrap();
        let target = temp.path().join("unplugged");

        let result = preflight(&target, &["music"], &NullReporter);

        assert!(matches!(result, Err(Error::Configuration { .. })));
        assert!(!target.exists(), "preflight must not create the target root");
    }

    #[test]
    fn test_creates_only_missing_dirs() {
        let temp = TempDir::new().unwrap();
        fs::create_dir(temp.path().join("music")).unwrap();

        let created = preflight(temp.path(), &["music", "books"], &NullReporter).unwrap();

        assert_eq!(created, vec!["books".to_string()]);
        assert!(temp.path().join("books").is_dir());
    }

    #[test]
    fn test_source_root_must_be_directory() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("file.txt");
        fs::write(&file, "x").unwrap();

        assert!(check_source_root(temp.path()).is_ok());
        assert!(check_source_root(&file).is_err());
    }
}
