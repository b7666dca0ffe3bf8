//! Snapshot building against real directory trees

use dirsync_core::{Error, Snapshot, SyncPath, TargetDirs, snapshot};
use dirsync_test_utils::tree::SyncFixture;
use pretty_assertions::assert_eq;
use std::time::{Duration, UNIX_EPOCH};

fn keys(snapshot: &Snapshot) -> Vec<String> {
    snapshot.paths().map(|p| p.to_string()).collect()
}

#[test]
fn test_keys_are_relative_to_root_and_include_sync_dir() {
    let fixture = SyncFixture::new();
    fixture.write_source("music/rock/a.mp3", "a", 100);
    fixture.write_source("music/b.mp3", "b", 200);

    let snapshot = Snapshot::build(&fixture.source_root(), "music").unwrap();

    assert_eq!(keys(&snapshot), vec!["music/b.mp3", "music/rock/a.mp3"]);
    assert_eq!(
        snapshot.get(&SyncPath::new("music/rock/a.mp3")),
        Some(&(UNIX_EPOCH + Duration::from_secs(100)))
    );
}

#[test]
fn test_directories_are_not_entries() {
    let fixture = SyncFixture::new();
    fixture.mkdir_source("music/empty/nested");
    fixture.write_source("music/a.mp3", "a", 1);

    let snapshot = Snapshot::build(&fixture.source_root(), "music").unwrap();

    assert_eq!(keys(&snapshot), vec!["music/a.mp3"]);
}

#[test]
fn test_other_directories_are_ignored() {
    let fixture = SyncFixture::new();
    fixture.write_source("music/a.mp3", "a", 1);
    fixture.write_source("videos/clip.mp4", "v", 1);
    fixture.write_source("top-level.txt", "t", 1);

    let snapshot = Snapshot::build(&fixture.source_root(), "music").unwrap();

    assert_eq!(keys(&snapshot), vec!["music/a.mp3"]);
}

#[test]
fn test_merged_snapshot_accumulates_every_directory() {
    let fixture = SyncFixture::new();
    fixture.write_source("music/a.mp3", "a", 1);
    fixture.write_source("books/b.epub", "b", 1);
    fixture.write_source("photos/c.jpg", "c", 1);

    let snapshot =
        Snapshot::build_merged(&fixture.source_root(), &["music", "books", "photos"]).unwrap();

    assert_eq!(
        keys(&snapshot),
        vec!["books/b.epub", "music/a.mp3", "photos/c.jpg"]
    );
}

#[test]
fn test_missing_sync_dir_is_filesystem_error() {
    let fixture = SyncFixture::new();

    let result = Snapshot::build(&fixture.source_root(), "music");

    assert!(matches!(result, Err(Error::Filesystem { .. })));
}

#[test]
fn test_missing_root_is_filesystem_error() {
    let fixture = SyncFixture::without_target();

    let result = Snapshot::build(&fixture.target_root(), "music");

    match result {
        Err(Error::Filesystem { path, .. }) => assert_eq!(path, fixture.target_root()),
        other => panic!("expected filesystem error, got {:?}", other),
    }
}

#[test]
fn test_sync_dir_that_is_a_file_is_filesystem_error() {
    let fixture = SyncFixture::new();
    fixture.write_source("music", "not a directory", 1);

    let result = Snapshot::build(&fixture.source_root(), "music");

    assert!(matches!(result, Err(Error::Filesystem { .. })));
}

#[test]
fn test_build_pair_returns_both_sides() {
    let fixture = SyncFixture::new();
    fixture.write_source("music/a.mp3", "a", 2);
    fixture.write_target("music/a.mp3", "a", 1);
    fixture.write_target("music/old.mp3", "o", 1);

    let (source, target) = snapshot::build_pair(
        &fixture.source_root(),
        &fixture.target_root(),
        &["music"],
        TargetDirs::MustExist,
    )
    .unwrap();

    assert_eq!(keys(&source), vec!["music/a.mp3"]);
    assert_eq!(keys(&target), vec!["music/a.mp3", "music/old.mp3"]);
}

#[test]
fn test_build_pair_tolerates_missing_target_dir_when_asked() {
    let fixture = SyncFixture::new();
    fixture.write_source("music/a.mp3", "a", 2);

    let strict = snapshot::build_pair(
        &fixture.source_root(),
        &fixture.target_root(),
        &["music"],
        TargetDirs::MustExist,
    );
    assert!(strict.is_err());

    let (_, target) = snapshot::build_pair(
        &fixture.source_root(),
        &fixture.target_root(),
        &["music"],
        TargetDirs::MayBeMissing,
    )
    .unwrap();
    assert!(target.is_empty());
}

#[cfg(unix)]
#[test]
fn test_symlinks_are_excluded() {
    let fixture = SyncFixture::new();
    let real = fixture.write_source("music/real.mp3", "a", 1);
    let linked_dir = fixture.mkdir_source("elsewhere");
    fixture.write_source("elsewhere/hidden.mp3", "h", 1);

    std::os::unix::fs::symlink(&real, fixture.source_root().join("music/link.mp3")).unwrap();
    std::os::unix::fs::symlink(&linked_dir, fixture.source_root().join("music/linked")).unwrap();

    let snapshot = Snapshot::build(&fixture.source_root(), "music").unwrap();

    assert_eq!(keys(&snapshot), vec!["music/real.mp3"]);
}

#[cfg(target_os = "linux")]
#[test]
fn test_non_utf8_name_is_skipped_not_fatal() {
    use dirsync_core::Operation;
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;

    let fixture = SyncFixture::new();
    fixture.write_source("music/good.mp3", "g", 1);
    let latin1 = fixture
        .source_root()
        .join("music")
        .join(OsStr::from_bytes(b"caf\xe9.mp3"));
    std::fs::write(&latin1, "c").unwrap();

    let snapshot = Snapshot::build(&fixture.source_root(), "music").unwrap();

    assert_eq!(keys(&snapshot), vec!["music/good.mp3"]);
    assert_eq!(snapshot.skipped().len(), 1);
    let skipped = &snapshot.skipped()[0];
    assert_eq!(skipped.operation, Operation::Scan);
    assert_eq!(skipped.path, SyncPath::new("music/caf\u{FFFD}.mp3"));
}
