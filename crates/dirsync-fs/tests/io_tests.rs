use dirsync_fs::{DirRemoval, Error, RetryPolicy, io};
use filetime::FileTime;
use std::fs;
use tempfile::TempDir;

#[test]
fn test_copy_file_creates_parent_directories() {
    let temp = TempDir::new().unwrap();
    let source = temp.path().join("src.txt");
    fs::write(&source, "hello world").unwrap();

    let destination = temp.path().join("a").join("b").join("dst.txt");
    let bytes = io::copy_file(&source, &destination, RetryPolicy::none()).unwrap();

    assert_eq!(bytes, 11);
    assert_eq!(fs::read_to_string(&destination).unwrap(), "hello world");
}

#[test]
fn test_copy_file_overwrites_existing() {
    let temp = TempDir::new().unwrap();
    let source = temp.path().join("src.txt");
    let destination = temp.path().join("dst.txt");
    fs::write(&source, "updated").unwrap();
    fs::write(&destination, "original content").unwrap();

    io::copy_file(&source, &destination, RetryPolicy::default()).unwrap();

    assert_eq!(fs::read_to_string(&destination).unwrap(), "updated");
}

#[test]
fn test_copy_file_preserves_modification_time() {
    let temp = TempDir::new().unwrap();
    let source = temp.path().join("src.txt");
    fs::write(&source, "content").unwrap();
    let mtime = FileTime::from_unix_time(1_600_000_000, 0);
    filetime::set_file_mtime(&source, mtime).unwrap();

    let destination = temp.path().join("dst.txt");
    io::copy_file(&source, &destination, RetryPolicy::none()).unwrap();

    let copied = FileTime::from_last_modification_time(&fs::metadata(&destination).unwrap());
    assert_eq!(copied, mtime);
}

#[test]
fn test_copy_missing_source_fails() {
    let temp = TempDir::new().unwrap();
    let result = io::copy_file(
        &temp.path().join("vanished.txt"),
        &temp.path().join("dst.txt"),
        RetryPolicy::default(),
    );

    assert!(matches!(
        result,
        Err(Error::Io { ref source, .. }) if source.kind() == std::io::ErrorKind::NotFound
    ));
    assert!(!temp.path().join("dst.txt").exists());
}

#[test]
fn test_remove_file_if_exists() {
    let temp = TempDir::new().unwrap();
    let file = temp.path().join("gone.txt");
    fs::write(&file, "x").unwrap();

    assert!(io::remove_file_if_exists(&file).unwrap());
    assert!(!file.exists());
    // Second removal is already satisfied
    assert!(!io::remove_file_if_exists(&file).unwrap());
}

#[test]
fn test_remove_dir_if_empty_outcomes() {
    let temp = TempDir::new().unwrap();
    let empty = temp.path().join("empty");
    let full = temp.path().join("full");
    fs::create_dir(&empty).unwrap();
    fs::create_dir(&full).unwrap();
    fs::write(full.join("keep.txt"), "x").unwrap();

    assert_eq!(io::remove_dir_if_empty(&empty).unwrap(), DirRemoval::Removed);
    assert_eq!(io::remove_dir_if_empty(&empty).unwrap(), DirRemoval::Absent);
    assert_eq!(io::remove_dir_if_empty(&full).unwrap(), DirRemoval::NotEmpty);
    assert!(full.exists());
}

#[test]
fn test_prune_stops_at_boundary() {
    let temp = TempDir::new().unwrap();
    let genre = temp.path().join("genre");
    let album = genre.join("artist").join("album");
    fs::create_dir_all(&album).unwrap();

    let removed = io::prune_empty_ancestors(&album, &genre).unwrap();

    assert_eq!(removed, vec![album.clone(), genre.join("artist")]);
    assert!(genre.exists(), "boundary directory must survive");
    assert!(temp.path().exists());
}

#[test]
fn test_prune_stops_at_first_non_empty_directory() {
    let temp = TempDir::new().unwrap();
    let genre = temp.path().join("genre");
    let artist = genre.join("artist");
    let album = artist.join("album");
    fs::create_dir_all(&album).unwrap();
    fs::write(artist.join("cover.jpg"), "x").unwrap();

    let removed = io::prune_empty_ancestors(&album, &genre).unwrap();

    assert_eq!(removed, vec![album]);
    assert!(artist.exists());
}

#[test]
fn test_prune_never_removes_boundary_itself() {
    let temp = TempDir::new().unwrap();
    let genre = temp.path().join("genre");
    fs::create_dir(&genre).unwrap();

    let removed = io::prune_empty_ancestors(&genre, &genre).unwrap();

    assert!(removed.is_empty());
    assert!(genre.exists());
}

#[test]
fn test_prune_ignores_paths_outside_boundary() {
    let temp = TempDir::new().unwrap();
    let other = temp.path().join("other").join("empty");
    fs::create_dir_all(&other).unwrap();

    let removed = io::prune_empty_ancestors(&other, &temp.path().join("genre")).unwrap();

    assert!(removed.is_empty());
    assert!(other.exists());
}

#[test]
fn test_prune_continues_past_already_removed_directory() {
    let temp = TempDir::new().unwrap();
    let genre = temp.path().join("genre");
    let artist = genre.join("artist");
    fs::create_dir_all(&artist).unwrap();

    // album was never created (or was removed by someone else)
    let removed = io::prune_empty_ancestors(&artist.join("album"), &genre).unwrap();

    assert_eq!(removed, vec![artist.clone()]);
    assert!(!artist.exists());
    assert!(genre.exists());
}
