//! Tests for the non-destructive directory merge

use mergeapks::{merge_dir_contents, DirMergeOptions, MergeError};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn write(path: &Path, contents: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

#[test]
fn test_existing_files_are_kept() {
    let temp = TempDir::new().unwrap();
    let src = temp.path().join("src");
    let dst = temp.path().join("dst");
    write(&src.join("values/strings.xml"), "secondary");
    write(&dst.join("values/strings.xml"), "primary");

    let stats = merge_dir_contents(&src, &dst, &DirMergeOptions::default()).unwrap();

    assert_eq!(
        fs::read_to_string(dst.join("values/strings.xml")).unwrap(),
        "primary"
    );
    assert_eq!(stats.files_copied, 0);
    assert_eq!(stats.files_skipped, 1);
}

#[test]
fn test_new_files_are_copied() {
    let temp = TempDir::new().unwrap();
    let src = temp.path().join("src");
    let dst = temp.path().join("dst");
    write(&src.join("values-de/strings.xml"), "de");
    write(&src.join("drawable-xxhdpi/icon.png"), "png bytes");
    write(&src.join("values-fr/nested/deep/file.xml"), "fr");
    write(&dst.join("values/strings.xml"), "primary");

    let stats = merge_dir_contents(&src, &dst, &DirMergeOptions::default()).unwrap();

    assert_eq!(stats.files_copied, 3);
    assert_eq!(stats.errors_suppressed, 0);
    assert_eq!(fs::read(dst.join("values-de/strings.xml")).unwrap(), b"de");
    assert_eq!(
        fs::read(dst.join("drawable-xxhdpi/icon.png")).unwrap(),
        b"png bytes"
    );
    assert_eq!(
        fs::read(dst.join("values-fr/nested/deep/file.xml")).unwrap(),
        b"fr"
    );
    assert!(dst.join("values/strings.xml").exists());
}

#[test]
fn test_destination_created_when_missing() {
    let temp = TempDir::new().unwrap();
    let src = temp.path().join("lib");
    let dst = temp.path().join("primary").join("lib");
    write(&src.join("arm64-v8a/libapp.so"), "elf");
    fs::create_dir_all(src.join("empty")).unwrap();

    merge_dir_contents(&src, &dst, &DirMergeOptions::default()).unwrap();

    assert!(dst.join("arm64-v8a/libapp.so").is_file());
    assert!(dst.join("empty").is_dir());
}

#[test]
fn test_replace_existing_option() {
    let temp = TempDir::new().unwrap();
    let src = temp.path().join("src");
    let dst = temp.path().join("dst");
    write(&src.join("a.txt"), "new");
    write(&dst.join("a.txt"), "old");

    let options = DirMergeOptions {
        replace_existing: true,
        ..Default::default()
    };
    let stats = merge_dir_contents(&src, &dst, &options).unwrap();

    assert_eq!(stats.files_copied, 1);
    assert_eq!(fs::read_to_string(dst.join("a.txt")).unwrap(), "new");
}

#[test]
fn test_modification_time_copied() {
    let temp = TempDir::new().unwrap();
    let src = temp.path().join("src");
    let dst = temp.path().join("dst");
    let file = src.join("raw/data.bin");
    write(&file, "data");
    let mtime = filetime::FileTime::from_unix_time(1_600_000_000, 0);
    filetime::set_file_mtime(&file, mtime).unwrap();

    merge_dir_contents(&src, &dst, &DirMergeOptions::default()).unwrap();

    let copied = fs::metadata(dst.join("raw/data.bin")).unwrap();
    assert_eq!(filetime::FileTime::from_last_modification_time(&copied), mtime);
}

/// A file in the destination where the source has a directory makes every
/// entry below it fail.
fn conflicting_layout(temp: &TempDir) -> (std::path::PathBuf, std::path::PathBuf) {
    let src = temp.path().join("src");
    let dst = temp.path().join("dst");
    write(&src.join("values/strings.xml"), "secondary");
    write(&src.join("zz/other.xml"), "other");
    write(&dst.join("values"), "not a directory");
    (src, dst)
}

#[test]
fn test_io_errors_suppressed_by_default() {
    let temp = TempDir::new().unwrap();
    let (src, dst) = conflicting_layout(&temp);

    let stats = merge_dir_contents(&src, &dst, &DirMergeOptions::default()).unwrap();

    assert!(stats.errors_suppressed > 0);
    // Entries after the failing one are still merged.
    assert_eq!(fs::read_to_string(dst.join("zz/other.xml")).unwrap(), "other");
    assert_eq!(
        fs::read_to_string(dst.join("values")).unwrap(),
        "not a directory"
    );
}

#[test]
fn test_io_errors_propagated_when_strict() {
    let temp = TempDir::new().unwrap();
    let (src, dst) = conflicting_layout(&temp);

    let result = merge_dir_contents(&src, &dst, &DirMergeOptions::strict());

    assert!(matches!(result, Err(MergeError::Io(_))));
}

#[cfg(unix)]
#[test]
fn test_symlinks_followed_by_default() {
    let temp = TempDir::new().unwrap();
    let src = temp.path().join("src");
    let dst = temp.path().join("dst");
    write(&src.join("real.txt"), "target");
    std::os::unix::fs::symlink(src.join("real.txt"), src.join("link.txt")).unwrap();

    merge_dir_contents(&src, &dst, &DirMergeOptions::default()).unwrap();

    let link = dst.join("link.txt");
    assert!(!fs::symlink_metadata(&link).unwrap().file_type().is_symlink());
    assert_eq!(fs::read_to_string(&link).unwrap(), "target");
}

#[cfg(unix)]
#[test]
fn test_symlinks_preserved_when_asked() {
    let temp = TempDir::new().unwrap();
    let src = temp.path().join("src");
    let dst = temp.path().join("dst");
    write(&src.join("real.txt"), "target");
    std::os::unix::fs::symlink("real.txt", src.join("link.txt")).unwrap();

    let options = DirMergeOptions {
        preserve_symlinks: true,
        ..Default::default()
    };
    let stats = merge_dir_contents(&src, &dst, &options).unwrap();

    assert_eq!(stats.links_created, 1);
    let link = dst.join("link.txt");
    assert!(fs::symlink_metadata(&link).unwrap().file_type().is_symlink());
    assert_eq!(fs::read_link(&link).unwrap(), Path::new("real.txt"));
}
