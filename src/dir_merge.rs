//! Non-destructive recursive directory merge
//!
//! Copies a secondary package's resource subtree into the primary's. Files
//! already present at the destination are left alone, so the primary package
//! always wins over a secondary's same-named file.

use crate::error::{MergeError, MergeResult};
use filetime::FileTime;
use std::fs;
use std::io;
use std::ops::AddAssign;
use std::path::Path;
use walkdir::{DirEntry, WalkDir};

/// Behaviour switches for [`merge_dir_contents`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirMergeOptions {
    /// Recreate symbolic links instead of following them
    pub preserve_symlinks: bool,
    /// Overwrite destination files that already exist
    pub replace_existing: bool,
    /// Log and continue on per-entry I/O failures instead of aborting
    pub skip_io_errors: bool,
}

impl Default for DirMergeOptions {
    fn default() -> Self {
        Self {
            preserve_symlinks: false,
            replace_existing: false,
            skip_io_errors: true,
        }
    }
}

impl DirMergeOptions {
    /// Options that propagate the first I/O error
    pub fn strict() -> Self {
        Self {
            skip_io_errors: false,
            ..Default::default()
        }
    }
}

/// Counters collected during a merge
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DirMergeStats {
    /// Files copied to the destination
    pub files_copied: usize,
    /// Files skipped because the destination already had them
    pub files_skipped: usize,
    /// Symbolic links recreated
    pub links_created: usize,
    /// I/O errors that were logged and ignored
    pub errors_suppressed: usize,
}

impl AddAssign for DirMergeStats {
    fn add_assign(&mut self, other: Self) {
        self.files_copied += other.files_copied;
        self.files_skipped += other.files_skipped;
        self.links_created += other.links_created;
        self.errors_suppressed += other.errors_suppressed;
    }
}

/// Recursively copy everything under `src` into `dst`.
///
/// `dst` is created when missing; failing to create it is always an error.
/// Per-entry failures, and the final copy of `src`'s timestamps and
/// permissions onto `dst`, follow `options.skip_io_errors`.
pub fn merge_dir_contents(
    src: &Path,
    dst: &Path,
    options: &DirMergeOptions,
) -> MergeResult<DirMergeStats> {
    if !dst.is_dir() {
        fs::create_dir_all(dst)?;
    }

    let mut stats = DirMergeStats::default();

    // Directories come after their contents so their metadata is copied last.
    let walker = WalkDir::new(src)
        .min_depth(1)
        .follow_links(!options.preserve_symlinks)
        .contents_first(true)
        .sort_by_file_name();

    for entry in walker {
        let result = entry
            .map_err(MergeError::from)
            .and_then(|entry| merge_entry(src, dst, &entry, options, &mut stats));
        absorb(result, options, &mut stats)?;
    }

    let result = copy_metadata(src, dst).map_err(MergeError::from);
    absorb(result, options, &mut stats)?;

    tracing::debug!(
        "Merged {} into {}: {} copied, {} skipped, {} errors ignored",
        src.display(),
        dst.display(),
        stats.files_copied,
        stats.files_skipped,
        stats.errors_suppressed
    );

    Ok(stats)
}

fn merge_entry(
    src_root: &Path,
    dst_root: &Path,
    entry: &DirEntry,
    options: &DirMergeOptions,
    stats: &mut DirMergeStats,
) -> MergeResult<()> {
    let relative = entry
        .path()
        .strip_prefix(src_root)
        .map_err(io::Error::other)?;
    let target = dst_root.join(relative);

    if options.preserve_symlinks && entry.path_is_symlink() {
        recreate_symlink(entry.path(), &target)?;
        stats.links_created += 1;
    } else if entry.file_type().is_dir() {
        fs::create_dir_all(&target)?;
        copy_metadata(entry.path(), &target)?;
    } else if options.replace_existing || !target.exists() {
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(entry.path(), &target)?;
        copy_metadata(entry.path(), &target)?;
        stats.files_copied += 1;
    } else {
        stats.files_skipped += 1;
    }

    Ok(())
}

fn absorb(
    result: MergeResult<()>,
    options: &DirMergeOptions,
    stats: &mut DirMergeStats,
) -> MergeResult<()> {
    match result {
        Err(e) if options.skip_io_errors => {
            tracing::debug!("Ignoring merge error: {}", e);
            stats.errors_suppressed += 1;
            Ok(())
        }
        other => other,
    }
}

/// Copy permissions and access/modification times
fn copy_metadata(src: &Path, dst: &Path) -> io::Result<()> {
    let metadata = fs::metadata(src)?;
    fs::set_permissions(dst, metadata.permissions())?;
    filetime::set_file_times(
        dst,
        FileTime::from_last_access_time(&metadata),
        FileTime::from_last_modification_time(&metadata),
    )
}

#[cfg(unix)]
fn recreate_symlink(link: &Path, target: &Path) -> io::Result<()> {
    let destination = fs::read_link(link)?;
    std::os::unix::fs::symlink(destination, target)
}

#[cfg(windows)]
fn recreate_symlink(link: &Path, target: &Path) -> io::Result<()> {
    let destination = fs::read_link(link)?;
    if link.is_dir() {
        std::os::windows::fs::symlink_dir(destination, target)
    } else {
        std::os::windows::fs::symlink_file(destination, target)
    }
}
