//! Single-use scratch workspace
//!
//! Holds the staged inputs, their decoded trees and the artifact being built.
//! The directory is removed when the guard is closed or dropped, so a failed
//! run does not leave a stale `.mergeapks` behind unless asked to.

use crate::error::MergeResult;
use std::fs;
use std::path::{Path, PathBuf};

/// Scratch directory name under the working directory
pub const SCRATCH_DIR_NAME: &str = ".mergeapks";

/// Guard owning the scratch directory
#[derive(Debug)]
pub struct ScratchWorkspace {
    path: PathBuf,
    keep_on_drop: bool,
    closed: bool,
}

impl ScratchWorkspace {
    /// Create `path` fresh, removing whatever file or directory was there.
    pub fn create(path: impl Into<PathBuf>) -> MergeResult<Self> {
        let path = path.into();
        remove_path(&path)?;
        fs::create_dir_all(&path)?;
        hide(&path);
        tracing::debug!("Created scratch workspace {}", path.display());

        Ok(Self {
            path,
            keep_on_drop: false,
            closed: false,
        })
    }

    /// Leave the directory on disk if the guard is dropped without `close`
    pub fn keep_on_drop(mut self, keep: bool) -> Self {
        self.keep_on_drop = keep;
        self
    }

    /// Workspace root
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path of an entry inside the workspace
    pub fn join(&self, name: impl AsRef<Path>) -> PathBuf {
        self.path.join(name)
    }

    /// Delete the workspace, reporting failure
    pub fn close(mut self) -> MergeResult<()> {
        self.closed = true;
        fs::remove_dir_all(&self.path)?;
        tracing::debug!("Removed scratch workspace {}", self.path.display());
        Ok(())
    }
}

impl Drop for ScratchWorkspace {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        if self.keep_on_drop {
            tracing::warn!(
                "Scratch workspace left at {} for inspection",
                self.path.display()
            );
            return;
        }
        if let Err(e) = fs::remove_dir_all(&self.path) {
            tracing::warn!(
                "Failed to remove scratch workspace {}: {}",
                self.path.display(),
                e
            );
        }
    }
}

/// Remove a file or directory tree if present
pub(crate) fn remove_path(path: &Path) -> MergeResult<()> {
    match fs::symlink_metadata(path) {
        Ok(metadata) if metadata.is_dir() => fs::remove_dir_all(path)?,
        Ok(_) => fs::remove_file(path)?,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(e.into()),
    }
    Ok(())
}

#[cfg(target_os = "windows")]
fn hide(path: &Path) {
    let status = std::process::Command::new("attrib")
        .arg("+h")
        .arg(path)
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .status();
    if let Err(e) = status {
        tracing::debug!("Could not hide {}: {}", path.display(), e);
    }
}

#[cfg(not(target_os = "windows"))]
fn hide(_path: &Path) {}
