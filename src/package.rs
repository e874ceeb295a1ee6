//! Decoded package trees
//!
//! A [`PackageTree`] is the directory apktool produced for one input APK. The
//! first input is the primary tree; every other tree is merged into it and
//! then discarded.

use crate::apktool_config::{ApktoolConfig, APKTOOL_CONFIG_FILE};
use crate::dir_merge::{merge_dir_contents, DirMergeOptions, DirMergeStats};
use crate::error::MergeResult;
use crate::manifest::{self, MANIFEST_FILE};
use std::path::{Path, PathBuf};

/// Top-level directories copied from a secondary tree into the primary
pub const MERGED_DIRECTORIES: [&str; 5] = ["assets", "lib", "res", "unknown", "kotlin"];

/// One decoded APK
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageTree {
    root: PathBuf,
}

impl PackageTree {
    /// Wrap an existing decoded directory
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Tree root
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `apktool.yml`
    pub fn config_path(&self) -> PathBuf {
        self.root.join(APKTOOL_CONFIG_FILE)
    }

    /// `AndroidManifest.xml`
    pub fn manifest_path(&self) -> PathBuf {
        self.root.join(MANIFEST_FILE)
    }

    /// Load this tree's decoder config
    pub fn load_config(&self) -> MergeResult<ApktoolConfig> {
        ApktoolConfig::load(&self.config_path())
    }

    /// Copy the resource directories of `secondary` into this tree.
    ///
    /// Only [`MERGED_DIRECTORIES`] are considered; anything else the decoder
    /// produced is left out. Existing files in this tree are kept.
    pub fn merge_resources_from(
        &self,
        secondary: &PackageTree,
        options: &DirMergeOptions,
    ) -> MergeResult<DirMergeStats> {
        let mut stats = DirMergeStats::default();
        for name in MERGED_DIRECTORIES {
            let src = secondary.root.join(name);
            if !src.is_dir() {
                continue;
            }
            stats += merge_dir_contents(&src, &self.root.join(name), options)?;
        }
        Ok(stats)
    }

    /// Drop split markers from the manifest and stale signature files.
    pub fn prepare_for_rebuild(&self) -> MergeResult<()> {
        manifest::remove_stale_signatures(&self.root)?;
        manifest::patch_manifest(&self.manifest_path())
    }
}
