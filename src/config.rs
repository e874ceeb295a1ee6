//! Merge run configuration
//!
//! Everything a run needs is passed in explicitly, including the working
//! directory, so the pipeline never depends on the process-global cwd.

use crate::dir_merge::DirMergeOptions;
use crate::error::{MergeError, MergeResult};
use crate::signing::SigningConfig;
use std::path::{Path, PathBuf};

/// Extension every input must carry
pub const APK_EXTENSION: &str = ".apk";

/// Final artifact name in the working directory
pub const RESULT_FILE: &str = "result.apk";

/// Minimum number of input packages
pub const MIN_INPUTS: usize = 2;

/// Configuration for one merge run
#[derive(Debug, Clone)]
pub struct MergeConfig {
    /// Input APKs; the first one is the primary package
    pub inputs: Vec<PathBuf>,

    /// Directory holding the scratch workspace and receiving the result
    pub work_dir: PathBuf,

    /// Re-sign the result when set
    pub signing: Option<SigningConfig>,

    /// Directory merge behaviour
    pub dir_merge: DirMergeOptions,

    /// Leave the scratch workspace on disk when a run fails
    pub keep_scratch_on_failure: bool,
}

impl MergeConfig {
    /// Create a configuration; relative inputs resolve against `work_dir`
    pub fn new<I, P>(inputs: I, work_dir: impl Into<PathBuf>) -> Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let work_dir = work_dir.into();
        let inputs = inputs
            .into_iter()
            .map(|input| work_dir.join(input))
            .collect();
        Self {
            inputs,
            work_dir,
            signing: None,
            dir_merge: DirMergeOptions::default(),
            keep_scratch_on_failure: false,
        }
    }

    /// Enable signing
    pub fn with_signing(mut self, signing: Option<SigningConfig>) -> Self {
        self.signing = signing;
        self
    }

    /// Set directory merge options
    pub fn with_dir_merge(mut self, options: DirMergeOptions) -> Self {
        self.dir_merge = options;
        self
    }

    /// Keep the scratch workspace after a failed run
    pub fn with_keep_scratch_on_failure(mut self, keep: bool) -> Self {
        self.keep_scratch_on_failure = keep;
        self
    }

    /// Where the merged APK ends up
    pub fn result_path(&self) -> PathBuf {
        self.work_dir.join(RESULT_FILE)
    }

    /// Check inputs before anything touches the filesystem
    pub fn validate(&self) -> MergeResult<()> {
        if self.inputs.len() < MIN_INPUTS {
            return Err(MergeError::Usage(format!(
                "at least {} apk files are required, got {}",
                MIN_INPUTS,
                self.inputs.len()
            )));
        }

        for input in &self.inputs {
            if !has_apk_extension(input) {
                return Err(MergeError::Usage(format!(
                    "{} is not an {} file",
                    input.display(),
                    APK_EXTENSION
                )));
            }
            if !input.exists() {
                return Err(MergeError::Usage(format!(
                    "{} does not exist",
                    input.display()
                )));
            }
        }

        Ok(())
    }
}

fn has_apk_extension(path: &Path) -> bool {
    path.to_string_lossy().ends_with(APK_EXTENSION)
}
