//! Error types for mergeapks

use std::path::PathBuf;
use thiserror::Error;

/// Result type for merge operations
pub type MergeResult<T> = Result<T, MergeError>;

/// Errors that can occur while merging split APKs
#[derive(Error, Debug)]
pub enum MergeError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Directory traversal error
    #[error("Directory walk error: {0}")]
    Walk(#[from] walkdir::Error),

    /// Malformed or insufficient command line arguments
    #[error("Invalid arguments: {0}")]
    Usage(String),

    /// A required external executable is not on the search path
    #[error("executable {0} not found in $PATH, please install it before running mergeapks")]
    ToolNotFound(String),

    /// The decoder exited with a non-zero status
    #[error("failed to unpack {0}")]
    Decode(PathBuf),

    /// The recompiler exited with a non-zero status
    #[error("failed to pack apk: {0}")]
    Build(String),

    /// The aligner failed or produced no output
    #[error("failed to zipalign apk: {0}")]
    Align(String),

    /// The signer exited with a non-zero status
    #[error("failed to sign apk file: {0}")]
    Sign(String),

    /// An artifact expected after a pipeline step is missing
    #[error("result apk not found: {0}")]
    ArtifactNotFound(PathBuf),
}

impl MergeError {
    /// Process exit code for this error
    ///
    /// Usage errors exit with `-1`, a missing external tool with `-2`.
    /// Every other failure is a pipeline error and exits with `1`.
    pub fn exit_code(&self) -> i32 {
        match self {
            MergeError::Usage(_) => -1,
            MergeError::ToolNotFound(_) => -2,
            _ => 1,
        }
    }
}
