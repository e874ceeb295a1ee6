//! mergeapks - merge split APKs into one universal APK
//!
//! Apps distributed as split APKs ship a base package plus configuration
//! splits per ABI, locale and screen density. This crate folds such a set
//! back into a single installable package.
//!
//! # Pipeline
//!
//! 1. Validate the inputs (at least two `.apk` files that exist)
//! 2. Copy them into a scratch workspace (`.mergeapks`)
//! 3. Decode each one with `apktool d -s`
//! 4. Merge `assets`, `lib`, `res`, `unknown` and `kotlin` of every secondary
//!    tree into the primary tree, never overwriting the primary's files, and
//!    fold the `doNotCompress` lists of `apktool.yml` together
//! 5. Strip split markers from `AndroidManifest.xml` and drop stale signatures
//! 6. Rebuild with `apktool b`, align with `zipalign -p -f 4`
//! 7. Re-sign with `apksigner` when `mergeapks.sign.properties` enables it
//! 8. Write `result.apk` to the working directory
//!
//! # Command Line Usage
//!
//! ```bash
//! mergeapks base.apk split_config.arm64_v8a.apk split_config.en.apk split_config.xxhdpi.apk
//! ```
//!
//! # Library Usage
//!
//! ```no_run
//! use mergeapks::{ApkMerger, ExternalTools, MergeConfig, SigningConfig, ToolNames};
//!
//! let work_dir = std::env::current_dir()?;
//! let signing = SigningConfig::discover(&work_dir);
//! let tools = ExternalTools::locate(&ToolNames::from_env(), signing.is_some())?;
//! let config = MergeConfig::new(["base.apk", "split_config.en.apk"], &work_dir)
//!     .with_signing(signing);
//!
//! let output = ApkMerger::new(config, tools).merge()?;
//! println!("{}", output.result.display());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod apktool_config;
mod config;
pub mod dir_merge;
mod error;
pub mod manifest;
mod merger;
mod metrics;
mod package;
pub mod progress;
mod scratch;
mod signing;
mod tools;

pub use apktool_config::{merge_into_file, ApktoolConfig, BlockBounds, APKTOOL_CONFIG_FILE};
pub use config::{MergeConfig, APK_EXTENSION, MIN_INPUTS, RESULT_FILE};
pub use dir_merge::{merge_dir_contents, DirMergeOptions, DirMergeStats};
pub use error::{MergeError, MergeResult};
pub use manifest::{patch_manifest, patch_manifest_text, remove_stale_signatures, MANIFEST_FILE};
pub use merger::{ApkMerger, MergeOutput, ALIGNED_TARGET_FILE, TARGET_FILE};
pub use metrics::StageTimings;
pub use package::{PackageTree, MERGED_DIRECTORIES};
pub use progress::{MergeProgress, ProgressExt, ProgressStyles};
pub use scratch::{ScratchWorkspace, SCRATCH_DIR_NAME};
pub use signing::{parse_properties, SigningConfig, SIGN_PROPERTIES_FILE};
pub use tools::{
    built_artifact_path, ExternalTools, ToolNames, Toolchain, ALIGNMENT, ENV_APKSIGNER,
    ENV_APKTOOL, ENV_ZIPALIGN,
};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
