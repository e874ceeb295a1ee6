//! External Android build tools
//!
//! Decoding, rebuilding, aligning and signing are delegated to apktool,
//! zipalign and apksigner. The [`Toolchain`] trait is the seam the merger
//! depends on, so the pipeline can run against fakes in tests.

use crate::error::{MergeError, MergeResult};
use crate::signing::SigningConfig;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// Environment variable overriding the apktool executable
pub const ENV_APKTOOL: &str = "MERGEAPKS_APKTOOL";
/// Environment variable overriding the zipalign executable
pub const ENV_ZIPALIGN: &str = "MERGEAPKS_ZIPALIGN";
/// Environment variable overriding the apksigner executable
pub const ENV_APKSIGNER: &str = "MERGEAPKS_APKSIGNER";

/// Alignment boundary passed to zipalign
pub const ALIGNMENT: u32 = 4;

/// Operations the merge pipeline needs from the Android tooling
pub trait Toolchain {
    /// Decode `archive` into the directory `out_dir`
    fn decode(&self, archive: &Path, out_dir: &Path) -> MergeResult<()>;

    /// Rebuild the decoded `tree` and return where the built APK should be
    fn build(&self, tree: &Path) -> MergeResult<PathBuf>;

    /// Write a byte-aligned copy of `input` to `output`
    fn align(&self, input: &Path, output: &Path) -> MergeResult<()>;

    /// Sign `artifact` in place
    fn sign(&self, artifact: &Path, signing: &SigningConfig) -> MergeResult<()>;
}

/// Executable names to look up, before resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolNames {
    pub apktool: String,
    pub zipalign: String,
    pub apksigner: String,
}

impl Default for ToolNames {
    fn default() -> Self {
        Self {
            apktool: "apktool".to_string(),
            zipalign: "zipalign".to_string(),
            apksigner: "apksigner".to_string(),
        }
    }
}

impl ToolNames {
    /// Defaults, overridden by `MERGEAPKS_*` environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let var = |key: &str, default: String| {
            std::env::var(key)
                .ok()
                .filter(|value| !value.trim().is_empty())
                .unwrap_or(default)
        };
        Self {
            apktool: var(ENV_APKTOOL, defaults.apktool),
            zipalign: var(ENV_ZIPALIGN, defaults.zipalign),
            apksigner: var(ENV_APKSIGNER, defaults.apksigner),
        }
    }
}

/// apktool / zipalign / apksigner resolved on the search path
#[derive(Debug, Clone)]
pub struct ExternalTools {
    apktool: PathBuf,
    zipalign: PathBuf,
    apksigner: Option<PathBuf>,
}

impl ExternalTools {
    /// Resolve the tools named by `names`.
    ///
    /// apktool and zipalign are always required; apksigner only when
    /// `require_signer` is set.
    pub fn locate(names: &ToolNames, require_signer: bool) -> MergeResult<Self> {
        let apktool = find_executable(&names.apktool)?;
        let zipalign = find_executable(&names.zipalign)?;
        let apksigner = if require_signer {
            Some(find_executable(&names.apksigner)?)
        } else {
            None
        };

        tracing::debug!("apktool: {}", apktool.display());
        tracing::debug!("zipalign: {}", zipalign.display());
        if let Some(ref path) = apksigner {
            tracing::debug!("apksigner: {}", path.display());
        }

        Ok(Self {
            apktool,
            zipalign,
            apksigner,
        })
    }

    /// Run a tool with output discarded, returning whether it exited with 0
    fn run(&self, program: &Path, args: &[&OsStr], cwd: &Path) -> MergeResult<bool> {
        tracing::debug!("Running {} {:?}", program.display(), args);
        let status = Command::new(program)
            .args(args)
            .current_dir(cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()?;
        if !status.success() {
            tracing::debug!("{} exited with {}", program.display(), status);
        }
        Ok(status.success())
    }
}

impl Toolchain for ExternalTools {
    fn decode(&self, archive: &Path, out_dir: &Path) -> MergeResult<()> {
        let cwd = parent_dir(archive);
        let args: [&OsStr; 6] = [
            "d".as_ref(),
            "-s".as_ref(),
            "-f".as_ref(),
            "-o".as_ref(),
            out_dir.as_os_str(),
            archive.as_os_str(),
        ];
        if !self.run(&self.apktool, &args, cwd)? {
            return Err(MergeError::Decode(archive.to_path_buf()));
        }
        Ok(())
    }

    fn build(&self, tree: &Path) -> MergeResult<PathBuf> {
        let args: [&OsStr; 2] = ["b".as_ref(), tree.as_os_str()];
        if !self.run(&self.apktool, &args, parent_dir(tree))? {
            return Err(MergeError::Build(format!(
                "apktool b {} failed",
                tree.display()
            )));
        }
        Ok(built_artifact_path(tree))
    }

    fn align(&self, input: &Path, output: &Path) -> MergeResult<()> {
        let alignment = ALIGNMENT.to_string();
        let args: [&OsStr; 5] = [
            "-p".as_ref(),
            "-f".as_ref(),
            alignment.as_ref(),
            input.as_os_str(),
            output.as_os_str(),
        ];
        if !self.run(&self.zipalign, &args, parent_dir(input))? {
            return Err(MergeError::Align(format!(
                "zipalign exited with an error for {}",
                input.display()
            )));
        }
        Ok(())
    }

    fn sign(&self, artifact: &Path, signing: &SigningConfig) -> MergeResult<()> {
        let apksigner = self
            .apksigner
            .as_deref()
            .ok_or_else(|| MergeError::ToolNotFound("apksigner".to_string()))?;

        let ks_pass = format!("pass:{}", signing.keystore_password);
        let key_pass = format!("pass:{}", signing.key_password);
        let args: [&OsStr; 10] = [
            "sign".as_ref(),
            "--ks".as_ref(),
            signing.keystore.as_os_str(),
            "--ks-pass".as_ref(),
            ks_pass.as_ref(),
            "--ks-key-alias".as_ref(),
            signing.key_alias.as_ref(),
            "--key-pass".as_ref(),
            key_pass.as_ref(),
            artifact.as_os_str(),
        ];
        if !self.run(apksigner, &args, parent_dir(artifact))? {
            return Err(MergeError::Sign(artifact.display().to_string()));
        }
        Ok(())
    }
}

/// Where `apktool b <tree>` leaves its output: `<tree>/dist/<tree name>.apk`
pub fn built_artifact_path(tree: &Path) -> PathBuf {
    let name = tree
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    tree.join("dist").join(format!("{}.apk", name))
}

fn find_executable(name: &str) -> MergeResult<PathBuf> {
    which::which(name).map_err(|_| MergeError::ToolNotFound(name.to_string()))
}

fn parent_dir(path: &Path) -> &Path {
    path.parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."))
}
