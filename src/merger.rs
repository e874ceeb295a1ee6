//! Merge pipeline
//!
//! Stages run strictly in order and the first failure aborts the run:
//! stage inputs, decode, merge, patch, build, align, sign (optional),
//! finalize. External tools are reached only through [`Toolchain`].

use crate::config::MergeConfig;
use crate::dir_merge::DirMergeStats;
use crate::error::{MergeError, MergeResult};
use crate::metrics::StageTimings;
use crate::package::PackageTree;
use crate::progress::{MergeProgress, ProgressExt};
use crate::scratch::{remove_path, ScratchWorkspace, SCRATCH_DIR_NAME};
use crate::signing::SigningConfig;
use crate::tools::Toolchain;
use std::fs;
use std::path::{Path, PathBuf};

/// Build output copied into the scratch workspace
pub const TARGET_FILE: &str = "target.apk";

/// Temporary zipalign output
pub const ALIGNED_TARGET_FILE: &str = "aligned_target.apk";

/// Summary of a successful run
#[derive(Debug)]
pub struct MergeOutput {
    /// Path to the merged APK
    pub result: PathBuf,
    /// Size of the merged APK in bytes
    pub size: u64,
    /// Number of input packages
    pub input_count: usize,
    /// Whether the result was re-signed
    pub signed: bool,
    /// Resource copy counters over all secondary packages
    pub dir_merge: DirMergeStats,
    /// doNotCompress members in the merged config
    pub do_not_compress_entries: usize,
    /// Per-stage timings
    pub timings: StageTimings,
}

/// Merges split APKs into one universal APK
pub struct ApkMerger<T: Toolchain> {
    config: MergeConfig,
    toolchain: T,
    progress: MergeProgress,
}

impl<T: Toolchain> ApkMerger<T> {
    /// Create a merger with hidden progress output
    pub fn new(config: MergeConfig, toolchain: T) -> Self {
        Self {
            config,
            toolchain,
            progress: MergeProgress::hidden(),
        }
    }

    /// Report stages through `progress`
    pub fn with_progress(mut self, progress: MergeProgress) -> Self {
        self.progress = progress;
        self
    }

    /// Run configuration
    pub fn config(&self) -> &MergeConfig {
        &self.config
    }

    /// Toolchain in use
    pub fn toolchain(&self) -> &T {
        &self.toolchain
    }

    /// Run the whole pipeline
    pub fn merge(&self) -> MergeResult<MergeOutput> {
        self.config.validate()?;

        tracing::info!("[*] start");
        let mut timings = StageTimings::new();

        let scratch = ScratchWorkspace::create(self.config.work_dir.join(SCRATCH_DIR_NAME))?
            .keep_on_drop(self.config.keep_scratch_on_failure);

        let staged = self.run_stage("Stage inputs", &mut timings, || {
            self.stage_inputs(&scratch)
        })?;
        let trees = self.run_stage("Decode", &mut timings, || self.decode_all(&staged))?;

        let (primary, secondaries) = trees
            .split_first()
            .ok_or_else(|| MergeError::Usage("no packages to merge".to_string()))?;

        let (dir_merge, do_not_compress_entries) =
            self.run_stage("Merge resources", &mut timings, || {
                self.merge_trees(primary, secondaries)
            })?;
        self.run_stage("Patch manifest", &mut timings, || {
            primary.prepare_for_rebuild()
        })?;

        let artifact = self.run_stage("Build", &mut timings, || self.build(&scratch, primary))?;
        self.run_stage("Align", &mut timings, || self.align(&scratch, &artifact))?;
        if let Some(ref signing) = self.config.signing {
            self.run_stage("Sign", &mut timings, || self.sign(&artifact, signing))?;
        }
        let result = self.run_stage("Finalize", &mut timings, || self.finalize(&artifact))?;

        scratch.close()?;

        timings.mark_total();
        timings.log_report();
        tracing::info!("[*] complete");

        Ok(MergeOutput {
            size: fs::metadata(&result)?.len(),
            result,
            input_count: self.config.inputs.len(),
            signed: self.config.signing.is_some(),
            dir_merge,
            do_not_compress_entries,
            timings,
        })
    }

    fn run_stage<R>(
        &self,
        name: &str,
        timings: &mut StageTimings,
        f: impl FnOnce() -> MergeResult<R>,
    ) -> MergeResult<R> {
        let pb = self.progress.stage(name);
        let result = timings.time_phase(name, f);
        match result {
            Ok(_) => pb.finish_success(name),
            Err(ref e) => pb.finish_error(&format!("{}: {}", name, e)),
        }
        result
    }

    /// Copy every input into the workspace.
    ///
    /// Staged names carry the input position so two inputs with the same
    /// file name from different directories do not collide.
    fn stage_inputs(&self, scratch: &ScratchWorkspace) -> MergeResult<Vec<PathBuf>> {
        let mut staged = Vec::with_capacity(self.config.inputs.len());
        for (index, input) in self.config.inputs.iter().enumerate() {
            let name = input.file_name().ok_or_else(|| {
                MergeError::Usage(format!("{} has no file name", input.display()))
            })?;
            let target = scratch.join(format!("{:02}-{}", index + 1, name.to_string_lossy()));
            fs::copy(input, &target)?;
            tracing::debug!("Staged {} as {}", input.display(), target.display());
            staged.push(target);
        }
        Ok(staged)
    }

    fn decode_all(&self, staged: &[PathBuf]) -> MergeResult<Vec<PackageTree>> {
        let total = staged.len();
        let mut trees = Vec::with_capacity(total);
        for (index, archive) in staged.iter().enumerate() {
            tracing::info!("[*] unpacking {} of {}", index + 1, total);
            let tree_dir = archive.with_extension("");
            self.toolchain.decode(archive, &tree_dir)?;
            if !tree_dir.is_dir() {
                return Err(MergeError::Decode(archive.clone()));
            }
            fs::remove_file(archive)?;
            trees.push(PackageTree::new(tree_dir));
        }
        Ok(trees)
    }

    /// Fold every secondary tree into the primary, in input order.
    fn merge_trees(
        &self,
        primary: &PackageTree,
        secondaries: &[PackageTree],
    ) -> MergeResult<(DirMergeStats, usize)> {
        let mut stats = DirMergeStats::default();
        let mut merged_config = primary.load_config()?;
        if merged_config.bounds().is_none() {
            tracing::warn!(
                "{} has no doNotCompress block, compression rules are not merged",
                primary.config_path().display()
            );
        }

        for secondary in secondaries {
            tracing::info!("[*] merging {}", secondary.root().display());
            stats += primary.merge_resources_from(secondary, &self.config.dir_merge)?;

            let contributed = secondary.load_config()?;
            merged_config.merge_entries(contributed.entries());
        }

        merged_config.save(&primary.config_path())?;
        Ok((stats, merged_config.entries().len()))
    }

    fn build(&self, scratch: &ScratchWorkspace, primary: &PackageTree) -> MergeResult<PathBuf> {
        tracing::info!("[*] repack apk");
        let built = self.toolchain.build(primary.root())?;
        if !built.is_file() {
            return Err(MergeError::ArtifactNotFound(built));
        }

        let target = scratch.join(TARGET_FILE);
        remove_path(&target)?;
        fs::copy(&built, &target)?;
        Ok(target)
    }

    fn align(&self, scratch: &ScratchWorkspace, artifact: &Path) -> MergeResult<()> {
        tracing::info!("[*] zipalign apk");
        require_artifact(artifact)?;

        let aligned = scratch.join(ALIGNED_TARGET_FILE);
        remove_path(&aligned)?;
        self.toolchain.align(artifact, &aligned)?;
        if !aligned.is_file() {
            return Err(MergeError::Align(format!(
                "{} was not produced",
                aligned.display()
            )));
        }

        fs::remove_file(artifact)?;
        fs::rename(&aligned, artifact)?;
        Ok(())
    }

    fn sign(&self, artifact: &Path, signing: &SigningConfig) -> MergeResult<()> {
        require_artifact(artifact)?;
        tracing::info!("[*] resign apk");
        self.toolchain.sign(artifact, signing)
    }

    /// Copy the artifact out of the workspace, replacing any previous result
    fn finalize(&self, artifact: &Path) -> MergeResult<PathBuf> {
        require_artifact(artifact)?;
        let result = self.config.result_path();
        remove_path(&result)?;
        fs::copy(artifact, &result)?;
        Ok(result)
    }
}

fn require_artifact(path: &Path) -> MergeResult<()> {
    if path.is_file() {
        Ok(())
    } else {
        Err(MergeError::ArtifactNotFound(path.to_path_buf()))
    }
}
