//! Terminal progress for merge stages
//!
//! Each pipeline stage gets a spinner that resolves to a check mark or a
//! cross. Library callers that do not want terminal output use
//! [`MergeProgress::hidden`].

use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::time::Duration;

/// Style presets for stage indicators
pub struct ProgressStyles;

impl ProgressStyles {
    /// Style for a running stage
    pub fn spinner() -> ProgressStyle {
        ProgressStyle::with_template("{spinner:.green} {msg} [{elapsed_precise}]")
            .unwrap()
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"])
    }

    /// Style for a finished stage
    pub fn success() -> ProgressStyle {
        ProgressStyle::with_template("{prefix:.green} {msg}").unwrap()
    }

    /// Style for a failed stage
    pub fn error() -> ProgressStyle {
        ProgressStyle::with_template("{prefix:.red} {msg}").unwrap()
    }
}

/// Progress tracker for a merge run
pub struct MergeProgress {
    multi: MultiProgress,
    visible: bool,
}

impl MergeProgress {
    /// Progress drawn to stderr
    pub fn new() -> Self {
        Self {
            multi: MultiProgress::new(),
            visible: true,
        }
    }

    /// Progress that draws nothing
    pub fn hidden() -> Self {
        Self {
            multi: MultiProgress::with_draw_target(ProgressDrawTarget::hidden()),
            visible: false,
        }
    }

    /// Whether anything is drawn
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Start a spinner for a stage
    pub fn stage(&self, msg: &str) -> ProgressBar {
        let pb = self.multi.add(ProgressBar::new_spinner());
        pb.set_style(ProgressStyles::spinner());
        pb.set_message(msg.to_string());
        if self.visible {
            pb.enable_steady_tick(Duration::from_millis(80));
        }
        pb
    }
}

impl Default for MergeProgress {
    fn default() -> Self {
        Self::hidden()
    }
}

/// Helper trait for finishing stage spinners
pub trait ProgressExt {
    /// Finish with a success message
    fn finish_success(&self, msg: &str);

    /// Finish with an error message
    fn finish_error(&self, msg: &str);
}

impl ProgressExt for ProgressBar {
    fn finish_success(&self, msg: &str) {
        self.set_style(ProgressStyles::success());
        self.set_prefix("✓");
        self.finish_with_message(msg.to_string());
    }

    fn finish_error(&self, msg: &str) {
        self.set_style(ProgressStyles::error());
        self.set_prefix("✗");
        self.finish_with_message(msg.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_styles() {
        let _ = ProgressStyles::spinner();
        let _ = ProgressStyles::success();
        let _ = ProgressStyles::error();
    }

    #[test]
    fn test_hidden_progress() {
        let progress = MergeProgress::hidden();
        assert!(!progress.is_visible());
        let pb = progress.stage("Testing...");
        pb.finish_success("Done");
        assert!(pb.is_finished());
    }
}
