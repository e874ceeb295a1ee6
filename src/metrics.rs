//! Stage timings for a merge run
//!
//! Decoding and rebuilding dominate a run; the report makes it easy to see
//! which external tool was slow.

use std::time::{Duration, Instant};

/// Wall-clock timings per pipeline stage
#[derive(Debug, Clone)]
pub struct StageTimings {
    /// When measurement started
    start: Instant,
    /// Stages in execution order
    phases: Vec<(String, Duration)>,
    /// Total run time, set by [`StageTimings::mark_total`]
    pub total: Option<Duration>,
}

impl Default for StageTimings {
    fn default() -> Self {
        Self::new()
    }
}

impl StageTimings {
    /// Start measuring
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
            phases: Vec::new(),
            total: None,
        }
    }

    /// Record a finished stage
    pub fn add_phase(&mut self, name: impl Into<String>, duration: Duration) {
        self.phases.push((name.into(), duration));
    }

    /// Time a closure and record it as a stage
    pub fn time_phase<F, R>(&mut self, name: impl Into<String>, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        let phase_start = Instant::now();
        let result = f();
        self.phases.push((name.into(), phase_start.elapsed()));
        result
    }

    /// Mark the end of the run
    pub fn mark_total(&mut self) {
        self.total = Some(self.start.elapsed());
    }

    /// Recorded stages
    pub fn phases(&self) -> &[(String, Duration)] {
        &self.phases
    }

    /// Elapsed time since start
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    fn format_duration(d: Duration) -> String {
        let ms = d.as_secs_f64() * 1000.0;
        if ms < 1.0 {
            format!("{}µs", d.as_micros())
        } else if ms < 1000.0 {
            format!("{:.2}ms", ms)
        } else {
            format!("{:.2}s", d.as_secs_f64())
        }
    }

    /// Formatted report
    pub fn report(&self) -> String {
        let mut lines = Vec::new();
        lines.push("=== Merge Stages ===".to_string());
        for (name, duration) in &self.phases {
            lines.push(format!(
                "  {:<20} {:>10}",
                name,
                Self::format_duration(*duration)
            ));
        }
        let total = self.total.unwrap_or_else(|| self.elapsed());
        lines.push(format!("  {:<20} {:>10}", "total", Self::format_duration(total)));
        lines.join("\n")
    }

    /// Log the report at debug level
    pub fn log_report(&self) {
        for line in self.report().lines() {
            tracing::debug!("{}", line);
        }
    }
}
