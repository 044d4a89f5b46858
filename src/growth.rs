//! Memory growth reporting.
//!
//! Each iteration produces one [`IterationReport`], written to the console
//! and appended, timestamped, to a plain-text log. Both writes are flushed
//! immediately so progress survives an interrupted run.

use crate::driver::IterationOutcome;
use crate::error::{LogError, Result};
use crate::memory::MemorySample;
use serde::Serialize;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Default growth log location.
pub const DEFAULT_LOG_PATH: &str = "/app/memory_growth.log";

/// First header line of the growth log.
pub const LOG_TITLE: &str = "LM Memory Growth Probe - Memory Growth Log";

/// Cumulative and per-iteration growth.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Growth {
    /// Current minus baseline resident MB.
    pub growth_mb: f64,
    /// Growth divided by iteration count.
    pub rate_mb_per_iter: f64,
}

impl Growth {
    /// Computes growth of `current` over `baseline` after `iteration`
    /// iterations. Iteration numbers start at 1.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn compute(baseline_mb: f64, current_mb: f64, iteration: u64) -> Self {
        let growth_mb = current_mb - baseline_mb;
        Self {
            growth_mb,
            rate_mb_per_iter: growth_mb / iteration.max(1) as f64,
        }
    }
}

/// Everything reported for one iteration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct IterationReport {
    /// 1-based iteration number.
    pub iteration: u64,
    /// Memory after the iteration.
    pub sample: MemorySample,
    /// Growth relative to the baseline.
    #[serde(flatten)]
    pub growth: Growth,
    /// Call tally.
    #[serde(flatten)]
    pub outcome: IterationOutcome,
}

impl IterationReport {
    /// Builds a report from a baseline and a fresh sample.
    #[must_use]
    pub fn new(
        iteration: u64,
        baseline: &MemorySample,
        sample: MemorySample,
        outcome: IterationOutcome,
    ) -> Self {
        Self {
            iteration,
            sample,
            growth: Growth::compute(baseline.resident_mb, sample.resident_mb, iteration),
            outcome,
        }
    }

    /// The human-readable status line.
    #[must_use]
    pub fn line(&self) -> String {
        format!(
            "Iteration {:3}: RSS={:.1}MB (growth={:+.1}MB, rate={:.3}MB/iter)",
            self.iteration,
            self.sample.resident_mb,
            self.growth.growth_mb,
            self.growth.rate_mb_per_iter
        )
    }
}

/// Append-only growth log file.
#[derive(Debug, Clone)]
pub struct GrowthLog {
    path: PathBuf,
}

impl GrowthLog {
    /// Creates or truncates the log and writes the two header lines.
    pub fn create(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let create_err = |e: std::io::Error| LogError::CreateFailed {
            path: path.display().to_string(),
            reason: e.to_string(),
        };

        let mut file = File::create(&path).map_err(create_err)?;
        writeln!(file, "{LOG_TITLE}").map_err(create_err)?;
        writeln!(file, "{}", "=".repeat(50)).map_err(create_err)?;
        file.flush().map_err(create_err)?;

        Ok(Self { path })
    }

    /// Returns the log path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends `[timestamp] line`.
    pub fn append(&self, line: &str) -> Result<()> {
        let append_err = |e: std::io::Error| LogError::AppendFailed {
            path: self.path.display().to_string(),
            reason: e.to_string(),
        };

        let mut file = OpenOptions::new()
            .append(true)
            .open(&self.path)
            .map_err(append_err)?;
        let timestamp = chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.6f");
        writeln!(file, "[{timestamp}] {line}").map_err(append_err)?;
        file.flush().map_err(append_err)?;
        Ok(())
    }
}

/// Writes a report to the console in the chosen format, then flushes.
pub fn write_console<W: Write>(out: &mut W, report: &IterationReport, json: bool) -> Result<()> {
    let line = if json {
        serde_json::to_string(report).map_err(LogError::from)?
    } else {
        report.line()
    };
    let console_err = |e: std::io::Error| LogError::Console(e.to_string());
    writeln!(out, "{line}").map_err(console_err)?;
    out.flush().map_err(console_err)?;
    Ok(())
}
