//! Process memory sampling.
//!
//! Reads resident, virtual and data-segment sizes from the Linux
//! `/proc/self/status` accounting file.

use crate::error::{MemoryError, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Default process status file.
pub const DEFAULT_STATUS_PATH: &str = "/proc/self/status";

const RSS_FIELD: &str = "VmRSS";
const VIRTUAL_FIELD: &str = "VmSize";
const DATA_FIELD: &str = "VmData";

/// One memory measurement, in megabytes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MemorySample {
    /// Resident set size.
    pub resident_mb: f64,
    /// Virtual memory size.
    pub virtual_mb: f64,
    /// Data segment size.
    pub data_mb: f64,
}

/// Reads [`MemorySample`]s from a status file.
#[derive(Debug, Clone)]
pub struct MemorySampler {
    path: PathBuf,
}

impl Default for MemorySampler {
    fn default() -> Self {
        Self::new(DEFAULT_STATUS_PATH)
    }
}

impl MemorySampler {
    /// Creates a sampler reading from `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the status file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Takes a sample.
    ///
    /// # Errors
    ///
    /// Fails if the status file cannot be read or lacks a required field.
    pub fn sample(&self) -> Result<MemorySample> {
        let text = std::fs::read_to_string(&self.path).map_err(|e| MemoryError::ReadFailed {
            path: self.path.display().to_string(),
            reason: e.to_string(),
        })?;
        Ok(parse_status(&text)?)
    }
}

/// Parses the `VmRSS`, `VmSize` and `VmData` lines of a status text.
///
/// Values are reported by the kernel in kB and converted to MB.
pub fn parse_status(text: &str) -> std::result::Result<MemorySample, MemoryError> {
    let mut resident = None;
    let mut virtual_size = None;
    let mut data = None;

    for line in text.lines() {
        if line.starts_with(RSS_FIELD) {
            resident = Some(parse_kb(RSS_FIELD, line)?);
        } else if line.starts_with(VIRTUAL_FIELD) {
            virtual_size = Some(parse_kb(VIRTUAL_FIELD, line)?);
        } else if line.starts_with(DATA_FIELD) {
            data = Some(parse_kb(DATA_FIELD, line)?);
        }
    }

    Ok(MemorySample {
        resident_mb: kb_to_mb(resident.ok_or(MemoryError::MissingField { field: RSS_FIELD })?),
        virtual_mb: kb_to_mb(virtual_size.ok_or(MemoryError::MissingField {
            field: VIRTUAL_FIELD,
        })?),
        data_mb: kb_to_mb(data.ok_or(MemoryError::MissingField { field: DATA_FIELD })?),
    })
}

fn parse_kb(field: &'static str, line: &str) -> std::result::Result<u64, MemoryError> {
    // "VmRSS:\t   12345 kB"
    let raw = line.split_whitespace().nth(1).unwrap_or_default();
    raw.parse::<u64>().map_err(|_| MemoryError::InvalidValue {
        field,
        value: raw.to_string(),
    })
}

#[allow(clippy::cast_precision_loss)]
fn kb_to_mb(kb: u64) -> f64 {
    kb as f64 / 1024.0
}
