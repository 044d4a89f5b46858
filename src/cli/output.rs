//! Console output formatting.
//!
//! Banners are plain text; per-iteration lines follow the selected format.

use crate::memory::MemorySample;
use crate::module::ModuleKind;
use std::fmt::Write;
use std::path::Path;

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable text output.
    Text,
    /// One JSON object per iteration.
    Json,
}

impl OutputFormat {
    /// Parses format from string.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => Self::Json,
            _ => Self::Text,
        }
    }
}

fn rule() -> String {
    "=".repeat(60)
}

/// Formats the startup banner.
#[must_use]
pub fn format_banner(kind: ModuleKind) -> String {
    let mut output = String::new();
    let _ = writeln!(output, "{}", rule());
    output.push_str("LM Reasoning Module Memory Growth Probe\n");
    let _ = writeln!(output, "{}", rule());
    let _ = writeln!(
        output,
        "\nThis run measures {kind} memory usage with module history clearing enabled.\n"
    );
    output
}

/// Formats the guidance printed when the credential is missing.
#[must_use]
pub fn format_missing_key() -> String {
    let mut output = String::new();
    output.push_str("ERROR: OPENAI_API_KEY environment variable is required\n");
    output.push_str("Set your OpenAI API key and run again:\n");
    output.push_str("  OPENAI_API_KEY='your-key-here' lmprobe\n");
    output
}

/// Formats the header printed once the baseline is known.
#[must_use]
pub fn format_run_header(baseline: &MemorySample, parallel: usize, log_path: &Path) -> String {
    let mut output = String::new();
    output.push_str("Using OpenAI LM with per-iteration settings\n");
    let _ = writeln!(output, "Initial memory: RSS={:.1}MB", baseline.resident_mb);
    let _ = writeln!(
        output,
        "\nRunning test with {parallel} parallel calls per iteration..."
    );
    output.push_str("Press Ctrl+C to stop\n");
    let _ = writeln!(
        output,
        "Memory growth will be logged to {}\n",
        log_path.display()
    );
    output
}
