//! CLI layer for lmprobe.
//!
//! Provides the command-line interface using clap and the console
//! formatting for banners and iteration lines.

pub mod output;
pub mod parser;

pub use output::OutputFormat;
pub use parser::{Cli, ProbeConfig};
