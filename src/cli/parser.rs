//! Command-line argument parsing.
//!
//! Defines the CLI structure using clap derive macros. The credential and
//! module selector fall back to their environment variables.

use crate::cli::output::OutputFormat;
use crate::error::{Error, Result};
use crate::growth::DEFAULT_LOG_PATH;
use crate::lm::{DEFAULT_MODEL, LmSettings};
use crate::memory::DEFAULT_STATUS_PATH;
use crate::module::ModuleKind;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

/// lmprobe: memory growth probe for language-model reasoning modules.
///
/// Repeatedly builds a reasoning module, fans concurrent calls through it,
/// drops it, and logs how resident memory evolves.
#[derive(Parser, Debug)]
#[command(name = "lmprobe")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// OpenAI API key.
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Module variant (predict, chainofthought).
    #[arg(short, long, env = "DSPY_MODULE", default_value = "chainofthought")]
    pub module: String,

    /// Concurrent calls per iteration.
    #[arg(short = 'n', long, default_value = "10")]
    pub parallel: usize,

    /// Chat model name.
    #[arg(long, default_value = DEFAULT_MODEL)]
    pub model: String,

    /// API base URL override.
    #[arg(long, env = "OPENAI_API_BASE")]
    pub api_base: Option<String>,

    /// Growth log file (truncated at startup).
    #[arg(long, default_value = DEFAULT_LOG_PATH)]
    pub log_file: PathBuf,

    /// Process status file to sample.
    #[arg(long, default_value = DEFAULT_STATUS_PATH)]
    pub status_file: PathBuf,

    /// Stop after this many iterations (default: run until interrupted).
    #[arg(long)]
    pub iterations: Option<u64>,

    /// Pause between iterations in milliseconds.
    #[arg(long, default_value = "100")]
    pub iteration_delay_ms: u64,

    /// Enable verbose diagnostics on stderr.
    #[arg(short, long)]
    pub verbose: bool,

    /// Console output format (text, json).
    #[arg(long, default_value = "text")]
    pub format: String,
}

/// Validated run configuration.
#[derive(Debug, Clone)]
pub struct ProbeConfig {
    /// API credential; `None` when unset or empty.
    pub api_key: Option<String>,
    /// Selected module variant.
    pub kind: ModuleKind,
    /// Concurrent calls per iteration.
    pub parallel: usize,
    /// Chat model name.
    pub model: String,
    /// API base URL override.
    pub api_base: Option<String>,
    /// Growth log path.
    pub log_path: PathBuf,
    /// Status file path.
    pub status_path: PathBuf,
    /// Iteration bound.
    pub iterations: Option<u64>,
    /// Pause between iterations.
    pub iteration_delay: Duration,
    /// Pause after each iteration's cleanup.
    pub settle_delay: Duration,
    /// Console output format.
    pub format: OutputFormat,
}

impl ProbeConfig {
    /// Client settings for one iteration, or `None` without a credential.
    #[must_use]
    pub fn lm_settings(&self) -> Option<LmSettings> {
        let key = self.api_key.as_deref()?;
        let settings = LmSettings::new(self.model.clone(), key);
        Some(match self.api_base {
            Some(ref base) => settings.with_api_base(base.clone()),
            None => settings,
        })
    }
}

impl Cli {
    /// Converts parsed arguments into a [`ProbeConfig`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when `--parallel` is zero.
    pub fn config(&self) -> Result<ProbeConfig> {
        if self.parallel == 0 {
            return Err(Error::Config {
                message: "--parallel must be at least 1".to_string(),
            });
        }

        Ok(ProbeConfig {
            api_key: self
                .api_key
                .as_deref()
                .map(str::trim)
                .filter(|k| !k.is_empty())
                .map(str::to_string),
            kind: ModuleKind::parse(&self.module),
            parallel: self.parallel,
            model: self.model.clone(),
            api_base: self.api_base.clone(),
            log_path: self.log_file.clone(),
            status_path: self.status_file.clone(),
            iterations: self.iterations,
            iteration_delay: Duration::from_millis(self.iteration_delay_ms),
            settle_delay: crate::driver::DEFAULT_SETTLE_DELAY,
            format: OutputFormat::parse(&self.format),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("lmprobe").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_cli_parse() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_explicit_flags() {
        let cli = parse(&[
            "--api-key",
            "sk-test",
            "--module",
            "predict",
            "-n",
            "4",
            "--log-file",
            "/tmp/growth.log",
            "--iterations",
            "3",
            "--format",
            "json",
        ]);
        let config = cli.config().unwrap();
        assert_eq!(config.api_key.as_deref(), Some("sk-test"));
        assert_eq!(config.kind, ModuleKind::Predict);
        assert_eq!(config.parallel, 4);
        assert_eq!(config.log_path, PathBuf::from("/tmp/growth.log"));
        assert_eq!(config.iterations, Some(3));
        assert_eq!(config.format, OutputFormat::Json);
    }

    #[test]
    fn test_blank_api_key_is_missing() {
        let cli = parse(&["--api-key", "   "]);
        let config = cli.config().unwrap();
        assert!(config.api_key.is_none());
        assert!(config.lm_settings().is_none());
    }

    #[test]
    fn test_zero_parallel_rejected() {
        let cli = parse(&["--api-key", "k", "--parallel", "0"]);
        assert!(matches!(cli.config(), Err(Error::Config { .. })));
    }

    #[test]
    fn test_lm_settings_from_config() {
        let cli = parse(&[
            "--api-key",
            "sk-1",
            "--model",
            "gpt-4o-mini",
            "--api-base",
            "http://localhost:1234/v1",
        ]);
        let settings = cli.config().unwrap().lm_settings().unwrap();
        assert_eq!(settings.api_key, "sk-1");
        assert_eq!(settings.model, "gpt-4o-mini");
        assert_eq!(settings.api_base.as_deref(), Some("http://localhost:1234/v1"));
    }

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["lmprobe", "--module", "chainofthought"]).unwrap();
        let config = cli.config().unwrap();
        assert_eq!(config.kind, ModuleKind::ChainOfThought);
        assert_eq!(config.parallel, 10);
        assert_eq!(config.status_path, PathBuf::from("/proc/self/status"));
        assert_eq!(config.iteration_delay, Duration::from_millis(100));
        assert!(config.iterations.is_none());
    }
}
