//! Main measurement loop.
//!
//! Takes a resident-memory baseline, initializes the growth log, then runs
//! iteration -> sample -> log -> pause until interrupted or until the
//! optional iteration bound is reached.

use crate::cli::{OutputFormat, ProbeConfig};
use crate::cli::output::{format_banner, format_missing_key, format_run_header};
use crate::driver::IterationDriver;
use crate::error::{LogError, Result};
use crate::growth::{GrowthLog, IterationReport, write_console};
use crate::lm::LmFactory;
use crate::memory::MemorySampler;
use std::io::Write;
use tracing::info;

/// How a run ended.
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    /// No credential was configured; nothing was measured.
    MissingCredential,
    /// The iteration bound was reached.
    Completed {
        /// Iterations executed.
        iterations: u64,
        /// Report of the final iteration, if any ran.
        last: Option<IterationReport>,
    },
}

fn say<W: Write>(out: &mut W, text: &str) -> Result<()> {
    out.write_all(text.as_bytes())
        .and_then(|()| out.flush())
        .map_err(|e| LogError::Console(e.to_string()))?;
    Ok(())
}

/// Runs the probe, writing console output to `out`.
///
/// Without an iteration bound this only returns on error.
///
/// # Errors
///
/// Fails when the status file cannot be sampled or the log cannot be
/// written. Individual call failures never end the run.
pub async fn run<F, W>(config: &ProbeConfig, factory: F, out: &mut W) -> Result<RunOutcome>
where
    F: LmFactory,
    W: Write,
{
    say(out, &format_banner(config.kind))?;

    let Some(settings) = config.lm_settings() else {
        say(out, &format_missing_key())?;
        return Ok(RunOutcome::MissingCredential);
    };

    let sampler = MemorySampler::new(&config.status_path);
    let baseline = sampler.sample()?;
    say(
        out,
        &format_run_header(&baseline, config.parallel, &config.log_path),
    )?;

    let log = GrowthLog::create(&config.log_path)?;
    let driver =
        IterationDriver::new(factory, settings, config.kind).settle_delay(config.settle_delay);
    let json = config.format == OutputFormat::Json;

    let mut iteration: u64 = 0;
    let mut last = None;
    loop {
        iteration += 1;

        let outcome = driver.run_iteration(config.parallel).await;
        let report = IterationReport::new(iteration, &baseline, sampler.sample()?, outcome);

        write_console(out, &report, json)?;
        log.append(&report.line())?;
        info!(
            iteration,
            rss_mb = report.sample.resident_mb,
            growth_mb = report.growth.growth_mb,
            failed = outcome.failed,
            "iteration complete"
        );
        last = Some(report);

        if config.iterations.is_some_and(|max| iteration >= max) {
            return Ok(RunOutcome::Completed {
                iterations: iteration,
                last,
            });
        }

        tokio::time::sleep(config.iteration_delay).await;
    }
}
