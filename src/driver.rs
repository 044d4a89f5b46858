//! Iteration driver.
//!
//! One iteration builds a fresh language model and module, fans `N` calls out
//! concurrently, waits for all of them, and drops everything before yielding
//! back to the scheduler.

use crate::lm::{LmFactory, LmSettings};
use crate::module::{ModuleInput, ModuleKind, ReasoningModule};
use futures_util::future::join_all;
use serde::Serialize;
use std::time::Duration;
use tracing::debug;

/// Default pause after dropping the module.
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(10);

/// Call tally of one iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct IterationOutcome {
    /// Calls that produced a prediction.
    pub succeeded: usize,
    /// Calls that failed.
    pub failed: usize,
}

impl IterationOutcome {
    /// Total number of calls.
    #[must_use]
    pub const fn total(&self) -> usize {
        self.succeeded + self.failed
    }
}

/// Runs measurement iterations against a model factory.
pub struct IterationDriver<F> {
    factory: F,
    settings: LmSettings,
    kind: ModuleKind,
    settle_delay: Duration,
}

impl<F: LmFactory> IterationDriver<F> {
    /// Creates a driver building models with `factory`.
    pub fn new(factory: F, settings: LmSettings, kind: ModuleKind) -> Self {
        Self {
            factory,
            settings,
            kind,
            settle_delay: DEFAULT_SETTLE_DELAY,
        }
    }

    /// Sets the pause after each iteration's cleanup.
    #[must_use]
    pub const fn settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }

    /// Returns the selected module variant.
    pub const fn kind(&self) -> ModuleKind {
        self.kind
    }

    /// Runs one iteration with `parallel` concurrent calls.
    ///
    /// Never fails: per-call errors are counted, not propagated.
    pub async fn run_iteration(&self, parallel: usize) -> IterationOutcome {
        let outcome = {
            let lm = self.factory.create(self.settings.clone());
            let module = ReasoningModule::new(self.kind, lm);
            let inputs = ModuleInput::batch(parallel);

            let results = join_all(inputs.iter().map(|input| module.call(input))).await;

            let mut outcome = IterationOutcome::default();
            for result in &results {
                match result {
                    Ok(_) => outcome.succeeded += 1,
                    Err(e) => {
                        debug!(error = %e, "call failed");
                        outcome.failed += 1;
                    }
                }
            }

            drop(results);
            module.clear_history();
            outcome
            // module, lm and inputs are dropped here
        };

        tokio::task::yield_now().await;
        tokio::time::sleep(self.settle_delay).await;
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LmError;
    use crate::lm::{LanguageModel, LmRequest};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex, Weak};

    struct Counting {
        calls: AtomicUsize,
        fail_every: usize,
    }

    #[async_trait]
    impl LanguageModel for Counting {
        async fn complete(&self, _request: &LmRequest) -> Result<String, LmError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::task::yield_now().await;
            if self.fail_every > 0 && n % self.fail_every == 0 {
                Err(LmError::RequestFailed("rate limited".to_string()))
            } else {
                Ok("[[ ## reasoning ## ]]\nr\n[[ ## result ## ]]\nok".to_string())
            }
        }
    }

    #[tokio::test]
    async fn test_all_calls_succeed() {
        let factory = |_s: LmSettings| -> Arc<dyn LanguageModel> {
            Arc::new(Counting {
                calls: AtomicUsize::new(0),
                fail_every: 0,
            })
        };
        let driver = IterationDriver::new(factory, LmSettings::new("m", "k"), ModuleKind::default())
            .settle_delay(Duration::ZERO);
        let outcome = driver.run_iteration(10).await;
        assert_eq!(outcome.succeeded, 10);
        assert_eq!(outcome.failed, 0);
    }

    #[tokio::test]
    async fn test_failures_do_not_abort_batch() {
        let factory = |_s: LmSettings| -> Arc<dyn LanguageModel> {
            Arc::new(Counting {
                calls: AtomicUsize::new(0),
                fail_every: 3,
            })
        };
        let driver = IterationDriver::new(factory, LmSettings::new("m", "k"), ModuleKind::Predict)
            .settle_delay(Duration::ZERO);
        let outcome = driver.run_iteration(10).await;
        // calls 0, 3, 6, 9 fail
        assert_eq!(outcome.failed, 4);
        assert_eq!(outcome.succeeded, 6);
        assert_eq!(outcome.total(), 10);
    }

    #[tokio::test]
    async fn test_model_does_not_outlive_iteration() {
        let created: Arc<Mutex<Vec<Weak<dyn LanguageModel>>>> = Arc::default();
        let sink = Arc::clone(&created);
        let factory = move |_s: LmSettings| -> Arc<dyn LanguageModel> {
            let lm: Arc<dyn LanguageModel> = Arc::new(Counting {
                calls: AtomicUsize::new(0),
                fail_every: 0,
            });
            sink.lock().unwrap().push(Arc::downgrade(&lm));
            lm
        };
        let driver = IterationDriver::new(factory, LmSettings::new("m", "k"), ModuleKind::default())
            .settle_delay(Duration::ZERO);

        driver.run_iteration(4).await;
        driver.run_iteration(4).await;

        let created = created.lock().unwrap();
        assert_eq!(created.len(), 2);
        assert!(created.iter().all(|w| w.upgrade().is_none()));
    }

    #[tokio::test]
    async fn test_factory_receives_settings() {
        let seen: Arc<Mutex<Option<LmSettings>>> = Arc::default();
        let sink = Arc::clone(&seen);
        let factory = move |s: LmSettings| -> Arc<dyn LanguageModel> {
            *sink.lock().unwrap() = Some(s);
            Arc::new(Counting {
                calls: AtomicUsize::new(0),
                fail_every: 0,
            })
        };
        let driver = IterationDriver::new(
            factory,
            LmSettings::new("gpt-3.5-turbo", "sk-abc"),
            ModuleKind::Predict,
        )
        .settle_delay(Duration::ZERO);
        driver.run_iteration(1).await;

        let seen = seen.lock().unwrap().clone().unwrap();
        assert_eq!(seen.api_key, "sk-abc");
        assert_eq!(seen.model, "gpt-3.5-turbo");
    }

    #[tokio::test]
    async fn test_zero_parallel_is_empty_iteration() {
        let factory = |_s: LmSettings| -> Arc<dyn LanguageModel> {
            Arc::new(Counting {
                calls: AtomicUsize::new(0),
                fail_every: 0,
            })
        };
        let driver = IterationDriver::new(factory, LmSettings::new("m", "k"), ModuleKind::Predict)
            .settle_delay(Duration::ZERO);
        assert_eq!(driver.run_iteration(0).await, IterationOutcome::default());
    }
}
