//! Reasoning modules.
//!
//! A module binds a [`Signature`] to a language model. Two variants exist:
//!
//! - **Predict**: asks directly for the `result` field
//! - **`ChainOfThought`**: asks for a `reasoning` field before the `result`
//!
//! Every call is recorded in the module's history, which the iteration
//! driver clears before dropping the module.

pub mod adapter;
pub mod signature;

pub use signature::{Field, Signature};

use crate::error::LmError;
use crate::lm::{LanguageModel, LmRequest};
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

/// Module variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ModuleKind {
    /// Single-step prediction.
    Predict,
    /// Reasoning followed by prediction.
    #[default]
    ChainOfThought,
}

impl ModuleKind {
    /// Parses a selector value.
    ///
    /// `"predict"` selects [`ModuleKind::Predict`]; anything else, including
    /// an empty value, selects [`ModuleKind::ChainOfThought`].
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "predict" => Self::Predict,
            _ => Self::ChainOfThought,
        }
    }

    /// Display name used in banners.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Predict => "Predict",
            Self::ChainOfThought => "ChainOfThought",
        }
    }
}

impl fmt::Display for ModuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Module input pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleInput {
    /// Context text.
    pub context: String,
    /// Query text.
    pub query: String,
}

impl ModuleInput {
    /// Builds the `n` inputs of one iteration.
    #[must_use]
    pub fn batch(n: usize) -> Vec<Self> {
        (0..n)
            .map(|i| Self {
                context: format!("Context for request {i}"),
                query: format!("Query number {i}"),
            })
            .collect()
    }
}

/// Parsed module output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prediction {
    /// Reasoning text, chain-of-thought only.
    pub reasoning: Option<String>,
    /// Result text.
    pub result: String,
}

/// One recorded call.
#[derive(Debug, Clone)]
pub struct HistoryEntry {
    /// Request sent to the model.
    pub request: LmRequest,
    /// Raw completion, or the error text.
    pub response: Result<String, String>,
}

/// A reasoning module bound to a language model.
pub struct ReasoningModule {
    kind: ModuleKind,
    signature: Signature,
    lm: Arc<dyn LanguageModel>,
    history: Mutex<Vec<HistoryEntry>>,
}

impl fmt::Debug for ReasoningModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReasoningModule")
            .field("kind", &self.kind)
            .field("history_len", &self.history_len())
            .finish_non_exhaustive()
    }
}

impl ReasoningModule {
    /// Creates a module of `kind` over `lm`.
    #[must_use]
    pub fn new(kind: ModuleKind, lm: Arc<dyn LanguageModel>) -> Self {
        Self {
            kind,
            signature: Signature::for_kind(kind),
            lm,
            history: Mutex::new(Vec::new()),
        }
    }

    /// Returns the module variant.
    #[must_use]
    pub const fn kind(&self) -> ModuleKind {
        self.kind
    }

    /// Returns the effective signature.
    #[must_use]
    pub const fn signature(&self) -> &Signature {
        &self.signature
    }

    /// Runs the module on one input.
    ///
    /// # Errors
    ///
    /// Returns the model error, or [`LmError::MissingOutputField`] when the
    /// completion lacks a declared output.
    pub async fn call(&self, input: &ModuleInput) -> Result<Prediction, LmError> {
        let request = adapter::format_request(
            &self.signature,
            &[
                (signature::CONTEXT.name, input.context.as_str()),
                (signature::QUERY.name, input.query.as_str()),
            ],
        );

        let response = self.lm.complete(&request).await;
        self.record(HistoryEntry {
            request,
            response: response.as_ref().cloned().map_err(ToString::to_string),
        });

        let mut fields = adapter::parse_completion(&self.signature, &response?)?;
        let result = fields
            .remove(signature::RESULT.name)
            .ok_or_else(|| LmError::MissingOutputField {
                field: signature::RESULT.name.to_string(),
            })?;
        let reasoning = match self.kind {
            ModuleKind::ChainOfThought => fields.remove(signature::REASONING.name),
            ModuleKind::Predict => None,
        };

        Ok(Prediction { reasoning, result })
    }

    fn record(&self, entry: HistoryEntry) {
        self.history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(entry);
    }

    /// Number of recorded calls.
    pub fn history_len(&self) -> usize {
        self.history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Drops all recorded calls and their buffers.
    pub fn clear_history(&self) {
        let mut history = self.history.lock().unwrap_or_else(PoisonError::into_inner);
        history.clear();
        history.shrink_to_fit();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lm::Message;
    use async_trait::async_trait;
    use test_case::test_case;

    struct Canned(Result<&'static str, ()>);

    #[async_trait]
    impl LanguageModel for Canned {
        async fn complete(&self, _request: &LmRequest) -> Result<String, LmError> {
            self.0
                .map(str::to_string)
                .map_err(|()| LmError::RequestFailed("boom".to_string()))
        }
    }

    #[test_case("predict", ModuleKind::Predict ; "predict")]
    #[test_case("PREDICT", ModuleKind::Predict ; "uppercase")]
    #[test_case("chainofthought", ModuleKind::ChainOfThought ; "chain of thought")]
    #[test_case("", ModuleKind::ChainOfThought ; "empty")]
    #[test_case("react", ModuleKind::ChainOfThought ; "unknown")]
    fn test_module_kind_parse(input: &str, expected: ModuleKind) {
        assert_eq!(ModuleKind::parse(input), expected);
    }

    #[test]
    fn test_module_kind_names() {
        assert_eq!(ModuleKind::Predict.to_string(), "Predict");
        assert_eq!(ModuleKind::ChainOfThought.to_string(), "ChainOfThought");
        assert_eq!(ModuleKind::default(), ModuleKind::ChainOfThought);
    }

    #[test]
    fn test_input_batch() {
        let batch = ModuleInput::batch(3);
        assert_eq!(batch.len(), 3);
        assert_eq!(batch[0].context, "Context for request 0");
        assert_eq!(batch[2].query, "Query number 2");
        assert!(ModuleInput::batch(0).is_empty());
    }

    #[tokio::test]
    async fn test_chain_of_thought_call() {
        let lm = Arc::new(Canned(Ok(
            "[[ ## reasoning ## ]]\nsteps\n[[ ## result ## ]]\ndone\n[[ ## completed ## ]]",
        )));
        let module = ReasoningModule::new(ModuleKind::ChainOfThought, lm);
        let prediction = module.call(&ModuleInput::batch(1)[0]).await.unwrap();
        assert_eq!(prediction.reasoning.as_deref(), Some("steps"));
        assert_eq!(prediction.result, "done");
        assert_eq!(module.history_len(), 1);
    }

    #[tokio::test]
    async fn test_predict_call_has_no_reasoning() {
        let lm = Arc::new(Canned(Ok("[[ ## result ## ]]\ndone")));
        let module = ReasoningModule::new(ModuleKind::Predict, lm);
        let prediction = module.call(&ModuleInput::batch(1)[0]).await.unwrap();
        assert!(prediction.reasoning.is_none());
        assert_eq!(prediction.result, "done");
    }

    #[tokio::test]
    async fn test_failed_call_is_recorded() {
        let module = ReasoningModule::new(ModuleKind::Predict, Arc::new(Canned(Err(()))));
        let err = module.call(&ModuleInput::batch(1)[0]).await.unwrap_err();
        assert!(matches!(err, LmError::RequestFailed(_)));
        assert_eq!(module.history_len(), 1);

        module.clear_history();
        assert_eq!(module.history_len(), 0);
    }

    #[tokio::test]
    async fn test_request_includes_input_values() {
        let module = ReasoningModule::new(
            ModuleKind::Predict,
            Arc::new(Canned(Ok("[[ ## result ## ]]\nx"))),
        );
        let input = ModuleInput {
            context: "the sky".to_string(),
            query: "what colour?".to_string(),
        };
        module.call(&input).await.unwrap();

        let history = module.history.lock().unwrap();
        let Message::User(ref user) = history[0].request.messages[1] else {
            unreachable!("second message is the user turn");
        };
        assert!(user.contains("the sky"));
        assert!(user.contains("what colour?"));
    }
}
