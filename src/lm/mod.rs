//! Language-model client layer.
//!
//! Settings are passed explicitly by value into every model that is built,
//! so each iteration owns a fresh, self-contained client configuration.

mod openai;

pub use openai::OpenAiModel;

use crate::error::LmError;
use async_trait::async_trait;
use std::sync::Arc;

/// Default chat model.
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";

/// Explicit client configuration for one iteration.
#[derive(Debug, Clone, PartialEq)]
pub struct LmSettings {
    /// Model name, e.g. `gpt-3.5-turbo`.
    pub model: String,
    /// API credential.
    pub api_key: String,
    /// Optional API base URL override.
    pub api_base: Option<String>,
    /// Sampling temperature.
    pub temperature: f32,
    /// Completion token limit.
    pub max_tokens: u32,
}

impl LmSettings {
    /// Creates settings for `model` with the given credential and defaults.
    pub fn new(model: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            api_key: api_key.into(),
            api_base: None,
            temperature: 0.0,
            max_tokens: 1000,
        }
    }

    /// Sets the API base URL.
    #[must_use]
    pub fn with_api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = Some(base.into());
        self
    }
}

/// A chat message sent to the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    /// System instruction.
    System(String),
    /// User turn.
    User(String),
}

/// A single completion request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LmRequest {
    /// Ordered chat messages.
    pub messages: Vec<Message>,
}

/// An opaque language model.
///
/// Implementations must be usable from many concurrent calls through a
/// shared reference.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Returns the completion text for `request`.
    async fn complete(&self, request: &LmRequest) -> Result<String, LmError>;
}

/// Builds a fresh language model from settings.
pub trait LmFactory: Send + Sync {
    /// Creates a model configured by `settings`.
    fn create(&self, settings: LmSettings) -> Arc<dyn LanguageModel>;
}

/// Factory producing [`OpenAiModel`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenAiFactory;

impl LmFactory for OpenAiFactory {
    fn create(&self, settings: LmSettings) -> Arc<dyn LanguageModel> {
        Arc::new(OpenAiModel::new(settings))
    }
}

impl<F> LmFactory for F
where
    F: Fn(LmSettings) -> Arc<dyn LanguageModel> + Send + Sync,
{
    fn create(&self, settings: LmSettings) -> Arc<dyn LanguageModel> {
        self(settings)
    }
}
