//! OpenAI chat-completions backed language model.

use super::{LanguageModel, LmRequest, LmSettings, Message};
use crate::error::LmError;
use async_openai::Client;
use async_openai::config::OpenAIConfig;
use async_openai::types::{
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequest,
    CreateChatCompletionRequestArgs,
};
use async_trait::async_trait;

/// Language model calling the OpenAI chat completions endpoint.
///
/// Every call issues a request; responses are never cached.
#[derive(Debug, Clone)]
pub struct OpenAiModel {
    client: Client<OpenAIConfig>,
    settings: LmSettings,
}

impl OpenAiModel {
    /// Creates a client from settings.
    #[must_use]
    pub fn new(settings: LmSettings) -> Self {
        let mut config = OpenAIConfig::new().with_api_key(settings.api_key.clone());
        if let Some(ref base) = settings.api_base {
            config = config.with_api_base(base.clone());
        }
        Self {
            client: Client::with_config(config),
            settings,
        }
    }

    /// Returns the settings this model was built with.
    #[must_use]
    pub const fn settings(&self) -> &LmSettings {
        &self.settings
    }

    fn build_request(&self, request: &LmRequest) -> Result<CreateChatCompletionRequest, LmError> {
        let messages = request
            .messages
            .iter()
            .map(to_openai_message)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(CreateChatCompletionRequestArgs::default()
            .model(self.settings.model.clone())
            .messages(messages)
            .temperature(self.settings.temperature)
            .max_tokens(self.settings.max_tokens)
            .build()?)
    }
}

fn to_openai_message(message: &Message) -> Result<ChatCompletionRequestMessage, LmError> {
    Ok(match message {
        Message::System(text) => ChatCompletionRequestSystemMessageArgs::default()
            .content(text.as_str())
            .build()?
            .into(),
        Message::User(text) => ChatCompletionRequestUserMessageArgs::default()
            .content(text.as_str())
            .build()?
            .into(),
    })
}

#[async_trait]
impl LanguageModel for OpenAiModel {
    async fn complete(&self, request: &LmRequest) -> Result<String, LmError> {
        let request = self.build_request(request)?;
        let response = self.client.chat().create(request).await?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.is_empty())
            .ok_or(LmError::EmptyCompletion)
    }
}
