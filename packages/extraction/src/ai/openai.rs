//! OpenAI implementation of the LanguageModel trait.
//!
//! # Example
//!
//! ```rust,ignore
//! use extraction::ai::OpenAiModel;
//!
//! let model = OpenAiModel::from_env()?;
//! let requester = ExtractionRequester::new(Arc::new(model), schema, config);
//! ```

use async_trait::async_trait;
use openai_client::{ChatRequest, Message, OpenAIClient, OpenAIError};

use crate::error::{ModelError, ModelResult};
use crate::security::ModelCredentials;
use crate::traits::llm::{Completion, CompletionConstraints, LanguageModel, Prompt};
use crate::types::record::TokenUsage;

/// Default chat model.
pub const DEFAULT_MODEL: &str = "gpt-4o";

/// OpenAI chat completions behind the [`LanguageModel`] seam.
///
/// The model named in [`CompletionConstraints`] wins over the default
/// model from the credentials.
#[derive(Clone)]
pub struct OpenAiModel {
    client: OpenAIClient,
    default_model: String,
}

impl OpenAiModel {
    pub fn new(credentials: &ModelCredentials) -> Self {
        let mut client = OpenAIClient::new(credentials.api_key.expose());
        if let Some(base_url) = &credentials.base_url {
            client = client.with_base_url(base_url.clone());
        }
        Self {
            client,
            default_model: credentials.model.clone(),
        }
    }

    /// Read `OPENAI_API_KEY` (and optionally `OPENAI_MODEL`, `OPENAI_BASE_URL`).
    pub fn from_env() -> ModelResult<Self> {
        let credentials = ModelCredentials::from_env(DEFAULT_MODEL)
            .ok_or_else(|| ModelError::Unavailable("OPENAI_API_KEY not set".into()))?;
        Ok(Self::new(&credentials))
    }

    pub fn default_model(&self) -> &str {
        &self.default_model
    }

    fn request(&self, prompt: &Prompt, constraints: &CompletionConstraints) -> ChatRequest {
        let model = if constraints.model.is_empty() {
            self.default_model.clone()
        } else {
            constraints.model.clone()
        };

        let request = ChatRequest::new(model)
            .message(Message::system(&prompt.system))
            .message(Message::user(&prompt.user))
            .temperature(constraints.temperature)
            .output_limit(constraints.max_output_tokens);

        if constraints.json_output {
            request.json_object()
        } else {
            request
        }
    }
}

impl From<OpenAIError> for ModelError {
    fn from(e: OpenAIError) -> Self {
        match e {
            OpenAIError::Timeout => ModelError::Timeout,
            OpenAIError::Network(reason) | OpenAIError::Config(reason) => ModelError::Unavailable(reason),
            OpenAIError::RateLimited { retry_after, message } => ModelError::Unavailable(match retry_after {
                Some(wait) => format!("rate limited, retry after {}s: {}", wait.as_secs(), message),
                None => format!("rate limited: {}", message),
            }),
            OpenAIError::Api { status, message } => ModelError::Api(format!("{}: {}", status, message)),
            OpenAIError::Parse(reason) => ModelError::Api(reason),
            OpenAIError::EmptyContent { .. } => ModelError::EmptyCompletion,
        }
    }
}

#[async_trait]
impl LanguageModel for OpenAiModel {
    async fn complete(
        &self,
        prompt: &Prompt,
        constraints: &CompletionConstraints,
    ) -> ModelResult<Completion> {
        let request = self.request(prompt, constraints);
        let requested_model = request.model.clone();
        let response = self.client.chat_completion(request).await?;

        let mut completion = Completion::new(
            response.content,
            response.model.unwrap_or(requested_model),
        );
        if let Some(usage) = response.usage {
            completion = completion.with_usage(TokenUsage {
                prompt_tokens: usage.prompt_tokens,
                completion_tokens: usage.completion_tokens,
                total_tokens: usage.total_tokens,
            });
        }
        Ok(completion)
    }

    fn name(&self) -> &str {
        "openai"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn constraints(model: &str) -> CompletionConstraints {
        CompletionConstraints {
            model: model.into(),
            temperature: 0.1,
            max_output_tokens: 2000,
            json_output: true,
        }
    }

    #[test]
    fn request_honors_constraints() {
        let model = OpenAiModel::new(&ModelCredentials::new("sk-test", "gpt-4o-mini"));
        let request = model.request(&Prompt::new("sys", "user"), &constraints("gpt-4o"));

        assert_eq!(request.model, "gpt-4o");
        assert_eq!(request.temperature, Some(0.1));
        assert_eq!(request.output_tokens(), Some(2000));
        assert!(request.response_format.is_some());
        assert_eq!(request.messages.len(), 2);
    }

    #[test]
    fn empty_model_falls_back_to_default() {
        let model = OpenAiModel::new(&ModelCredentials::new("sk-test", "gpt-4o-mini"));
        let request = model.request(&Prompt::new("sys", "user"), &constraints(""));
        assert_eq!(request.model, "gpt-4o-mini");
    }

    #[test]
    fn errors_map_to_model_errors() {
        assert!(matches!(ModelError::from(OpenAIError::Timeout), ModelError::Timeout));
        assert!(matches!(
            ModelError::from(OpenAIError::Network("refused".into())),
            ModelError::Unavailable(_)
        ));
        assert!(matches!(
            ModelError::from(OpenAIError::RateLimited {
                retry_after: None,
                message: "slow down".into()
            }),
            ModelError::Unavailable(_)
        ));
        assert!(matches!(
            ModelError::from(OpenAIError::EmptyContent {
                finish_reason: "length".into()
            }),
            ModelError::EmptyCompletion
        ));
    }
}
