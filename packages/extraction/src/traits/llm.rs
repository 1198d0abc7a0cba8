//! Language model trait.
//!
//! The extraction requester needs exactly one capability: send a system and
//! user prompt, get text back. Implementations wrap a provider and must honor
//! the temperature and output-length cap in [`CompletionConstraints`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::ModelResult;
use crate::types::record::TokenUsage;

/// A two-part chat prompt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prompt {
    pub system: String,
    pub user: String,
}

impl Prompt {
    pub fn new(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            user: user.into(),
        }
    }
}

/// Sampling and output limits for one call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionConstraints {
    pub model: String,
    pub temperature: f32,
    pub max_output_tokens: u32,
    /// Ask the provider for a JSON object response.
    pub json_output: bool,
}

/// Model output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Completion {
    pub text: String,
    pub usage: Option<TokenUsage>,
    /// Model that actually answered.
    pub model: String,
}

impl Completion {
    pub fn new(text: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            usage: None,
            model: model.into(),
        }
    }

    pub fn with_usage(mut self, usage: TokenUsage) -> Self {
        self.usage = Some(usage);
        self
    }
}

/// Text completion service.
///
/// Implementations:
/// - `OpenAiModel` - OpenAI chat completions (requires `openai` feature)
/// - `MockModel` - canned responses for tests
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// One completion. No retries.
    async fn complete(
        &self,
        prompt: &Prompt,
        constraints: &CompletionConstraints,
    ) -> ModelResult<Completion>;

    /// Provider name for logging.
    fn name(&self) -> &str;
}

#[async_trait]
impl<M: LanguageModel + ?Sized> LanguageModel for Arc<M> {
    async fn complete(
        &self,
        prompt: &Prompt,
        constraints: &CompletionConstraints,
    ) -> ModelResult<Completion> {
        (**self).complete(prompt, constraints).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}
