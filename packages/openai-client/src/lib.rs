//! Minimal client for OpenAI-compatible chat completions.
//!
//! Only what structured extraction needs: one request, the first choice
//! back, and errors classified so callers can tell transient failures
//! from bad requests.
//!
//! ```rust,ignore
//! use openai_client::{ChatRequest, Message, OpenAIClient};
//!
//! let client = OpenAIClient::new(api_key);
//! let response = client
//!     .chat_completion(
//!         ChatRequest::new("gpt-4o")
//!             .message(Message::system("Reply in JSON."))
//!             .message(Message::user(page_text))
//!             .json_object(),
//!     )
//!     .await?;
//! ```

pub mod error;
pub mod types;

pub use error::{OpenAIError, Result};
pub use types::{
    is_reasoning_model, ChatRequest, ChatResponse, FinishReason, Message, ResponseFormat, Role,
    Usage,
};

use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::{Client, StatusCode};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use types::{ErrorEnvelope, RawResponse};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Clone)]
pub struct OpenAIClient {
    http_client: Client,
    api_key: String,
    base_url: String,
}

impl OpenAIClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            http_client: build_http_client(DEFAULT_TIMEOUT),
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Point at a proxy or another OpenAI-compatible endpoint.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.http_client = build_http_client(timeout);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Send one chat completion and return its first choice.
    pub async fn chat_completion(&self, request: ChatRequest) -> Result<ChatResponse> {
        if self.api_key.trim().is_empty() {
            return Err(OpenAIError::Config("API key is empty".into()));
        }

        let start = Instant::now();
        let response = self
            .http_client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, model = %request.model, "Chat completion request failed");
                OpenAIError::from(e)
            })?;

        let status = response.status();
        if !status.is_success() {
            let headers = response.headers().clone();
            let body = response.text().await.unwrap_or_default();
            let error = api_error(status, &headers, &body);
            warn!(status = %status, error = %error, "Chat completion rejected");
            return Err(error);
        }

        let raw: RawResponse = response.json().await?;
        let chat = first_choice(raw)?;

        debug!(
            model = %request.model,
            duration_ms = start.elapsed().as_millis() as u64,
            finish_reason = ?chat.finish_reason,
            completion_tokens = chat.usage.map(|u| u.completion_tokens),
            "Chat completion"
        );
        if chat.is_cut_off() {
            warn!(
                model = %request.model,
                max_tokens = request.output_tokens(),
                "Completion hit the output token cap"
            );
        }

        Ok(chat)
    }
}

fn first_choice(raw: RawResponse) -> Result<ChatResponse> {
    let choice = raw
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| OpenAIError::Parse("response has no choices".into()))?;

    let finish_reason = choice.finish_reason;
    let content = match (choice.message.content, choice.message.refusal) {
        (Some(content), _) if !content.trim().is_empty() => content,
        (_, Some(refusal)) => {
            return Err(OpenAIError::Api {
                status: StatusCode::OK.as_u16(),
                message: format!("model refused: {}", refusal),
            })
        }
        _ => {
            return Err(OpenAIError::EmptyContent {
                finish_reason: finish_reason
                    .map(|r| r.to_string())
                    .unwrap_or_else(|| "none".into()),
            })
        }
    };

    Ok(ChatResponse {
        content,
        model: raw.model,
        usage: raw.usage,
        finish_reason,
    })
}

fn api_error(status: StatusCode, headers: &HeaderMap, body: &str) -> OpenAIError {
    let message = serde_json::from_str::<ErrorEnvelope>(body)
        .map(|envelope| envelope.error.describe())
        .unwrap_or_else(|_| body.chars().take(500).collect());

    if status == StatusCode::TOO_MANY_REQUESTS {
        let retry_after = headers
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok())
            .map(Duration::from_secs);
        return OpenAIError::RateLimited {
            retry_after,
            message,
        };
    }

    OpenAIError::Api {
        status: status.as_u16(),
        message,
    }
}

fn build_http_client(timeout: Duration) -> Client {
    Client::builder()
        .timeout(timeout)
        .build()
        .unwrap_or_else(|_| Client::new())
}
