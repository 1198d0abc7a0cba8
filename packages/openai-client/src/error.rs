//! Error types for the chat completions client.

use std::time::Duration;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, OpenAIError>;

#[derive(Debug, Error)]
pub enum OpenAIError {
    #[error("Configuration error: {0}")]
    Config(String),

    /// Connection refused, DNS, TLS and similar.
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out")]
    Timeout,

    /// HTTP 429. `retry_after` comes from the response header when present.
    #[error("Rate limited: {message}")]
    RateLimited {
        retry_after: Option<Duration>,
        message: String,
    },

    /// Any other non-2xx answer, with the message from the error envelope.
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// The response body was not a chat completion.
    #[error("Parse error: {0}")]
    Parse(String),

    /// A well-formed completion with no text in it.
    #[error("No content in completion (finish reason: {finish_reason})")]
    EmptyContent { finish_reason: String },
}

impl OpenAIError {
    /// Worth trying again later.
    pub fn is_transient(&self) -> bool {
        match self {
            OpenAIError::Network(_) | OpenAIError::Timeout | OpenAIError::RateLimited { .. } => {
                true
            }
            OpenAIError::Api { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

impl From<reqwest::Error> for OpenAIError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            OpenAIError::Timeout
        } else if e.is_decode() {
            OpenAIError::Parse(e.to_string())
        } else {
            OpenAIError::Network(e.to_string())
        }
    }
}
