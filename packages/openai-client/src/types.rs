//! Wire types for `POST /chat/completions`.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// `response_format` body field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResponseFormat {
    Text,
    JsonObject,
}

/// Chat completion request.
///
/// The output cap is serialized as `max_tokens` or `max_completion_tokens`
/// depending on the model family, see [`ChatRequest::output_limit`].
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<Message>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    max_completion_tokens: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_format: Option<ResponseFormat>,
}

impl ChatRequest {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            messages: Vec::new(),
            temperature: None,
            max_tokens: None,
            max_completion_tokens: None,
            response_format: None,
        }
    }

    pub fn message(mut self, message: Message) -> Self {
        self.messages.push(message);
        self
    }

    /// Reasoning models reject any temperature but the default.
    pub fn temperature(mut self, temperature: f32) -> Self {
        if !is_reasoning_model(&self.model) {
            self.temperature = Some(temperature);
        }
        self
    }

    pub fn output_limit(mut self, tokens: u32) -> Self {
        if is_reasoning_model(&self.model) {
            self.max_completion_tokens = Some(tokens);
            self.max_tokens = None;
        } else {
            self.max_tokens = Some(tokens);
            self.max_completion_tokens = None;
        }
        self
    }

    pub fn json_object(mut self) -> Self {
        self.response_format = Some(ResponseFormat::JsonObject);
        self
    }

    /// The output cap regardless of which field carries it.
    pub fn output_tokens(&self) -> Option<u32> {
        self.max_tokens.or(self.max_completion_tokens)
    }
}

/// o-series and gpt-5 models take `max_completion_tokens` and a fixed temperature.
pub fn is_reasoning_model(model: &str) -> bool {
    let model = model.rsplit('/').next().unwrap_or(model);
    model.starts_with("o1")
        || model.starts_with("o3")
        || model.starts_with("o4")
        || model.starts_with("gpt-5")
}

/// Why the model stopped generating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    Stop,
    /// Hit the output cap; JSON output is probably cut off.
    Length,
    ContentFilter,
    ToolCalls,
    #[serde(other)]
    Other,
}

impl fmt::Display for FinishReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FinishReason::Stop => "stop",
            FinishReason::Length => "length",
            FinishReason::ContentFilter => "content_filter",
            FinishReason::ToolCalls => "tool_calls",
            FinishReason::Other => "other",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// First choice of a completion, flattened.
#[derive(Debug, Clone)]
pub struct ChatResponse {
    pub content: String,
    pub model: Option<String>,
    pub usage: Option<Usage>,
    pub finish_reason: Option<FinishReason>,
}

impl ChatResponse {
    pub fn is_cut_off(&self) -> bool {
        self.finish_reason == Some(FinishReason::Length)
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawResponse {
    pub model: Option<String>,
    #[serde(default)]
    pub choices: Vec<RawChoice>,
    pub usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawChoice {
    pub message: RawMessage,
    pub finish_reason: Option<FinishReason>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawMessage {
    pub content: Option<String>,
    pub refusal: Option<String>,
}

/// `{"error": {"message": ..., "type": ..., "code": ...}}`
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorEnvelope {
    pub error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorDetail {
    pub message: String,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub code: Option<String>,
}

impl ErrorDetail {
    pub(crate) fn describe(&self) -> String {
        match (&self.kind, &self.code) {
            (_, Some(code)) => format!("{} [{}]", self.message, code),
            (Some(kind), None) => format!("{} [{}]", self.message, kind),
            (None, None) => self.message.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_serializes_for_classic_models() {
        let req = ChatRequest::new("gpt-4o")
            .message(Message::system("Reply in JSON."))
            .message(Message::user("Hello"))
            .temperature(0.1)
            .output_limit(2000)
            .json_object();

        let body = serde_json::to_value(&req).unwrap();
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["max_tokens"], 2000);
        assert!(body.get("max_completion_tokens").is_none());
        assert_eq!(body["response_format"]["type"], "json_object");
        assert!((body["temperature"].as_f64().unwrap() - 0.1).abs() < 1e-6);
    }

    #[test]
    fn reasoning_models_use_completion_tokens_and_no_temperature() {
        let req = ChatRequest::new("o3-mini").temperature(0.1).output_limit(4000);

        assert_eq!(req.temperature, None);
        assert_eq!(req.output_tokens(), Some(4000));
        let body = serde_json::to_value(&req).unwrap();
        assert_eq!(body["max_completion_tokens"], 4000);
        assert!(body.get("max_tokens").is_none());
    }

    #[test]
    fn reasoning_model_detection_ignores_provider_prefix() {
        assert!(is_reasoning_model("openai/gpt-5-mini"));
        assert!(is_reasoning_model("o1-preview"));
        assert!(!is_reasoning_model("gpt-4o-mini"));
    }

    #[test]
    fn unknown_finish_reasons_deserialize() {
        let raw: RawResponse = serde_json::from_str(
            r#"{"model": "gpt-4o", "choices": [{"message": {"content": null}, "finish_reason": "something_new"}]}"#,
        )
        .unwrap();
        assert_eq!(raw.choices[0].finish_reason, Some(FinishReason::Other));
        assert!(raw.choices[0].message.content.is_none());
    }

    #[test]
    fn error_envelope_prefers_code() {
        let envelope: ErrorEnvelope = serde_json::from_str(
            r#"{"error": {"message": "Bad key", "type": "invalid_request_error", "code": "invalid_api_key"}}"#,
        )
        .unwrap();
        assert_eq!(envelope.error.describe(), "Bad key [invalid_api_key]");
    }
}
