//! Extraction requester: one model call per qualifying page.
//!
//! Builds the prompt from the schema, calls the language model once, and
//! parses the response into an [`ExtractedRecord`]. Missing or malformed
//! fields are an expected outcome and become nulls; only a failed call or a
//! response that is not a JSON object fails the extraction.

use chrono::Utc;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::{ExtractionError, Result};
use crate::pipeline::prompts::{format_system_prompt, format_user_prompt, truncate_content};
use crate::traits::llm::{CompletionConstraints, LanguageModel, Prompt};
use crate::types::config::ExtractionConfig;
use crate::types::content::RawContent;
use crate::types::quality::QualityVerdict;
use crate::types::record::{ExtractedRecord, ExtractionResult, ExtractionSchema, FieldValue};

/// Turns good content into a candidate record.
pub struct ExtractionRequester {
    model: Arc<dyn LanguageModel>,
    schema: ExtractionSchema,
    config: ExtractionConfig,
    system_prompt: String,
}

impl ExtractionRequester {
    pub fn new(model: Arc<dyn LanguageModel>, schema: ExtractionSchema, config: ExtractionConfig) -> Self {
        let system_prompt = format_system_prompt(&schema);
        Self {
            model,
            schema,
            config,
            system_prompt,
        }
    }

    pub fn schema(&self) -> &ExtractionSchema {
        &self.schema
    }

    pub fn config(&self) -> &ExtractionConfig {
        &self.config
    }

    /// Effective content budget in characters.
    pub fn max_content_chars(&self) -> usize {
        self.config
            .max_content_chars
            .unwrap_or(self.schema.max_content_chars)
    }

    /// Build the prompt for `content`. Returns the prompt and whether the
    /// content was truncated.
    pub fn build_prompt(&self, content: &RawContent) -> (Prompt, bool) {
        let (text, truncated) = truncate_content(&content.content, self.max_content_chars());
        if truncated {
            debug!(
                url = %content.url,
                original_chars = content.content.chars().count(),
                kept_chars = self.max_content_chars(),
                "Truncated content for extraction"
            );
        }
        let user = format_user_prompt(self.schema.kind, &content.url, text, truncated);
        (Prompt::new(self.system_prompt.clone(), user), truncated)
    }

    fn constraints(&self) -> CompletionConstraints {
        CompletionConstraints {
            model: self.config.model.clone(),
            temperature: self.config.temperature,
            max_output_tokens: self
                .config
                .max_output_tokens
                .unwrap_or(self.schema.max_output_tokens),
            json_output: true,
        }
    }

    /// Extract a record from content that passed the quality gate.
    ///
    /// Returns [`ExtractionError::NotExtractable`] without calling the model
    /// when the verdict does not permit extraction.
    pub async fn extract(&self, content: &RawContent, verdict: &QualityVerdict) -> Result<ExtractionResult> {
        if !verdict.is_extractable(self.config.allow_poor) {
            return Err(ExtractionError::NotExtractable {
                verdict: verdict.kind,
            });
        }

        let (prompt, truncated) = self.build_prompt(content);
        let completion = self.model.complete(&prompt, &self.constraints()).await?;

        let parsed = parse_json_object(&completion.text)?;
        let record = ExtractedRecord::from_response(&self.schema, &parsed);
        let ai_confidence = read_confidence(&parsed, &self.schema.confidence_pointer);

        if ai_confidence.is_none() {
            warn!(url = %content.url, "Model response carried no usable confidence; using 0.0");
        }

        let title = record
            .get(&self.schema.title_field)
            .and_then(FieldValue::as_text)
            .map(str::to_string);

        Ok(ExtractionResult {
            url: content.url.clone(),
            kind: self.schema.kind,
            title,
            record,
            raw_response: completion.text,
            usage: completion.usage,
            ai_confidence: ai_confidence.unwrap_or(0.0),
            model: completion.model,
            truncated,
            extracted_at: Utc::now(),
        })
    }
}

/// Parse model text into a JSON object, tolerating a Markdown code fence.
pub fn parse_json_object(text: &str) -> Result<Value> {
    let body = strip_code_fence(text);
    if body.is_empty() {
        return Err(ExtractionError::unparsable("empty response"));
    }

    let value: Value = serde_json::from_str(body)
        .map_err(|e| ExtractionError::unparsable(format!("invalid JSON: {}", e)))?;

    if !value.is_object() {
        return Err(ExtractionError::unparsable("response is not a JSON object"));
    }
    Ok(value)
}

fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop an optional language tag on the opening fence line.
    let rest = match rest.find('\n') {
        Some(idx) => &rest[idx + 1..],
        None => rest,
    };
    rest.trim_end().strip_suffix("```").unwrap_or(rest).trim()
}

/// Self-reported confidence at `pointer`, clamped to [0, 1].
fn read_confidence(parsed: &Value, pointer: &str) -> Option<f64> {
    let raw = parsed.pointer(pointer)?;
    let value = match raw {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => match s.trim().strip_suffix('%') {
            Some(percent) => percent.trim().parse::<f64>().ok()? / 100.0,
            None => s.trim().parse::<f64>().ok()?,
        },
        _ => return None,
    };
    value.is_finite().then(|| value.clamp(0.0, 1.0))
}
