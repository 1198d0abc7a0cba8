//! Raw fetched content.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;

/// Page text as returned by a fetcher, before classification.
///
/// Ephemeral: produced by the fetch step, consumed by the classifier and
/// the extraction requester, then discarded. Only its hash is persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawContent {
    /// URL the content was fetched from
    pub url: String,

    /// Page text (markdown or plain text)
    pub content: String,

    /// Page title if the fetch service reported one
    pub title: Option<String>,

    /// HTTP status of the target page, when known
    pub status_code: Option<u16>,

    /// MIME type or content type (e.g., "text/markdown")
    pub content_type: Option<String>,

    /// When the content was fetched
    pub fetched_at: DateTime<Utc>,

    /// Source-specific metadata
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl RawContent {
    /// Create raw content with minimal fields.
    pub fn new(url: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            content: content.into(),
            title: None,
            status_code: None,
            content_type: None,
            fetched_at: Utc::now(),
            metadata: HashMap::new(),
        }
    }

    /// Set the page title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Set the target page's status code.
    pub fn with_status_code(mut self, status: u16) -> Self {
        self.status_code = Some(status);
        self
    }

    /// Set the content type.
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Set the fetched timestamp.
    pub fn with_fetched_at(mut self, fetched_at: DateTime<Utc>) -> Self {
        self.fetched_at = fetched_at;
        self
    }

    /// Add a metadata key-value pair.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Content length in bytes.
    pub fn byte_len(&self) -> usize {
        self.content.len()
    }

    /// Content length in characters, ignoring surrounding whitespace.
    pub fn char_len(&self) -> usize {
        self.content.trim().chars().count()
    }

    /// Check if there is any non-whitespace content.
    pub fn has_content(&self) -> bool {
        !self.content.trim().is_empty()
    }

    /// SHA-256 of the content, hex encoded.
    pub fn content_hash(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.content.as_bytes());
        format!("{:x}", hasher.finalize())
    }
}
