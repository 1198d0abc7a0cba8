//! API keys for the fetch and model services.
//!
//! Keys are held in `secrecy` boxes and never reach `Debug`, `Display`
//! or tracing fields. [`SecretString::hint`] gives a log-safe tail so an
//! operator can tell which key is configured.

use secrecy::{ExposeSecret, SecretBox};
use std::fmt;

pub struct SecretString(SecretBox<str>);

impl SecretString {
    pub fn new(value: impl Into<String>) -> Self {
        Self(SecretBox::new(value.into().into_boxed_str()))
    }

    /// Raw value, for building a request header.
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }

    pub fn is_empty(&self) -> bool {
        self.expose().trim().is_empty()
    }

    /// `…abcd` for keys long enough that four characters reveal nothing.
    pub fn hint(&self) -> String {
        let chars: Vec<char> = self.expose().chars().collect();
        if chars.len() < 16 {
            return "…".to_string();
        }
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("…{}", tail)
    }
}

impl Clone for SecretString {
    fn clone(&self) -> Self {
        Self::new(self.expose())
    }
}

impl fmt::Debug for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl fmt::Display for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

impl From<String> for SecretString {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for SecretString {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Key, default model and optional gateway for the extraction model.
#[derive(Clone)]
pub struct ModelCredentials {
    pub api_key: SecretString,
    pub model: String,
    pub base_url: Option<String>,
}

impl ModelCredentials {
    pub fn new(api_key: impl Into<SecretString>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            base_url: None,
        }
    }

    /// `OPENAI_API_KEY`, plus `OPENAI_MODEL` and `OPENAI_BASE_URL` when set.
    /// `None` when no key is configured.
    pub fn from_env(default_model: &str) -> Option<Self> {
        let var = |name: &str| std::env::var(name).ok().filter(|v| !v.trim().is_empty());
        let credentials = Self::new(
            var("OPENAI_API_KEY")?,
            var("OPENAI_MODEL").unwrap_or_else(|| default_model.to_string()),
        );
        Some(match var("OPENAI_BASE_URL") {
            Some(url) => credentials.with_base_url(url),
            None => credentials,
        })
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }
}

impl fmt::Debug for ModelCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelCredentials")
            .field("api_key", &self.api_key.hint())
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .finish()
    }
}
