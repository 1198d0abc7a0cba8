//! Testing utilities including mock implementations.
//!
//! These are useful for testing applications that use the extraction library
//! without making real model or network calls.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use crate::error::{FetchError, FetchResult, ModelError, ModelResult};
use crate::traits::{
    fetcher::Fetcher,
    llm::{Completion, CompletionConstraints, LanguageModel, Prompt},
};
use crate::types::content::RawContent;
use crate::types::record::TokenUsage;

/// A mock language model for testing.
///
/// Responses are chosen by URL: the first configured URL that appears in
/// the user prompt wins, otherwise the default applies. With nothing
/// configured the model answers `{}`.
#[derive(Default)]
pub struct MockModel {
    /// Canned responses keyed by page URL
    responses: Arc<RwLock<HashMap<String, ModelResult<String>>>>,

    /// Fallback response
    default: Arc<RwLock<Option<ModelResult<String>>>>,

    /// Call tracking for assertions
    calls: Arc<RwLock<Vec<MockModelCall>>>,
}

/// Record of a call made to the mock model.
#[derive(Debug, Clone)]
pub struct MockModelCall {
    pub prompt: Prompt,
    pub constraints: CompletionConstraints,
}

impl MockModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `text` for any prompt without a URL-specific response.
    pub fn with_default_response(self, text: impl Into<String>) -> Self {
        *self.default.write().unwrap() = Some(Ok(text.into()));
        self
    }

    /// Fail every call without a URL-specific response.
    pub fn with_default_error(self, error: ModelError) -> Self {
        *self.default.write().unwrap() = Some(Err(error));
        self
    }

    /// Answer `text` when the prompt is about `url`.
    pub fn with_response(self, url: impl Into<String>, text: impl Into<String>) -> Self {
        self.responses
            .write()
            .unwrap()
            .insert(url.into(), Ok(text.into()));
        self
    }

    /// Fail when the prompt is about `url`.
    pub fn with_error(self, url: impl Into<String>, error: ModelError) -> Self {
        self.responses.write().unwrap().insert(url.into(), Err(error));
        self
    }

    /// Get all calls made to this mock.
    pub fn calls(&self) -> Vec<MockModelCall> {
        self.calls.read().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.read().unwrap().len()
    }

    /// Clear call history.
    pub fn clear_calls(&self) {
        self.calls.write().unwrap().clear();
    }

    fn response_for(&self, prompt: &Prompt) -> ModelResult<String> {
        let responses = self.responses.read().unwrap();
        let specific = responses
            .iter()
            .filter(|(url, _)| prompt.user.contains(&format!("URL: {}\n", url)))
            .max_by_key(|(url, _)| url.len())
            .map(|(_, response)| response.clone());

        specific
            .or_else(|| self.default.read().unwrap().clone())
            .unwrap_or_else(|| Ok("{}".to_string()))
    }
}

#[async_trait]
impl LanguageModel for MockModel {
    async fn complete(
        &self,
        prompt: &Prompt,
        constraints: &CompletionConstraints,
    ) -> ModelResult<Completion> {
        self.calls.write().unwrap().push(MockModelCall {
            prompt: prompt.clone(),
            constraints: constraints.clone(),
        });

        let text = self.response_for(prompt)?;
        let prompt_tokens = (prompt.system.len() + prompt.user.len()) as u32 / 4;
        let completion_tokens = text.len() as u32 / 4;

        Ok(Completion::new(text, constraints.model.clone()).with_usage(TokenUsage {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens + completion_tokens,
        }))
    }

    fn name(&self) -> &str {
        "mock"
    }
}

/// Failure a [`MockFetcher`] should produce for a URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockFetchFailure {
    /// Target reported the page missing.
    NotFound(u16),
    /// Fetch service answered with an error status.
    Status(u16),
    /// Connection refused.
    Unreachable,
    Timeout,
}

impl MockFetchFailure {
    fn into_error(self, url: &str) -> FetchError {
        let url = url.to_string();
        match self {
            MockFetchFailure::NotFound(status) => FetchError::NotFound { url, status },
            MockFetchFailure::Status(status) => FetchError::Status {
                url,
                status,
                message: "mock status".into(),
            },
            MockFetchFailure::Unreachable => FetchError::Unreachable {
                url,
                reason: "mock connection refused".into(),
            },
            MockFetchFailure::Timeout => FetchError::Timeout { url },
        }
    }
}

/// A mock fetcher for testing.
///
/// Unknown URLs are reported unreachable. An optional delay makes
/// in-flight concurrency observable through [`MockFetcher::max_in_flight`].
#[derive(Default, Clone)]
pub struct MockFetcher {
    pages: Arc<RwLock<HashMap<String, RawContent>>>,
    failures: Arc<RwLock<HashMap<String, MockFetchFailure>>>,
    calls: Arc<RwLock<Vec<String>>>,
    delay: Option<Duration>,
    in_flight: Arc<AtomicUsize>,
    max_in_flight: Arc<AtomicUsize>,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `content` for its URL.
    pub fn with_page(self, content: RawContent) -> Self {
        self.pages
            .write()
            .unwrap()
            .insert(content.url.clone(), content);
        self
    }

    /// Serve `text` at `url` with status 200.
    pub fn with_text(self, url: impl Into<String>, text: impl Into<String>) -> Self {
        self.with_page(RawContent::new(url, text).with_status_code(200))
    }

    /// Fail fetches of `url`.
    pub fn with_failure(self, url: impl Into<String>, failure: MockFetchFailure) -> Self {
        self.failures.write().unwrap().insert(url.into(), failure);
        self
    }

    /// Sleep this long inside every fetch.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.read().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.read().unwrap().len()
    }

    /// Highest number of fetches observed running at the same time.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Fetcher for MockFetcher {
    async fn fetch(&self, url: &str) -> FetchResult<RawContent> {
        self.calls.write().unwrap().push(url.to_string());

        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let failure = self.failures.read().unwrap().get(url).copied();
        let page = self.pages.read().unwrap().get(url).cloned();
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if let Some(failure) = failure {
            return Err(failure.into_error(url));
        }
        page.ok_or_else(|| FetchError::Unreachable {
            url: url.to_string(),
            reason: "no mock page configured".into(),
        })
    }

    fn name(&self) -> &str {
        "mock"
    }
}

/// Sample pages that pass the default classifier profiles.
pub mod fixtures {
    /// A job posting long enough and rich enough to classify as good.
    pub fn job_posting_page(title: &str, company: &str) -> String {
        let mut text = format!(
            "# {title}\n\n{company} is hiring.\n\n\
             ## Responsibilities\n- Build and operate services\n- Review code\n\n\
             ## Requirements\n- 5+ years of experience\n- Rust or Go\n\n\
             ## Benefits\nHealth, dental, and a learning budget.\n\n\
             Salary: $150,000 - $180,000. Apply now.\n\n"
        );
        while text.chars().count() < 900 {
            text.push_str("We ship reliable software for community organizations. ");
        }
        text
    }

    /// A public form page long enough to classify as good.
    pub fn form_page(title: &str) -> String {
        let mut text = format!(
            "{title}\n\nPlease fill out this form. * Required\n\n\
             1. Your name (short answer) *\n\
             2. Email address *\n\
             3. Which shifts can you volunteer for? (checkboxes)\n\
             4. Anything else? (paragraph)\n\nSubmit\n\n"
        );
        while text.chars().count() < 600 {
            text.push_str("Responses are reviewed weekly by the organizing team. ");
        }
        text
    }

    /// Model response naming only a job title and company.
    pub fn partial_job_response(title: &str, company: &str, confidence: f64) -> String {
        serde_json::json!({
            "job_title": title,
            "company_name": company,
            "location": null,
            "job_description": null,
            "responsibilities": [],
            "requirements": [],
            "required_skills": [],
            "confidence_score": confidence,
        })
        .to_string()
    }

    /// Model response filling every job scoring field.
    pub fn complete_job_response(title: &str, company: &str, confidence: f64) -> String {
        serde_json::json!({
            "job_title": title,
            "company_name": company,
            "location": "Minneapolis, MN",
            "remote_policy": "hybrid",
            "employment_type": "full-time",
            "salary_min": 150000,
            "salary_max": 180000,
            "job_description": "Build and operate services.",
            "responsibilities": ["Build and operate services", "Review code"],
            "requirements": ["5+ years of experience"],
            "required_skills": ["Rust", "Go"],
            "confidence_score": confidence,
        })
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn constraints() -> CompletionConstraints {
        CompletionConstraints {
            model: "mock-model".into(),
            temperature: 0.0,
            max_output_tokens: 100,
            json_output: true,
        }
    }

    #[tokio::test]
    async fn mock_model_prefers_url_specific_response() {
        let model = MockModel::new()
            .with_default_response("{}")
            .with_response("https://a.example/job", r#"{"job_title": "A"}"#);

        let prompt = Prompt::new("sys", "URL: https://a.example/job\nContent:");
        let completion = model.complete(&prompt, &constraints()).await.unwrap();
        assert_eq!(completion.text, r#"{"job_title": "A"}"#);
        assert_eq!(completion.model, "mock-model");

        let other = Prompt::new("sys", "URL: https://b.example\nContent:");
        assert_eq!(model.complete(&other, &constraints()).await.unwrap().text, "{}");
        assert_eq!(model.call_count(), 2);
    }

    #[tokio::test]
    async fn mock_model_errors_are_returned() {
        let model = MockModel::new().with_error("https://a.example", ModelError::Timeout);
        let prompt = Prompt::new("sys", "URL: https://a.example\n");
        assert!(matches!(
            model.complete(&prompt, &constraints()).await,
            Err(ModelError::Timeout)
        ));
    }

    #[tokio::test]
    async fn mock_fetcher_serves_pages_and_failures() {
        let fetcher = MockFetcher::new()
            .with_text("https://a.example", "hello")
            .with_failure("https://gone.example", MockFetchFailure::NotFound(404));

        assert_eq!(fetcher.fetch("https://a.example").await.unwrap().content, "hello");
        assert!(fetcher.fetch("https://gone.example").await.unwrap_err().is_not_found());
        assert!(fetcher.fetch("https://unknown.example").await.unwrap_err().is_unreachable());
        assert_eq!(fetcher.call_count(), 3);
    }

    #[test]
    fn fixtures_are_long_enough() {
        assert!(fixtures::job_posting_page("Engineer", "Acme").chars().count() >= 500);
        assert!(fixtures::form_page("Volunteer Signup").chars().count() >= 300);
    }
}
