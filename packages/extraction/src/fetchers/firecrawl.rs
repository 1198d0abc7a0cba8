//! Firecrawl-based fetcher implementation.
//!
//! Uses the Firecrawl scrape API, which renders JavaScript and returns the
//! page as Markdown. The target's own status code travels back in the
//! response metadata, so a removed posting is reported as not found even
//! though the API call itself succeeded.
//!
//! Requires the `firecrawl` feature to be enabled.

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{FetchError, FetchResult};
use crate::security::SecretString;
use crate::traits::fetcher::Fetcher;
use crate::types::content::RawContent;

const FIRECRAWL_API_URL: &str = "https://api.firecrawl.dev/v1";

/// Statuses the target uses to say a page is gone.
const NOT_FOUND_STATUSES: [u16; 2] = [404, 410];

/// Firecrawl-based fetcher for JavaScript-heavy sites.
///
/// # Example
///
/// ```rust,ignore
/// use extraction::fetchers::FirecrawlFetcher;
///
/// let fetcher = FirecrawlFetcher::new(std::env::var("FIRECRAWL_API_KEY")?)?;
/// let page = fetcher.fetch("https://boards.greenhouse.io/acme/jobs/1").await?;
/// ```
pub struct FirecrawlFetcher {
    client: Client,
    api_key: SecretString,
    base_url: String,
    only_main_content: bool,
}

// Request/Response types for Firecrawl API

#[derive(Serialize)]
struct ScrapeRequest {
    url: String,
    formats: Vec<String>,
    #[serde(rename = "onlyMainContent")]
    only_main_content: bool,
}

#[derive(Deserialize)]
struct ScrapeResponse {
    success: bool,
    data: Option<ScrapeData>,
    error: Option<String>,
}

#[derive(Deserialize)]
struct ScrapeData {
    markdown: Option<String>,
    metadata: Option<PageMetadata>,
}

#[derive(Deserialize)]
struct PageMetadata {
    title: Option<String>,
    #[serde(rename = "sourceURL")]
    source_url: Option<String>,
    #[serde(rename = "statusCode")]
    status_code: Option<u16>,
}

impl FirecrawlFetcher {
    /// Create a new Firecrawl fetcher with the given API key.
    pub fn new(api_key: impl Into<SecretString>) -> FetchResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .map_err(|e| FetchError::Http(Box::new(e)))?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            base_url: FIRECRAWL_API_URL.to_string(),
            only_main_content: true,
        })
    }

    /// Create from environment variable `FIRECRAWL_API_KEY`.
    pub fn from_env() -> FetchResult<Self> {
        let api_key = std::env::var("FIRECRAWL_API_KEY").map_err(|_| {
            FetchError::Http(Box::new(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "FIRECRAWL_API_KEY environment variable not set",
            )))
        })?;
        Self::new(api_key)
    }

    /// Point at a self-hosted Firecrawl deployment.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Keep navigation and footers in the returned Markdown.
    pub fn with_full_page(mut self) -> Self {
        self.only_main_content = false;
        self
    }

    fn transport_error(url: &str, e: reqwest::Error) -> FetchError {
        if e.is_timeout() {
            FetchError::Timeout { url: url.to_string() }
        } else if e.is_connect() {
            FetchError::Unreachable {
                url: url.to_string(),
                reason: e.to_string(),
            }
        } else {
            FetchError::Http(Box::new(e))
        }
    }

    /// Turn a decoded scrape response into content or a typed failure.
    fn into_content(url: &str, response: ScrapeResponse) -> FetchResult<RawContent> {
        if !response.success {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: 502,
                message: response
                    .error
                    .unwrap_or_else(|| "Firecrawl scrape failed".to_string()),
            });
        }

        let data = response.data.ok_or_else(|| FetchError::EmptyResponse {
            url: url.to_string(),
        })?;
        let (title, source_url, status) = match data.metadata {
            Some(m) => (m.title, m.source_url, m.status_code),
            None => (None, None, None),
        };

        let markdown = match (data.markdown, status) {
            (Some(markdown), _) => markdown,
            (None, Some(status)) if NOT_FOUND_STATUSES.contains(&status) => {
                return Err(FetchError::NotFound {
                    url: url.to_string(),
                    status,
                });
            }
            (None, _) => {
                return Err(FetchError::EmptyResponse {
                    url: url.to_string(),
                })
            }
        };

        let mut content = RawContent::new(url, markdown)
            .with_fetched_at(Utc::now())
            .with_content_type("text/markdown")
            .with_metadata("source", "firecrawl");

        if let Some(status) = status {
            content = content.with_status_code(status);
        }
        if let Some(title) = title {
            content = content.with_title(title);
        }
        if let Some(source_url) = source_url {
            content = content.with_metadata("source_url", source_url);
        }

        Ok(content)
    }
}

#[async_trait]
impl Fetcher for FirecrawlFetcher {
    async fn fetch(&self, url: &str) -> FetchResult<RawContent> {
        let request = ScrapeRequest {
            url: url.to_string(),
            formats: vec!["markdown".to_string()],
            only_main_content: self.only_main_content,
        };

        let response = self
            .client
            .post(format!("{}/scrape", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key.expose()))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| Self::transport_error(url, e))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let text = response.text().await.unwrap_or_default();
            tracing::warn!(url = %url, status = status, "Firecrawl API error");
            return Err(FetchError::Status {
                url: url.to_string(),
                status,
                message: format!("Firecrawl API error: {}", text),
            });
        }

        let body: ScrapeResponse = response
            .json()
            .await
            .map_err(|e| FetchError::Http(Box::new(e)))?;

        Self::into_content(url, body)
    }

    fn name(&self) -> &str {
        "firecrawl"
    }
}
