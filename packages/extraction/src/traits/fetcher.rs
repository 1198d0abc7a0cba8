//! Fetcher trait for pluggable content retrieval.
//!
//! A fetcher turns one URL into [`RawContent`]. Crawling, link discovery,
//! and JavaScript rendering are the fetch service's business; this crate
//! only asks for one page at a time.
//!
//! # Not-found signalling
//!
//! Implementations must keep an explicit not-found answer from the target
//! distinguishable from a generic failure: either return
//! [`FetchError::NotFound`] or return content with
//! [`RawContent::status_code`] set. The classifier treats both the same way.
//!
//! [`FetchError::NotFound`]: crate::error::FetchError::NotFound

use async_trait::async_trait;
use std::sync::Arc;

use crate::error::FetchResult;
use crate::types::content::RawContent;

/// Fetch one URL.
///
/// Implementations:
/// - `FirecrawlFetcher` - Firecrawl scrape API (requires `firecrawl` feature)
/// - `RateLimitedFetcher` - wraps any fetcher with a governor quota
/// - `MockFetcher` - canned responses for tests
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetch the page at `url`.
    ///
    /// Timeouts are the implementation's responsibility.
    async fn fetch(&self, url: &str) -> FetchResult<RawContent>;

    /// Fetcher name for logging.
    fn name(&self) -> &str;
}

#[async_trait]
impl<F: Fetcher + ?Sized> Fetcher for Arc<F> {
    async fn fetch(&self, url: &str) -> FetchResult<RawContent> {
        (**self).fetch(url).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}
