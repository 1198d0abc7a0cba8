//! Fetcher implementations.
//!
//! # Available Fetchers
//!
//! - `FirecrawlFetcher` - Firecrawl scrape API (requires `firecrawl` feature)
//! - `RateLimitedFetcher` - governor quota around any fetcher
//! - `MockFetcher` - canned pages for tests (in [`crate::testing`])
//!
//! # Example
//!
//! ```rust,ignore
//! use extraction::fetchers::{FirecrawlFetcher, FetcherExt};
//!
//! let fetcher = FirecrawlFetcher::from_env()?.rate_limited(2)?;
//! let page = fetcher.fetch("https://jobs.lever.co/acme/123").await?;
//! ```

mod rate_limited;

#[cfg(feature = "firecrawl")]
mod firecrawl;

pub use rate_limited::{FetcherExt, RateLimitedFetcher};

#[cfg(feature = "firecrawl")]
pub use firecrawl::FirecrawlFetcher;

pub use crate::traits::fetcher::Fetcher;
