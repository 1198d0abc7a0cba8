//! Rate-limited fetcher wrapper.
//!
//! Wraps any Fetcher with a process-wide request quota using the governor
//! crate. The quota is shared by every worker of every batch that uses the
//! same wrapper.

use async_trait::async_trait;
use governor::{Quota, RateLimiter};
use std::num::NonZeroU32;
use std::sync::Arc;

use crate::error::{ConfigError, ConfigResult, FetchResult};
use crate::traits::fetcher::Fetcher;
use crate::types::content::RawContent;

type DefaultRateLimiter = RateLimiter<
    governor::state::NotKeyed,
    governor::state::InMemoryState,
    governor::clock::DefaultClock,
>;

/// A fetcher wrapper that enforces rate limits.
pub struct RateLimitedFetcher<F: Fetcher> {
    inner: F,
    limiter: Arc<DefaultRateLimiter>,
}

impl<F: Fetcher> RateLimitedFetcher<F> {
    /// Allow at most `requests_per_second` fetches per second.
    pub fn new(fetcher: F, requests_per_second: u32) -> ConfigResult<Self> {
        Ok(Self::with_quota(fetcher, Quota::per_second(non_zero(requests_per_second, "requests_per_second")?)))
    }

    /// Sustained rate with a burst allowance.
    pub fn with_burst(fetcher: F, requests_per_second: u32, burst: u32) -> ConfigResult<Self> {
        let quota = Quota::per_second(non_zero(requests_per_second, "requests_per_second")?)
            .allow_burst(non_zero(burst, "burst")?);
        Ok(Self::with_quota(fetcher, quota))
    }

    /// Create with a custom quota.
    pub fn with_quota(fetcher: F, quota: Quota) -> Self {
        Self {
            inner: fetcher,
            limiter: Arc::new(RateLimiter::direct(quota)),
        }
    }

    pub fn inner(&self) -> &F {
        &self.inner
    }
}

fn non_zero(value: u32, name: &str) -> ConfigResult<NonZeroU32> {
    NonZeroU32::new(value).ok_or_else(|| ConfigError::Invalid(format!("{} must be > 0", name)))
}

#[async_trait]
impl<F: Fetcher> Fetcher for RateLimitedFetcher<F> {
    async fn fetch(&self, url: &str) -> FetchResult<RawContent> {
        self.limiter.until_ready().await;
        self.inner.fetch(url).await
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}

/// Extension trait for easy rate limiting.
pub trait FetcherExt: Fetcher + Sized {
    /// Wrap this fetcher with rate limiting.
    fn rate_limited(self, requests_per_second: u32) -> ConfigResult<RateLimitedFetcher<Self>> {
        RateLimitedFetcher::new(self, requests_per_second)
    }
}

impl<F: Fetcher + Sized> FetcherExt for F {}
