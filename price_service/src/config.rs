//! Runtime configuration of the price service.

use std::time::Duration;

use watchlist_common::upstream::{DEFAULT_BASE_URL, DEFAULT_USER_AGENT};
use watchlist_common::{Result, WatchlistError};

/// Upper bound for a single upstream request.
pub const MAX_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
/// Age after which a cached quote is refreshed instead of served.
pub const DEFAULT_CACHE_EXPIRY: Duration = Duration::from_secs(5 * 60);
/// Worker threads used by one batch resolution.
pub const DEFAULT_MAX_CONCURRENCY: usize = 8;

/// Settings shared by the fetcher, the cache and the batch coordinator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    /// Base URL of the quote provider, without the chart path.
    pub upstream_url: String,
    /// Per-request timeout; must be in `(0, MAX_REQUEST_TIMEOUT]`.
    pub request_timeout: Duration,
    /// Expiry window of the quote cache.
    pub cache_expiry: Duration,
    /// Maximum number of tickers fetched at the same time by one batch.
    pub max_concurrency: usize,
    /// `User-Agent` header sent upstream.
    pub user_agent: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            upstream_url: DEFAULT_BASE_URL.to_string(),
            request_timeout: MAX_REQUEST_TIMEOUT,
            cache_expiry: DEFAULT_CACHE_EXPIRY,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl ServiceConfig {
    /// Check every value is within its accepted range.
    pub fn validate(&self) -> Result<()> {
        if self.upstream_url.trim().is_empty() {
            return Err(WatchlistError::Config("upstream url is empty".into()));
        }
        if self.request_timeout.is_zero() || self.request_timeout > MAX_REQUEST_TIMEOUT {
            return Err(WatchlistError::Config(format!(
                "request timeout must be within (0, {}s], got {:?}",
                MAX_REQUEST_TIMEOUT.as_secs(),
                self.request_timeout
            )));
        }
        if self.cache_expiry.is_zero() {
            return Err(WatchlistError::Config("cache expiry must be positive".into()));
        }
        if self.max_concurrency == 0 {
            return Err(WatchlistError::Config(
                "max concurrency must be at least 1".into(),
            ));
        }
        Ok(())
    }
}
