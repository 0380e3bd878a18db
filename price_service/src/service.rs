//! Public quote lookup used by the watchlist and alert layers.
//!
//! `PriceService` wires the cache, the fetcher and the batch coordinator together and
//! collapses every internal outcome to presence or absence: callers see a missing
//! quote, never an error.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use log::{info, warn};
use watchlist_common::{Quote, Result, Ticker};

use crate::cache::QuoteCache;
use crate::clock::{Clock, SystemClock};
use crate::config::ServiceConfig;
use crate::coordinator::{BatchCoordinator, BatchReport};
use crate::fetcher::{HttpTransport, QuoteFetcher, ReqwestTransport};

/// Cached, concurrent quote lookups.
pub struct PriceService {
    cache: Arc<QuoteCache>,
    clock: Arc<dyn Clock>,
    coordinator: BatchCoordinator,
}

impl PriceService {
    /// Build the production service: reqwest transport and system clock.
    pub fn new(config: ServiceConfig) -> Result<Self> {
        config.validate()?;
        let transport = Arc::new(ReqwestTransport::new(&config)?);
        Self::with_parts(config, transport, Arc::new(SystemClock))
    }

    /// Build the service from an explicit transport and clock.
    pub fn with_parts(
        config: ServiceConfig,
        transport: Arc<dyn HttpTransport>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        config.validate()?;
        let cache = Arc::new(QuoteCache::new(config.cache_expiry, clock.clone()));
        let fetcher = Arc::new(QuoteFetcher::new(&config, transport, clock.clone()));
        let coordinator = BatchCoordinator::new(cache.clone(), fetcher, config.max_concurrency);
        info!(
            "Price service ready: upstream={} timeout={:?} expiry={:?} workers={}",
            config.upstream_url, config.request_timeout, config.cache_expiry, config.max_concurrency
        );
        Ok(Self {
            cache,
            clock,
            coordinator,
        })
    }

    /// Current quote for `ticker`, from cache when fresh.
    pub fn get_quote(&self, ticker: &str) -> Option<Quote> {
        let ticker = parse_ticker(ticker)?;
        self.coordinator.resolve_one(&ticker).into_quote()
    }

    /// Quotes for every valid ticker that could be resolved.
    pub fn get_quotes<'a, I>(&self, tickers: I) -> HashMap<Ticker, Quote>
    where
        I: IntoIterator<Item = &'a str>,
    {
        self.coordinator
            .resolve(tickers.into_iter().filter_map(parse_ticker))
    }

    /// Like [`Self::get_quotes`] but never waits much longer than `budget`.
    pub fn get_quotes_within<'a, I>(&self, tickers: I, budget: Duration) -> HashMap<Ticker, Quote>
    where
        I: IntoIterator<Item = &'a str>,
    {
        self.coordinator
            .resolve_within(tickers.into_iter().filter_map(parse_ticker), budget)
    }

    /// Batch lookup keeping the reason behind every missing quote.
    pub fn quote_report<I>(&self, tickers: I) -> BatchReport
    where
        I: IntoIterator<Item = Ticker>,
    {
        self.coordinator.resolve_detailed(tickers)
    }

    /// Current time on the clock shared with the cache and the fetcher.
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// The shared cache, for maintenance such as purging stale entries.
    pub fn cache(&self) -> &Arc<QuoteCache> {
        &self.cache
    }
}

fn parse_ticker(raw: &str) -> Option<Ticker> {
    match Ticker::new(raw) {
        Ok(ticker) => Some(ticker),
        Err(e) => {
            warn!("Skipping quote lookup: {}", e);
            None
        }
    }
}
