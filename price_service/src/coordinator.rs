//! Concurrent cache-or-fetch over a batch of tickers.
//!
//! `BatchCoordinator` deduplicates the requested tickers and resolves each one on a
//! bounded pool of scoped worker threads:
//!
//! - Jobs are queued on a `crossbeam_channel` that every worker drains, so a slow
//!   upstream call only occupies its own worker.
//! - Each worker checks the cache first and only fetches on a miss; a successful
//!   fetch is stored before the result is sent back.
//! - Results are fanned in through a second channel once every worker has been
//!   joined. A failed or panicking lookup only removes its own ticker from the
//!   result; the worker moves on to the next queued ticker.

use std::collections::{BTreeSet, HashMap};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::unbounded;
use log::{debug, error, warn};
use watchlist_common::{Quote, Ticker};

use crate::cache::QuoteCache;
use crate::fetcher::{FetchError, QuoteFetcher};

/// Terminal state of one ticker within a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Served from the cache without a network call.
    CacheHit(Quote),
    /// Fetched upstream and stored in the cache.
    Fetched(Quote),
    /// No quote could be obtained.
    Failed(FetchError),
}

impl Resolution {
    /// The quote, if one was obtained.
    pub fn quote(&self) -> Option<&Quote> {
        match self {
            Resolution::CacheHit(quote) | Resolution::Fetched(quote) => Some(quote),
            Resolution::Failed(_) => None,
        }
    }

    /// Collapse into presence/absence.
    pub fn into_quote(self) -> Option<Quote> {
        match self {
            Resolution::CacheHit(quote) | Resolution::Fetched(quote) => Some(quote),
            Resolution::Failed(_) => None,
        }
    }
}

/// Per-ticker outcomes of one batch, failures included.
#[derive(Debug, Default)]
pub struct BatchReport {
    /// Outcome for every ticker whose worker completed.
    pub outcomes: HashMap<Ticker, Resolution>,
}

impl BatchReport {
    /// Number of tickers served from the cache.
    pub fn cache_hits(&self) -> usize {
        self.outcomes
            .values()
            .filter(|r| matches!(r, Resolution::CacheHit(_)))
            .count()
    }

    /// Number of tickers fetched upstream.
    pub fn fetched(&self) -> usize {
        self.outcomes
            .values()
            .filter(|r| matches!(r, Resolution::Fetched(_)))
            .count()
    }

    /// Tickers without a quote and the reason.
    pub fn failures(&self) -> impl Iterator<Item = (&Ticker, &FetchError)> {
        self.outcomes.iter().filter_map(|(ticker, r)| match r {
            Resolution::Failed(err) => Some((ticker, err)),
            _ => None,
        })
    }

    /// Keep only the obtained quotes.
    pub fn into_quotes(self) -> HashMap<Ticker, Quote> {
        self.outcomes
            .into_iter()
            .filter_map(|(ticker, r)| r.into_quote().map(|quote| (ticker, quote)))
            .collect()
    }
}

/// Fans a set of tickers out to cache lookups and fetches and joins the results.
pub struct BatchCoordinator {
    cache: Arc<QuoteCache>,
    fetcher: Arc<QuoteFetcher>,
    max_concurrency: usize,
}

impl BatchCoordinator {
    /// Create a coordinator running at most `max_concurrency` lookups at once.
    pub fn new(
        cache: Arc<QuoteCache>,
        fetcher: Arc<QuoteFetcher>,
        max_concurrency: usize,
    ) -> Self {
        Self {
            cache,
            fetcher,
            max_concurrency: max_concurrency.max(1),
        }
    }

    /// Resolve every distinct ticker; failed ones are absent from the map.
    pub fn resolve<I>(&self, tickers: I) -> HashMap<Ticker, Quote>
    where
        I: IntoIterator<Item = Ticker>,
    {
        self.run(tickers, None).into_quotes()
    }

    /// Like [`Self::resolve`] but keeps the outcome of every ticker.
    pub fn resolve_detailed<I>(&self, tickers: I) -> BatchReport
    where
        I: IntoIterator<Item = Ticker>,
    {
        self.run(tickers, None)
    }

    /// Resolve under an overall `budget`.
    ///
    /// Each fetch gets `min(request timeout, remaining budget)`. Tickers picked up
    /// after the budget is spent fail with `Timeout` without a network call; fetches
    /// already in flight keep their own timeout.
    pub fn resolve_within<I>(&self, tickers: I, budget: Duration) -> HashMap<Ticker, Quote>
    where
        I: IntoIterator<Item = Ticker>,
    {
        let deadline = Instant::now() + budget;
        self.run(tickers, Some(deadline)).into_quotes()
    }

    /// Resolve a single ticker on the calling thread.
    pub fn resolve_one(&self, ticker: &Ticker) -> Resolution {
        self.resolve_ticker(ticker, None)
    }

    fn run<I>(&self, tickers: I, deadline: Option<Instant>) -> BatchReport
    where
        I: IntoIterator<Item = Ticker>,
    {
        let unique: BTreeSet<Ticker> = tickers.into_iter().collect();
        let mut report = BatchReport::default();
        if unique.is_empty() {
            return report;
        }

        let (job_tx, job_rx) = unbounded::<Ticker>();
        let (result_tx, result_rx) = unbounded::<(Ticker, Resolution)>();
        for ticker in &unique {
            // The receiver is still held here, so queuing cannot fail.
            let _ = job_tx.send(ticker.clone());
        }
        drop(job_tx);

        let workers = self.max_concurrency.min(unique.len());
        debug!("Resolving {} tickers on {} workers", unique.len(), workers);

        thread::scope(|scope| {
            let handles: Vec<_> = (0..workers)
                .map(|_| {
                    let job_rx = job_rx.clone();
                    let result_tx = result_tx.clone();
                    scope.spawn(move || {
                        for ticker in job_rx.iter() {
                            let resolution = panic::catch_unwind(AssertUnwindSafe(|| {
                                self.resolve_ticker(&ticker, deadline)
                            }));
                            let Ok(resolution) = resolution else {
                                error!("Lookup of {} panicked", ticker);
                                continue;
                            };
                            if result_tx.send((ticker, resolution)).is_err() {
                                break;
                            }
                        }
                    })
                })
                .collect();

            for handle in handles {
                if handle.join().is_err() {
                    error!("Quote worker panicked");
                }
            }
        });
        drop(result_tx);

        for (ticker, resolution) in result_rx.iter() {
            report.outcomes.insert(ticker, resolution);
        }
        for ticker in unique.iter().filter(|t| !report.outcomes.contains_key(*t)) {
            warn!("No outcome recorded for {}", ticker);
        }
        report
    }

    fn resolve_ticker(&self, ticker: &Ticker, deadline: Option<Instant>) -> Resolution {
        if let Some(quote) = self.cache.get(ticker) {
            return Resolution::CacheHit(quote);
        }

        let timeout = match deadline {
            Some(deadline) => deadline.saturating_duration_since(Instant::now()),
            None => self.fetcher.timeout(),
        };
        match self.fetcher.fetch_with_timeout(ticker, timeout) {
            Ok(quote) => {
                self.cache.put(ticker, quote.clone());
                Resolution::Fetched(quote)
            }
            Err(err) => {
                warn!("No quote for {}: {}", ticker, err);
                Resolution::Failed(err)
            }
        }
    }
}
