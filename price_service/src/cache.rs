//! Time-bounded in-memory quote cache.
//!
//! This module provides the process-wide store of the last fetched quote per ticker.
//! It exposes three core operations:
//!
//! - `QuoteCache::get(ticker)`: return the cached quote if it is younger than the
//!   expiry window; a stale entry is evicted and reported as absent.
//! - `QuoteCache::put(ticker, quote)`: store or replace the entry for a ticker.
//! - `QuoteCache::purge_expired()`: drop every stale entry and return the evicted
//!   tickers.
//!
//! Design notes:
//! - Keys are `Ticker` values, which are already case-normalized.
//! - Age is measured from `Quote::fetched_at` against the injected `Clock`.
//! - One mutex guards the whole map. Lookups for different tickers contend on it,
//!   which is fine for watchlist-sized batches and a bottleneck at larger scale.
//! - The map is unbounded: entries are only dropped once stale and touched again
//!   (or purged). Large symbol universes would need a size cap.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use log::debug;
use watchlist_common::{Quote, Ticker};

use crate::clock::Clock;

/// Stored quote. Replaced as a whole on refresh.
#[derive(Debug, Clone)]
struct CacheEntry {
    quote: Quote,
}

/// Concurrency-safe quote cache with a fixed expiry window.
pub struct QuoteCache {
    /// Last successful quote per ticker.
    entries: Mutex<HashMap<Ticker, CacheEntry>>,
    /// Age from which an entry is no longer served.
    expiry: Duration,
    clock: Arc<dyn Clock>,
}

impl QuoteCache {
    /// Create an empty cache.
    pub fn new(expiry: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            expiry,
            clock,
        }
    }

    /// Fresh quote for `ticker`, if any.
    pub fn get(&self, ticker: &Ticker) -> Option<Quote> {
        let now = self.clock.now();
        let mut entries = self.lock();

        let fresh = match entries.get(ticker) {
            Some(entry) => self.is_fresh(&entry.quote, now),
            None => return None,
        };
        if fresh {
            let quote = entries.get(ticker).map(|entry| entry.quote.clone());
            debug!("Cache hit for {}", ticker);
            quote
        } else {
            entries.remove(ticker);
            debug!("Cache entry for {} expired, evicted", ticker);
            None
        }
    }

    /// Store `quote` for `ticker`, replacing any previous entry.
    pub fn put(&self, ticker: &Ticker, quote: Quote) {
        self.lock().insert(ticker.clone(), CacheEntry { quote });
    }

    /// Remove every stale entry and return the evicted tickers.
    pub fn purge_expired(&self) -> Vec<Ticker> {
        let now = self.clock.now();
        let mut evicted = Vec::new();

        self.lock().retain(|ticker, entry| {
            if self.is_fresh(&entry.quote, now) {
                true
            } else {
                evicted.push(ticker.clone());
                false
            }
        });
        evicted
    }

    /// Number of stored entries, stale ones included.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// `true` if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Configured expiry window.
    pub fn expiry(&self) -> Duration {
        self.expiry
    }

    fn is_fresh(&self, quote: &Quote, now: chrono::DateTime<chrono::Utc>) -> bool {
        // A fetch time in the future (clock skew) counts as age zero.
        match quote.age(now).to_std() {
            Ok(age) => age < self.expiry,
            Err(_) => true,
        }
    }

    // Pure in-memory state: a panic mid-insert cannot leave a half-written entry,
    // so a poisoned lock is safe to keep using.
    fn lock(&self) -> MutexGuard<'_, HashMap<Ticker, CacheEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
