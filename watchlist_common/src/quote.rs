//! Quote data model.
//!
//! A `Quote` is a single priced observation of a ticker. Prices are kept as
//! `rust_decimal::Decimal` so currency values never pass through floating point,
//! and serialize as strings (`"226.50"`) to keep that precision on the wire.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::tickers::Ticker;

/// Market quote for a single ticker symbol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    /// Normalized symbol.
    pub ticker: Ticker,
    /// Last market price as reported upstream.
    pub price: Decimal,
    /// When the quote was obtained from the upstream provider.
    pub fetched_at: DateTime<Utc>,
}

impl Quote {
    /// Create a quote observed at `fetched_at`.
    pub fn new(ticker: Ticker, price: Decimal, fetched_at: DateTime<Utc>) -> Self {
        Self {
            ticker,
            price,
            fetched_at,
        }
    }

    /// Time elapsed between the fetch and `now`. Negative if `now` is earlier.
    pub fn age(&self, now: DateTime<Utc>) -> chrono::Duration {
        now - self.fetched_at
    }
}
