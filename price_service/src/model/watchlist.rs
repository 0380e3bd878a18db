//! Watchlist rows enriched with current prices.

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use watchlist_common::{Quote, Ticker};

use crate::model::alert::PriceAlert;
use crate::service::PriceService;

/// Stored watchlist record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchlistEntry {
    /// Record id assigned by the store.
    pub id: u64,
    /// Watched symbol.
    pub ticker: Ticker,
    /// When the ticker was added.
    pub added_at: DateTime<Utc>,
    /// Where the idea came from.
    pub source: Option<String>,
    /// Free-form user notes.
    pub notes: Option<String>,
    /// Price targets on this ticker.
    pub alerts: Vec<PriceAlert>,
}

/// Alert as shown next to a watchlist row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AlertView {
    /// Alert id.
    pub id: u64,
    /// Target price.
    pub target_price: Decimal,
    /// Whether it already fired.
    pub triggered: bool,
    /// Distance from the current price, absent without a price.
    pub distance_percent: Option<Decimal>,
}

/// Watchlist record joined with its current quote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WatchlistRow {
    /// Record id.
    pub id: u64,
    /// Watched symbol.
    pub ticker: Ticker,
    /// When the ticker was added.
    pub added_at: DateTime<Utc>,
    /// Where the idea came from.
    pub source: Option<String>,
    /// Free-form user notes.
    pub notes: Option<String>,
    /// `None` means no current price, which is not the same as zero.
    pub current_price: Option<Decimal>,
    /// Fetch time of `current_price`.
    pub price_updated_at: Option<DateTime<Utc>>,
    /// Alerts with their distance to the current price.
    pub alerts: Vec<AlertView>,
}

impl WatchlistRow {
    /// Join `entry` with its quote, if any.
    pub fn build(entry: &WatchlistEntry, quote: Option<&Quote>) -> Self {
        let current_price = quote.map(|q| q.price);
        Self {
            id: entry.id,
            ticker: entry.ticker.clone(),
            added_at: entry.added_at,
            source: entry.source.clone(),
            notes: entry.notes.clone(),
            current_price,
            price_updated_at: quote.map(|q| q.fetched_at),
            alerts: entry
                .alerts
                .iter()
                .map(|alert| AlertView {
                    id: alert.id,
                    target_price: alert.target_price,
                    triggered: alert.triggered,
                    distance_percent: alert.distance_percent(current_price),
                })
                .collect(),
        }
    }
}

/// Build every row, resolving all tickers with a single batch lookup.
pub fn assemble(entries: &[WatchlistEntry], service: &PriceService) -> Vec<WatchlistRow> {
    let quotes = service.get_quotes(entries.iter().map(|entry| entry.ticker.as_str()));
    join_quotes(entries, &quotes)
}

/// Like [`assemble`], giving the batch lookup at most `budget`.
pub fn assemble_within(
    entries: &[WatchlistEntry],
    service: &PriceService,
    budget: Duration,
) -> Vec<WatchlistRow> {
    let quotes = service.get_quotes_within(
        entries.iter().map(|entry| entry.ticker.as_str()),
        budget,
    );
    join_quotes(entries, &quotes)
}

fn join_quotes(entries: &[WatchlistEntry], quotes: &HashMap<Ticker, Quote>) -> Vec<WatchlistRow> {
    entries
        .iter()
        .map(|entry| WatchlistRow::build(entry, quotes.get(&entry.ticker)))
        .collect()
}
