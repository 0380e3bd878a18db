//! Command-line arguments for the watchlist client.
//!
//! This module defines the CLI interface using `clap`. See `main` for end-to-end usage.
use std::time::Duration;

use clap::Parser;
use price_service::ServiceConfig;
use rust_decimal::Decimal;
use watchlist_common::Ticker;
use watchlist_common::upstream::{DEFAULT_BASE_URL, DEFAULT_USER_AGENT};

/// Parsed command-line arguments.
#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Tickers to look up, e.g. `AAPL msft BRK-B`.
    pub tickers: Vec<String>,

    /// Path to a text file with more tickers.
    /// Tickers may be separated by commas, spaces, or new lines; `#` starts a comment.
    #[clap(long)]
    pub path: Option<String>,

    /// Price target as `TICKER=PRICE`. May be repeated.
    #[clap(long = "alert", value_parser = parse_alert)]
    pub alerts: Vec<(Ticker, Decimal)>,

    /// Base URL of the quote provider.
    #[clap(long, env = "WATCHLIST_UPSTREAM_URL", default_value = DEFAULT_BASE_URL)]
    pub upstream_url: String,

    /// Per-request timeout in seconds (at most 10).
    #[clap(long, env = "WATCHLIST_TIMEOUT_SECS", default_value_t = 10)]
    pub timeout_secs: u64,

    /// How long a fetched quote is served from the cache, in seconds.
    #[clap(long, env = "WATCHLIST_EXPIRY_SECS", default_value_t = 300)]
    pub expiry_secs: u64,

    /// Maximum number of quotes fetched at the same time.
    #[clap(long, env = "WATCHLIST_MAX_CONCURRENCY", default_value_t = 8)]
    pub max_concurrency: usize,

    /// Overall time budget of one refresh in milliseconds.
    #[clap(long, env = "WATCHLIST_BUDGET_MS")]
    pub budget_ms: Option<u64>,

    /// Refresh every N seconds until Ctrl+C.
    #[clap(long)]
    pub watch: Option<u64>,

    /// Print rows as JSON instead of a table.
    #[clap(long)]
    pub json: bool,
}

impl Args {
    /// Price service settings selected on the command line.
    pub fn service_config(&self) -> ServiceConfig {
        ServiceConfig {
            upstream_url: self.upstream_url.trim().to_string(),
            request_timeout: Duration::from_secs(self.timeout_secs),
            cache_expiry: Duration::from_secs(self.expiry_secs),
            max_concurrency: self.max_concurrency,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }

    /// Budget for one refresh, if any.
    pub fn budget(&self) -> Option<Duration> {
        self.budget_ms.map(Duration::from_millis)
    }
}

/// Parse `TICKER=PRICE`. The last `=` separates the price so `EURUSD=X=1.08` works.
fn parse_alert(raw: &str) -> Result<(Ticker, Decimal), String> {
    let (ticker, price) = raw
        .rsplit_once('=')
        .ok_or_else(|| format!("expected TICKER=PRICE, got {raw:?}"))?;
    let ticker = Ticker::new(ticker).map_err(|e| e.to_string())?;
    let price: Decimal = price
        .trim()
        .parse()
        .map_err(|e| format!("invalid target price {price:?}: {e}"))?;
    if price <= Decimal::ZERO {
        return Err(format!("target price must be positive, got {price}"));
    }
    Ok((ticker, price))
}
