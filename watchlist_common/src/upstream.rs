//! Upstream quote provider constants and helpers used by the price service.

use crate::tickers::Ticker;

/// Host of the public chart API queried for quotes.
pub const DEFAULT_BASE_URL: &str = "https://query1.finance.yahoo.com";
/// Path prefix of the chart endpoint; the ticker is appended to it.
pub const CHART_PATH: &str = "/v8/finance/chart";
/// Query selecting a single daily bar, enough to read the market price.
pub const CHART_QUERY: &str = "interval=1d&range=1d";
/// Some upstream hosts reject requests without a browser-like agent.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (compatible; watchlist-price-service/0.1)";

/// Helper to format the chart URL for `ticker` like "{base}/v8/finance/chart/{TICKER}?...".
pub fn chart_url(base_url: &str, ticker: &Ticker) -> String {
    format!(
        "{}{}/{}?{}",
        base_url.trim_end_matches('/'),
        CHART_PATH,
        ticker,
        CHART_QUERY
    )
}
