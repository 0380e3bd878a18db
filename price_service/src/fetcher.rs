//! Single-ticker quote fetching from the upstream chart API.
//!
//! `QuoteFetcher` issues one GET per ticker through an `HttpTransport`, parses the
//! chart payload and classifies every failure into a `FetchError`. Nothing here
//! touches the cache; storing results is the coordinator's job.

use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use log::{debug, info};
use reqwest::blocking::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;
use watchlist_common::upstream::chart_url;
use watchlist_common::{Quote, Ticker, WatchlistError};

use crate::clock::Clock;
use crate::config::ServiceConfig;

/// Why no quote was obtained for a ticker.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// The provider answered with a non-2xx status.
    #[error("upstream unavailable: HTTP {status}")]
    UpstreamUnavailable {
        /// HTTP status code returned upstream.
        status: u16,
    },

    /// The body is not the expected chart JSON or carries no market price.
    #[error("malformed upstream response: {0}")]
    MalformedResponse(String),

    /// Transport-level failure: DNS, refused connection, reset, broken body.
    #[error("network error: {0}")]
    Network(String),

    /// The request did not complete within its deadline.
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
}

/// Status and body of an upstream response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response body; left empty for non-success statuses.
    pub body: String,
}

impl HttpResponse {
    /// `true` for 2xx statuses.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Outbound HTTP GET used by the fetcher.
///
/// Implementations must honour `timeout` and report transport problems as
/// `FetchError::Network` or `FetchError::Timeout`; statuses are returned as-is.
pub trait HttpTransport: Send + Sync {
    /// Perform a GET on `url`.
    fn get(&self, url: &str, timeout: Duration) -> Result<HttpResponse, FetchError>;
}

/// `HttpTransport` over a pooled blocking `reqwest` client.
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Build the shared client with the configured user agent and default timeout.
    pub fn new(config: &ServiceConfig) -> Result<Self, WatchlistError> {
        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(config.request_timeout)
            .connect_timeout(config.request_timeout)
            .build()
            .map_err(|e| WatchlistError::HttpClient(e.to_string()))?;
        Ok(Self::from_client(client))
    }

    /// Wrap an already configured client.
    pub fn from_client(client: Client) -> Self {
        Self { client }
    }
}

impl HttpTransport for ReqwestTransport {
    fn get(&self, url: &str, timeout: Duration) -> Result<HttpResponse, FetchError> {
        let response = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .map_err(|e| classify_transport_error(e, timeout))?;

        let status = response.status();
        if !status.is_success() {
            return Ok(HttpResponse {
                status: status.as_u16(),
                body: String::new(),
            });
        }

        let body = response
            .text()
            .map_err(|e| classify_transport_error(e, timeout))?;
        Ok(HttpResponse {
            status: status.as_u16(),
            body,
        })
    }
}

fn classify_transport_error(err: reqwest::Error, timeout: Duration) -> FetchError {
    if err.is_timeout() {
        FetchError::Timeout(timeout)
    } else {
        FetchError::Network(err.to_string())
    }
}

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    result: Option<Vec<ChartResult>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    meta: ChartMeta,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChartMeta {
    // Kept as a JSON number so its text goes straight into a Decimal.
    regular_market_price: Option<serde_json::Number>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: Option<String>,
    description: Option<String>,
}

/// Extract `chart.result[0].meta.regularMarketPrice` from a chart payload.
pub fn parse_chart_price(body: &str) -> Result<Decimal, FetchError> {
    let envelope: ChartEnvelope = serde_json::from_str(body)
        .map_err(|e| FetchError::MalformedResponse(e.to_string()))?;

    if let Some(error) = envelope.chart.error {
        return Err(FetchError::MalformedResponse(format!(
            "upstream error {}: {}",
            error.code.unwrap_or_default(),
            error.description.unwrap_or_default()
        )));
    }

    let number = envelope
        .chart
        .result
        .unwrap_or_default()
        .into_iter()
        .next()
        .ok_or_else(|| FetchError::MalformedResponse("empty chart result".into()))?
        .meta
        .regular_market_price
        .ok_or_else(|| FetchError::MalformedResponse("missing regularMarketPrice".into()))?;

    let text = number.to_string();
    let price = Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .map_err(|e| {
            FetchError::MalformedResponse(format!("price {text:?} is not a decimal: {e}"))
        })?;

    if price < Decimal::ZERO {
        return Err(FetchError::MalformedResponse(format!("negative price {text}")));
    }
    // Digits below the 28th decimal place are dropped on conversion.
    if price.is_zero() && has_nonzero_mantissa(&text) {
        return Err(FetchError::MalformedResponse(format!(
            "price {text} is below decimal precision"
        )));
    }
    Ok(price)
}

fn has_nonzero_mantissa(text: &str) -> bool {
    text.split(['e', 'E'])
        .next()
        .unwrap_or_default()
        .chars()
        .any(|c| matches!(c, '1'..='9'))
}

/// Fetches one quote at a time from the upstream provider.
pub struct QuoteFetcher {
    transport: Arc<dyn HttpTransport>,
    clock: Arc<dyn Clock>,
    base_url: String,
    timeout: Duration,
}

impl QuoteFetcher {
    /// Create a fetcher using `transport` for I/O and `clock` for quote timestamps.
    pub fn new(
        config: &ServiceConfig,
        transport: Arc<dyn HttpTransport>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            transport,
            clock,
            base_url: config.upstream_url.clone(),
            timeout: config.request_timeout,
        }
    }

    /// Configured per-request timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Fetch `ticker` with the configured timeout.
    pub fn fetch(&self, ticker: &Ticker) -> Result<Quote, FetchError> {
        self.fetch_with_timeout(ticker, self.timeout)
    }

    /// Fetch `ticker`, giving up after `timeout` (capped at the configured one).
    pub fn fetch_with_timeout(
        &self,
        ticker: &Ticker,
        timeout: Duration,
    ) -> Result<Quote, FetchError> {
        let timeout = timeout.min(self.timeout);
        if timeout.is_zero() {
            return Err(FetchError::Timeout(timeout));
        }

        let url = chart_url(&self.base_url, ticker);
        let started = Instant::now();
        let response = self.transport.get(&url, timeout)?;
        debug!(
            "GET {} -> {} in {:?}",
            url,
            response.status,
            started.elapsed()
        );

        if !response.is_success() {
            return Err(FetchError::UpstreamUnavailable {
                status: response.status,
            });
        }

        let price = parse_chart_price(&response.body)?;
        let quote = Quote::new(ticker.clone(), price, self.clock.now());
        info!("Fetched {}: {} at {}", ticker, price, quote.fetched_at.format("%H:%M:%S"));
        Ok(quote)
    }
}
