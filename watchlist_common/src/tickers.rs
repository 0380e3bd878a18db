//! Ticker symbols and helpers shared between the price service and the client.

use std::fmt;
use std::io::BufRead;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::WatchlistError;

/// Longest symbol accepted by [`Ticker::new`].
pub const MAX_TICKER_LEN: usize = 16;

/// Trait providing list parsing for tickers.
pub trait TickerParser {
    /// Parses tickers from a buffered reader.
    ///
    /// Symbols may be separated by commas, spaces, or new lines. Everything after
    /// a `#` on a line is ignored. Returns an error if any symbol is invalid.
    fn parse_from_file<R: BufRead>(reader: R) -> Result<Vec<Ticker>, WatchlistError>;
}

impl TickerParser for Ticker {
    fn parse_from_file<R: BufRead>(reader: R) -> Result<Vec<Self>, WatchlistError> {
        let mut tickers = Vec::new();

        for (line_no, line_result) in reader.lines().enumerate() {
            let line = line_result.map_err(WatchlistError::Io)?;
            let content = line.split('#').next().unwrap_or_default();

            for raw in content.split(|c: char| c == ',' || c.is_whitespace()) {
                if raw.is_empty() {
                    continue;
                }
                match raw.parse::<Self>() {
                    Ok(ticker) => tickers.push(ticker),
                    Err(e) => {
                        return Err(WatchlistError::ParseTickersFile(format!(
                            "line {}: {}",
                            line_no + 1,
                            e
                        )));
                    }
                }
            }
        }
        Ok(tickers)
    }
}

/// Normalized stock symbol.
///
/// Construction trims surrounding whitespace and uppercases the symbol, so `aapl`
/// and `AAPL` are the same key everywhere a `Ticker` is used. Letters, digits and
/// `.`, `-`, `^`, `=` are accepted, which covers share classes (`BRK-B`), indices
/// (`^GSPC`), currency pairs (`EURUSD=X`) and exchange suffixes (`7203.T`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Ticker(String);

impl Ticker {
    /// Validates and normalizes `raw` into a ticker.
    pub fn new(raw: &str) -> Result<Self, WatchlistError> {
        let symbol = raw.trim().to_ascii_uppercase();
        if symbol.is_empty() || symbol.len() > MAX_TICKER_LEN {
            return Err(WatchlistError::InvalidTicker(raw.to_string()));
        }
        let valid = symbol
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '^' | '='));
        if !valid {
            return Err(WatchlistError::InvalidTicker(raw.to_string()));
        }
        Ok(Self(symbol))
    }

    /// The normalized symbol.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for Ticker {
    type Err = WatchlistError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for Ticker {
    type Error = WatchlistError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value)
    }
}

impl From<Ticker> for String {
    fn from(ticker: Ticker) -> Self {
        ticker.0
    }
}

impl AsRef<str> for Ticker {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Ticker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}
