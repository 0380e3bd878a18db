//! Error types shared across the watchlist workspace.
//!
//! The `WatchlistError` enum unifies the failure cases of the surrounding layers
//! (I/O, ticker parsing, JSON, configuration), allowing crates to propagate a
//! single error type. Upstream quote failures are not part of it: those are
//! classified by the price service and never escape its batch boundary.
use std::io;

use thiserror::Error;

/// Unified error type shared by the price service and the client.
#[derive(Error, Debug)]
pub enum WatchlistError {
    /// I/O error originating from the standard library or files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A symbol that cannot be used as a ticker (empty, too long, bad characters).
    #[error("Invalid ticker: {0:?}")]
    InvalidTicker(String),

    /// Error while parsing a ticker list into `Ticker` values.
    #[error("Parse tickers file error: {0}")]
    ParseTickersFile(String),

    /// Failure while encoding/decoding JSON via serde_json.
    #[error("JSON serialization/deserialization error: {0}")]
    SerdeJson(#[from] serde_json::Error),

    /// A configuration value outside of its accepted range.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// The outbound HTTP client could not be constructed.
    #[error("HTTP client error: {0}")]
    HttpClient(String),

    /// Generic formatting/validation error with a human-readable message.
    #[error("Format error: {0}")]
    Format(String),
}
