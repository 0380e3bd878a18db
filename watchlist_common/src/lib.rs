//!
//! Common types and utilities shared by the price service and the watchlist client.
//!
//! This crate aggregates:
//! - `error`: unified error type `WatchlistError` used across the workspace.
//! - `result`: handy `Result<T, WatchlistError>` alias.
//! - `tickers`: normalized ticker symbols and list parsing helpers.
//! - `quote`: the `Quote` value produced by the price service.
//! - `upstream`: quote provider URL constants and helpers.
#![warn(missing_docs)]
pub mod error;
pub mod quote;
pub mod result;
pub mod tickers;
pub mod upstream;

pub use error::WatchlistError;
pub use quote::Quote;
pub use result::Result;
pub use tickers::Ticker;
