//! Domain models built on top of quote lookups.
//!
//! This module groups the consumers of the price service:
//! - `alert`: price-target alerts, the 1% proximity check and `AlertMonitor`.
//! - `watchlist`: watchlist records joined with their current quotes.

pub mod alert;
pub mod watchlist;
