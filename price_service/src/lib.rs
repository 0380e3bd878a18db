//! Watchlist price service.
//!
//! Fetches stock quotes from an upstream chart API, keeps them in a short-lived
//! in-memory cache and resolves whole watchlists concurrently. The building blocks:
//!
//! - `QuoteCache`: ticker → last quote, served only while younger than the expiry
//!   window (5 minutes by default).
//! - `QuoteFetcher`: one GET per ticker through an `HttpTransport`, with every
//!   failure classified as a `FetchError`.
//! - `BatchCoordinator`: deduplicates tickers and runs cache-or-fetch on a pool of
//!   scoped worker threads, joining all of them before it returns.
//! - `PriceService`: `get_quote` / `get_quotes`, where failures turn into missing
//!   entries instead of errors.
//!
//! Alert checks and watchlist assembly live under `model`.
#![warn(missing_docs)]
pub mod cache;
pub mod clock;
pub mod config;
pub mod coordinator;
pub mod fetcher;
pub mod model;
pub mod service;

pub use cache::QuoteCache;
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::ServiceConfig;
pub use coordinator::{BatchCoordinator, BatchReport, Resolution};
pub use fetcher::{FetchError, HttpResponse, HttpTransport, QuoteFetcher, ReqwestTransport};
pub use service::PriceService;
