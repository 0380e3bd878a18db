//! Watchlist Client: looks up current prices for a list of tickers, checks price
//! targets and prints the watchlist. Tickers come from the command line and/or a
//! text file; quotes are fetched concurrently and cached, so `--watch` refreshes
//! inside the cache window are served without hitting the upstream again.
//!
//! Usage example (CLI):
//! ```bash
//! watchlist_client aapl msft --path ./tickers.txt --alert AAPL=230 --watch 30
//! ```
//!
//! The ticker file should contain symbols separated by commas, spaces, or new lines.
//! See `watchlist_common::tickers` for details.
#![warn(missing_docs)]
mod args;
mod report;

use crate::args::Args;
use chrono::Utc;
use clap::Parser;
use log::{debug, info, warn};
use price_service::PriceService;
use price_service::model::alert::{AlertMonitor, PriceAlert};
use price_service::model::watchlist::{WatchlistEntry, WatchlistRow, assemble, assemble_within};
use rust_decimal::Decimal;
use std::collections::BTreeSet;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use std::thread;
use std::time::{Duration, Instant};
use watchlist_common::Result;
use watchlist_common::WatchlistError;
use watchlist_common::tickers::{Ticker, TickerParser};

/// Granularity of the Ctrl+C check while waiting between refreshes.
const SHUTDOWN_POLL: Duration = Duration::from_millis(200);

fn main() -> Result<(), WatchlistError> {
    init_logger();
    let args = Args::parse();
    let shutdown = Arc::new(AtomicBool::new(false));
    {
        let shutdown = shutdown.clone();
        ctrlc::set_handler(move || {
            info!("Ctrl+C received. Shutting down client...");
            shutdown.store(true, Ordering::SeqCst);
        })
        .map_err(|e| WatchlistError::Format(format!("Error setting Ctrl+C handler: {e}")))?;
    }

    let tickers = collect_tickers(&args)?;
    if tickers.is_empty() {
        warn!("No tickers given; pass symbols as arguments or with --path");
        return Ok(());
    }
    info!("Tickers: {:?}", tickers);

    let mut alerts = build_alerts(&args.alerts);
    let mut entries = build_entries(&tickers);
    let service = PriceService::new(args.service_config())?;
    let monitor = AlertMonitor::new(&service);

    loop {
        let evicted = service.cache().purge_expired();
        if !evicted.is_empty() {
            debug!("Purged {} stale quotes", evicted.len());
        }

        let fired = monitor.check_and_trigger(&mut alerts);
        for id in fired {
            if let Some(alert) = alerts.iter().find(|a| a.id == id) {
                info!("ALERT: {} reached target {}", alert.ticker, alert.target_price);
            }
        }
        attach_alerts(&mut entries, &alerts);

        let rows = match args.budget() {
            Some(budget) => assemble_within(&entries, &service, budget),
            None => assemble(&entries, &service),
        };
        print_rows(&rows, args.json)?;

        let Some(interval) = args.watch else {
            break;
        };
        if !wait_or_shutdown(Duration::from_secs(interval), &shutdown) {
            break;
        }
    }
    info!("Client stopped");
    Ok(())
}

/// Info by default; `RUST_LOG` overrides, e.g. `RUST_LOG=price_service=debug`.
fn init_logger() {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .format_timestamp_millis()
        .parse_default_env()
        .init();
}

/// Positional tickers followed by the ones from `--path`, deduplicated in order.
fn collect_tickers(args: &Args) -> Result<Vec<Ticker>> {
    let mut tickers = args
        .tickers
        .iter()
        .map(|raw| raw.parse::<Ticker>())
        .collect::<Result<Vec<_>>>()?;

    if let Some(raw_path) = &args.path {
        let file_path = normalize_path(raw_path);
        if !is_file_exist(&file_path) {
            return Err(WatchlistError::Format(format!(
                "ticker file not found: {}",
                file_path.display()
            )));
        }
        let file = File::open(&file_path)?;
        tickers.extend(Ticker::parse_from_file(BufReader::new(file))?);
    }

    let mut seen = BTreeSet::new();
    tickers.retain(|ticker| seen.insert(ticker.clone()));
    Ok(tickers)
}

fn build_alerts(targets: &[(Ticker, Decimal)]) -> Vec<PriceAlert> {
    let now = Utc::now();
    targets
        .iter()
        .enumerate()
        .map(|(i, (ticker, price))| PriceAlert::new(i as u64 + 1, ticker.clone(), *price, now))
        .collect()
}

fn build_entries(tickers: &[Ticker]) -> Vec<WatchlistEntry> {
    let now = Utc::now();
    tickers
        .iter()
        .enumerate()
        .map(|(i, ticker)| WatchlistEntry {
            id: i as u64 + 1,
            ticker: ticker.clone(),
            added_at: now,
            source: Some("cli".to_string()),
            notes: None,
            alerts: Vec::new(),
        })
        .collect()
}

fn attach_alerts(entries: &mut [WatchlistEntry], alerts: &[PriceAlert]) {
    for entry in entries.iter_mut() {
        entry.alerts = alerts
            .iter()
            .filter(|alert| alert.ticker == entry.ticker)
            .cloned()
            .collect();
    }
}

fn print_rows(rows: &[WatchlistRow], json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(rows)?);
    } else {
        print!("{}", report::render_table(rows));
    }
    Ok(())
}

/// Sleep for `interval` unless Ctrl+C arrives first. Returns `false` on shutdown.
fn wait_or_shutdown(interval: Duration, shutdown: &AtomicBool) -> bool {
    let deadline = Instant::now() + interval;
    while Instant::now() < deadline {
        if shutdown.load(Ordering::Relaxed) {
            return false;
        }
        thread::sleep(SHUTDOWN_POLL.min(deadline.saturating_duration_since(Instant::now())));
    }
    !shutdown.load(Ordering::Relaxed)
}

/// `--path` value without surrounding whitespace or a pair of double or single quotes.
fn normalize_path(raw: &str) -> PathBuf {
    let trimmed = raw.trim();
    let unquoted = ['"', '\'']
        .into_iter()
        .find_map(|q| trimmed.strip_prefix(q)?.strip_suffix(q))
        .unwrap_or(trimmed);
    PathBuf::from(unquoted)
}

/// `true` if `path` names a regular file.
fn is_file_exist(path: &Path) -> bool {
    path.is_file()
}
