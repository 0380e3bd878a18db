mod common;

use std::str::FromStr;
use std::time::{Duration, Instant};

use common::{MockTransport, Reply, harness, harness_with, start_time};
use price_service::model::alert::{AlertMonitor, PriceAlert};
use price_service::model::watchlist::{WatchlistEntry, assemble};
use price_service::{FetchError, Resolution, ServiceConfig};
use rust_decimal::Decimal;
use watchlist_common::Ticker;

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn ticker(s: &str) -> Ticker {
    Ticker::new(s).unwrap()
}

#[test]
fn msft_quote_is_served_from_cache_on_second_call() {
    let transport = MockTransport::new();
    transport.reply("MSFT", Reply::Price("100.25"));
    let h = harness(transport);

    let first = h.service.get_quote("MSFT").expect("quote");
    assert_eq!(first.ticker.as_str(), "MSFT");
    assert_eq!(first.price, dec("100.25"));
    assert_eq!(first.fetched_at, start_time());

    h.clock.advance(chrono::Duration::minutes(4));
    let second = h.service.get_quote("MSFT").expect("cached quote");
    assert_eq!(second, first);
    assert_eq!(h.transport.calls("MSFT"), 1);
}

#[test]
fn not_found_ticker_is_absent_and_not_cached() {
    let transport = MockTransport::new();
    transport.reply("ZZZZ", Reply::Status(404));
    let h = harness(transport);

    assert_eq!(h.service.get_quote("ZZZZ"), None);
    assert!(h.service.cache().is_empty());

    assert_eq!(h.service.get_quote("ZZZZ"), None);
    assert_eq!(h.transport.calls("ZZZZ"), 2);
}

#[test]
fn expired_quote_is_fetched_again() {
    let transport = MockTransport::new();
    transport.reply("AAPL", Reply::Price("226.50"));
    let h = harness(transport);

    assert!(h.service.get_quote("AAPL").is_some());
    h.clock.advance(chrono::Duration::minutes(5));

    let refreshed = h.service.get_quote("AAPL").expect("refetched quote");
    assert_eq!(refreshed.fetched_at, start_time() + chrono::Duration::minutes(5));
    assert_eq!(h.transport.calls("AAPL"), 2);
}

#[test]
fn lookups_ignore_case() {
    let transport = MockTransport::new();
    transport.reply("AAPL", Reply::Price("226.50"));
    let h = harness(transport);

    let lower = h.service.get_quote("aapl").expect("quote");
    let upper = h.service.get_quote("AAPL").expect("quote");
    assert_eq!(lower, upper);
    assert_eq!(h.transport.calls("AAPL"), 1);
}

#[test]
fn price_keeps_its_decimal_places_through_the_cache() {
    let transport = MockTransport::new();
    transport.reply("AAPL", Reply::Price("226.50"));
    let h = harness(transport);

    let fetched = h.service.get_quote("AAPL").unwrap();
    let cached = h.service.get_quote("AAPL").unwrap();
    assert_eq!(fetched.price.to_string(), "226.50");
    assert_eq!(cached.price.to_string(), "226.50");
}

#[test]
fn one_failing_ticker_does_not_affect_the_others() {
    let transport = MockTransport::new();
    transport.reply("A", Reply::Price("10.00"));
    transport.reply("B", Reply::NetworkError);
    transport.reply("C", Reply::Price("30.00"));
    let h = harness(transport);

    let quotes = h.service.get_quotes(["A", "B", "C"]);
    let mut keys: Vec<&str> = quotes.keys().map(Ticker::as_str).collect();
    keys.sort_unstable();
    assert_eq!(keys, vec!["A", "C"]);
    assert_eq!(quotes[&ticker("C")].price, dec("30.00"));
}

#[test]
fn every_failure_kind_degrades_to_absence() {
    let transport = MockTransport::new();
    transport.reply("OK", Reply::Price("1.5"));
    transport.reply("DOWN", Reply::Status(503));
    transport.reply("JUNK", Reply::Body("{ invalid json"));
    transport.reply("NOPRICE", Reply::Body(r#"{"chart":{"result":[{"meta":{}}]}}"#));
    transport.reply("NET", Reply::NetworkError);
    transport.reply("SLOW", Reply::Timeout);
    let h = harness(transport);

    let quotes = h
        .service
        .get_quotes(["OK", "DOWN", "JUNK", "NOPRICE", "NET", "SLOW"]);
    assert_eq!(quotes.len(), 1);
    assert!(quotes.contains_key(&ticker("OK")));
    assert_eq!(h.service.cache().len(), 1);
}

#[test]
fn duplicate_tickers_are_fetched_once() {
    let transport = MockTransport::new();
    transport.reply("A", Reply::Price("42"));
    let h = harness(transport);

    let quotes = h.service.get_quotes(["A", "a", " A "]);
    assert_eq!(quotes.len(), 1);
    assert_eq!(h.transport.calls("A"), 1);
}

#[test]
fn empty_and_invalid_input_makes_no_calls() {
    let h = harness(MockTransport::new());

    assert!(h.service.get_quotes(Vec::<&str>::new()).is_empty());
    assert!(h.service.get_quotes(["", "BAD/SYMBOL"]).is_empty());
    assert_eq!(h.service.get_quote("   "), None);
    assert_eq!(h.transport.total_calls(), 0);
}

#[test]
fn report_keeps_the_reason_for_each_ticker() {
    let transport = MockTransport::new();
    transport.reply("A", Reply::Price("10"));
    transport.reply("B", Reply::Status(500));
    let h = harness(transport);

    let first = h.service.quote_report([ticker("A"), ticker("B")]);
    assert!(matches!(first.outcomes[&ticker("A")], Resolution::Fetched(_)));
    assert_eq!(
        first.outcomes[&ticker("B")],
        Resolution::Failed(FetchError::UpstreamUnavailable { status: 500 })
    );

    let second = h.service.quote_report([ticker("A"), ticker("B")]);
    assert!(matches!(second.outcomes[&ticker("A")], Resolution::CacheHit(_)));
    assert_eq!(second.cache_hits(), 1);
    assert_eq!(second.failures().count(), 1);
}

#[test]
fn slow_fetches_run_concurrently() {
    let delay = Duration::from_millis(300);
    let transport = MockTransport::with_delay(delay);
    for symbol in ["A", "B", "C", "D"] {
        transport.reply(symbol, Reply::Price("1"));
    }
    let h = harness(transport);

    let started = Instant::now();
    let quotes = h.service.get_quotes(["A", "B", "C", "D"]);
    let elapsed = started.elapsed();

    assert_eq!(quotes.len(), 4);
    assert!(h.transport.max_in_flight() > 1);
    assert!(elapsed < delay * 4, "took {elapsed:?}");
}

#[test]
fn single_worker_still_resolves_everything() {
    let transport = MockTransport::new();
    for symbol in ["A", "B", "C"] {
        transport.reply(symbol, Reply::Price("2"));
    }
    let config = ServiceConfig {
        max_concurrency: 1,
        ..ServiceConfig::default()
    };
    let h = harness_with(transport, config);

    assert_eq!(h.service.get_quotes(["A", "B", "C"]).len(), 3);
    assert_eq!(h.transport.max_in_flight(), 1);
}

#[test]
fn spent_budget_serves_cache_only() {
    let transport = MockTransport::new();
    transport.reply("A", Reply::Price("5"));
    transport.reply("B", Reply::Price("6"));
    let h = harness(transport);

    assert!(h.service.get_quote("A").is_some());
    let quotes = h.service.get_quotes_within(["A", "B"], Duration::ZERO);

    assert_eq!(quotes.len(), 1);
    assert!(quotes.contains_key(&ticker("A")));
    assert_eq!(h.transport.calls("B"), 0);
}

#[test]
fn budget_caps_each_fetch_timeout() {
    let transport = MockTransport::new();
    transport.reply("A", Reply::Price("5"));
    transport.reply("B", Reply::Price("6"));
    let config = ServiceConfig {
        request_timeout: Duration::from_secs(10),
        ..ServiceConfig::default()
    };
    let h = harness_with(transport, config);

    let budget = Duration::from_secs(2);
    let quotes = h.service.get_quotes_within(["A", "B"], budget);
    assert_eq!(quotes.len(), 2);

    let timeouts = h.transport.timeouts();
    assert_eq!(timeouts.len(), 2);
    for timeout in timeouts {
        assert!(timeout <= budget, "fetch got {timeout:?}");
        assert!(!timeout.is_zero());
    }

    // Without a budget the configured timeout applies.
    h.clock.advance(chrono::Duration::minutes(10));
    h.service.get_quote("A").unwrap();
    assert_eq!(h.transport.timeouts().last(), Some(&Duration::from_secs(10)));
}

#[test]
fn panicking_lookup_does_not_drop_queued_tickers() {
    let transport = MockTransport::new();
    transport.reply("A", Reply::Panic);
    transport.reply("B", Reply::Price("2"));
    transport.reply("C", Reply::Price("3"));
    let config = ServiceConfig {
        max_concurrency: 1,
        ..ServiceConfig::default()
    };
    let h = harness_with(transport, config);

    let quotes = h.service.get_quotes(["A", "B", "C"]);
    assert_eq!(quotes.len(), 2);
    assert!(!quotes.contains_key(&ticker("A")));
    assert_eq!(quotes[&ticker("C")].price, dec("3"));
}

#[test]
fn alert_with_tiny_target_is_checked_without_panicking() {
    let transport = MockTransport::new();
    transport.reply("AAPL", Reply::Price("228"));
    let h = harness(transport);

    let mut alerts = vec![PriceAlert::new(
        1,
        ticker("AAPL"),
        dec("0.0000000000000000000000000001"),
        start_time(),
    )];
    let monitor = AlertMonitor::new(&h.service);

    assert!(monitor.check_and_trigger(&mut alerts).is_empty());
    assert!(!alerts[0].triggered);
}

#[test]
fn alert_monitor_fires_alerts_near_target() {
    let transport = MockTransport::new();
    transport.reply("AAPL", Reply::Price("228.50"));
    transport.reply("MSFT", Reply::Price("400.00"));
    let h = harness(transport);

    let mut alerts = vec![
        PriceAlert::new(1, ticker("AAPL"), dec("230"), start_time()),
        PriceAlert::new(2, ticker("MSFT"), dec("450"), start_time()),
        PriceAlert::new(3, ticker("ZZZZ"), dec("10"), start_time()),
    ];
    let monitor = AlertMonitor::new(&h.service);

    assert_eq!(monitor.check_and_trigger(&mut alerts), vec![1]);
    assert!(alerts[0].triggered);
    assert_eq!(alerts[0].triggered_at, Some(start_time()));
    assert!(!alerts[1].triggered);
    assert!(!alerts[2].triggered);

    // Triggered alerts are not looked up again.
    assert!(monitor.check_and_trigger(&mut alerts).is_empty());
    assert_eq!(h.transport.calls("AAPL"), 1);
}

#[test]
fn watchlist_rows_distinguish_missing_price_from_zero() {
    let transport = MockTransport::new();
    transport.reply("AAPL", Reply::Price("200"));
    transport.reply("FREE", Reply::Price("0"));
    let h = harness(transport);

    let entry = |id: u64, symbol: &str| WatchlistEntry {
        id,
        ticker: ticker(symbol),
        added_at: start_time(),
        source: None,
        notes: None,
        alerts: vec![PriceAlert::new(id * 10, ticker(symbol), dec("250"), start_time())],
    };
    let entries = vec![entry(1, "AAPL"), entry(2, "ZZZZ"), entry(3, "FREE")];

    let rows = assemble(&entries, &h.service);
    assert_eq!(rows.len(), 3);

    assert_eq!(rows[0].current_price, Some(dec("200")));
    assert_eq!(rows[0].alerts[0].distance_percent, Some(dec("25")));

    assert_eq!(rows[1].current_price, None);
    assert_eq!(rows[1].price_updated_at, None);

    assert_eq!(rows[2].current_price, Some(Decimal::ZERO));
    assert_eq!(rows[2].alerts[0].distance_percent, None);
}
