//! Shared helpers for price service integration tests.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use price_service::{FetchError, HttpResponse, HttpTransport, ManualClock, PriceService, ServiceConfig};

/// Canned upstream behaviour for one ticker.
#[derive(Debug, Clone)]
pub enum Reply {
    /// 200 with a chart payload carrying this literal price.
    Price(&'static str),
    /// Non-success status with an empty body.
    Status(u16),
    /// 200 with an arbitrary body.
    Body(&'static str),
    /// Transport failure.
    NetworkError,
    /// Deadline exceeded.
    Timeout,
    /// The transport panics mid-call.
    Panic,
}

/// Chart payload as returned by the upstream API.
pub fn chart_body(price: &str) -> String {
    format!(
        "{{\"chart\":{{\"result\":[{{\"meta\":{{\"regularMarketPrice\":{price}}}}}],\"error\":null}}}}"
    )
}

/// `HttpTransport` answering from a per-ticker table and counting calls.
#[derive(Default)]
pub struct MockTransport {
    replies: Mutex<HashMap<String, Reply>>,
    calls: Mutex<HashMap<String, usize>>,
    timeouts: Mutex<Vec<Duration>>,
    delay: Duration,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call sleeps `delay` before answering.
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay,
            ..Self::default()
        }
    }

    pub fn reply(&self, ticker: &str, reply: Reply) {
        self.replies.lock().unwrap().insert(ticker.to_string(), reply);
    }

    pub fn calls(&self, ticker: &str) -> usize {
        self.calls.lock().unwrap().get(ticker).copied().unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().values().sum()
    }

    /// Timeout passed with every call, in call order.
    pub fn timeouts(&self) -> Vec<Duration> {
        self.timeouts.lock().unwrap().clone()
    }

    /// Highest number of calls observed running at the same time.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

fn ticker_from_url(url: &str) -> String {
    let path = url.split('?').next().unwrap_or(url);
    path.rsplit('/').next().unwrap_or_default().to_string()
}

impl HttpTransport for MockTransport {
    fn get(&self, url: &str, timeout: Duration) -> Result<HttpResponse, FetchError> {
        let ticker = ticker_from_url(url);
        *self.calls.lock().unwrap().entry(ticker.clone()).or_insert(0) += 1;
        self.timeouts.lock().unwrap().push(timeout);

        let now_in_flight = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now_in_flight, Ordering::SeqCst);
        if !self.delay.is_zero() {
            thread::sleep(self.delay);
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        let reply = self
            .replies
            .lock()
            .unwrap()
            .get(&ticker)
            .cloned()
            .unwrap_or(Reply::Status(404));
        match reply {
            Reply::Price(price) => Ok(HttpResponse {
                status: 200,
                body: chart_body(price),
            }),
            Reply::Status(status) => Ok(HttpResponse {
                status,
                body: String::new(),
            }),
            Reply::Body(body) => Ok(HttpResponse {
                status: 200,
                body: body.to_string(),
            }),
            Reply::NetworkError => Err(FetchError::Network("connection refused".into())),
            Reply::Timeout => Err(FetchError::Timeout(timeout)),
            Reply::Panic => panic!("transport blew up on {ticker}"),
        }
    }
}

pub fn start_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 11, 5, 16, 1, 51).unwrap()
}

pub struct Harness {
    pub transport: Arc<MockTransport>,
    pub clock: Arc<ManualClock>,
    pub service: PriceService,
}

pub fn harness(transport: MockTransport) -> Harness {
    harness_with(transport, ServiceConfig::default())
}

pub fn harness_with(transport: MockTransport, config: ServiceConfig) -> Harness {
    let _ = env_logger::builder().is_test(true).try_init();
    let transport = Arc::new(transport);
    let clock = Arc::new(ManualClock::new(start_time()));
    let service = PriceService::with_parts(config, transport.clone(), clock.clone())
        .expect("valid test config");
    Harness {
        transport,
        clock,
        service,
    }
}
