//! Price-target alerts and their trigger check.
//!
//! An alert fires once the market price comes within 1% of its target, in either
//! direction. It is a proximity rule, not a crossing rule: a price that jumps past
//! the target by more than 1% between two checks never fires the alert.

use chrono::{DateTime, Utc};
use log::info;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use watchlist_common::{Quote, Ticker};

use crate::service::PriceService;

/// Relative distance to the target under which an alert fires (1%).
pub const PROXIMITY_THRESHOLD: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// Price target set on a watched ticker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceAlert {
    /// Record id assigned by the store.
    pub id: u64,
    /// Watched symbol.
    pub ticker: Ticker,
    /// Price the user wants to be told about.
    pub target_price: Decimal,
    /// Set once the alert fired; never reset by the checker.
    pub triggered: bool,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// When the alert fired.
    pub triggered_at: Option<DateTime<Utc>>,
}

impl PriceAlert {
    /// New, untriggered alert.
    pub fn new(id: u64, ticker: Ticker, target_price: Decimal, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            ticker,
            target_price,
            triggered: false,
            created_at,
            triggered_at: None,
        }
    }

    /// Mark the alert triggered at `now` if `quote` is close enough to the target.
    ///
    /// Returns `true` only on the transition; an already triggered alert is left as is.
    pub fn evaluate(&mut self, quote: &Quote, now: DateTime<Utc>) -> bool {
        if self.triggered || quote.ticker != self.ticker {
            return false;
        }
        if !is_near_target(quote.price, self.target_price) {
            return false;
        }
        self.triggered = true;
        self.triggered_at = Some(now);
        true
    }

    /// Signed distance from `current` to the target in percent of `current`.
    pub fn distance_percent(&self, current: Option<Decimal>) -> Option<Decimal> {
        distance_percent(self.target_price, current)
    }
}

/// `|price - target| / target < 1%`. A non-positive target never matches, and
/// neither does a ratio that overflows `Decimal`.
pub fn is_near_target(price: Decimal, target: Decimal) -> bool {
    if target <= Decimal::ZERO {
        return false;
    }
    price
        .checked_sub(target)
        .and_then(|diff| diff.abs().checked_div(target))
        .is_some_and(|ratio| ratio < PROXIMITY_THRESHOLD)
}

/// `(target - current) / current * 100`, absent when `current` is unknown or not
/// positive, or when the result does not fit in a `Decimal`.
pub fn distance_percent(target: Decimal, current: Option<Decimal>) -> Option<Decimal> {
    let current = current.filter(|price| *price > Decimal::ZERO)?;
    target
        .checked_sub(current)?
        .checked_div(current)?
        .checked_mul(Decimal::ONE_HUNDRED)
}

/// Checks pending alerts against current quotes.
pub struct AlertMonitor<'a> {
    service: &'a PriceService,
}

impl<'a> AlertMonitor<'a> {
    /// Create a monitor reading quotes from `service`.
    pub fn new(service: &'a PriceService) -> Self {
        Self { service }
    }

    /// Resolve the tickers of all untriggered alerts in one batch and fire the
    /// matching ones. Alerts without a current quote are skipped. Returns the ids
    /// of the alerts that fired.
    pub fn check_and_trigger(&self, alerts: &mut [PriceAlert]) -> Vec<u64> {
        let quotes = self.service.get_quotes(
            alerts
                .iter()
                .filter(|alert| !alert.triggered)
                .map(|alert| alert.ticker.as_str()),
        );
        let now = self.service.now();

        let mut fired = Vec::new();
        for alert in alerts.iter_mut() {
            let Some(quote) = quotes.get(&alert.ticker) else {
                continue;
            };
            if alert.evaluate(quote, now) {
                info!(
                    "Alert {} triggered: {} at {} (target {})",
                    alert.id, alert.ticker, quote.price, alert.target_price
                );
                fired.push(alert.id);
            }
        }
        fired
    }
}
