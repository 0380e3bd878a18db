//! Text rendering of watchlist rows.

use price_service::model::watchlist::WatchlistRow;
use rust_decimal::Decimal;

/// Render `rows` as a fixed-width table, one ticker per line.
pub fn render_table(rows: &[WatchlistRow]) -> String {
    let mut out = format!("{:<10} {:>14} {:>10}  {}\n", "TICKER", "PRICE", "UPDATED", "ALERTS");
    for row in rows {
        let price = row
            .current_price
            .map(|p| p.to_string())
            .unwrap_or_else(|| "n/a".to_string());
        let updated = row
            .price_updated_at
            .map(|t| t.format("%H:%M:%S").to_string())
            .unwrap_or_else(|| "-".to_string());
        let alerts: Vec<String> = row
            .alerts
            .iter()
            .map(|alert| {
                let mut cell = alert.target_price.to_string();
                if let Some(distance) = alert.distance_percent {
                    cell.push_str(&format!(" ({})", format_percent(distance)));
                }
                if alert.triggered {
                    cell.push_str(" TRIGGERED");
                }
                cell
            })
            .collect();
        out.push_str(&format!(
            "{:<10} {:>14} {:>10}  {}\n",
            row.ticker,
            price,
            updated,
            alerts.join(", ")
        ));
    }
    out
}

fn format_percent(value: Decimal) -> String {
    let rounded = value.round_dp(2);
    if rounded > Decimal::ZERO {
        format!("+{rounded}%")
    } else {
        format!("{rounded}%")
    }
}
