//! Prometheus metrics
//!
//! Thin wrappers over the metrics macros so call sites stay one line and the
//! metric names live in one place.

use crate::position::TradeRecord;
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use rust_decimal::Decimal;

/// Install the Prometheus exporter with an HTTP listener on the given port
pub fn init_metrics(port: u16) -> anyhow::Result<()> {
    PrometheusBuilder::new()
        .with_http_listener(([0, 0, 0, 0], port))
        .install()?;

    describe_counter!("ticks_received_total", "Ticks received per symbol");
    describe_counter!("pairs_opened_total", "Straddle pairs opened per symbol");
    describe_counter!("pairs_settled_total", "Straddle pairs settled per symbol");
    describe_counter!("feed_dead_total", "Feeds declared dead after exhausting reconnects");
    describe_gauge!("account_balance", "Current account balance");
    describe_gauge!("open_pairs", "Currently open pairs");
    describe_histogram!("trade_net_pnl", "Net P&L per settled pair");
    describe_histogram!("trade_hold_secs", "Hold duration per settled pair");
    Ok(())
}

pub fn tick_received(symbol: &str) {
    counter!("ticks_received_total", "symbol" => symbol.to_string()).increment(1);
}

pub fn pair_opened(symbol: &str) {
    counter!("pairs_opened_total", "symbol" => symbol.to_string()).increment(1);
}

pub fn pair_settled(record: &TradeRecord) {
    counter!("pairs_settled_total", "symbol" => record.symbol.clone()).increment(1);
    histogram!("trade_net_pnl").record(to_f64(record.net_pnl));
    histogram!("trade_hold_secs").record(record.hold_secs as f64);
}

pub fn feed_dead(symbol: &str) {
    counter!("feed_dead_total", "symbol" => symbol.to_string()).increment(1);
}

pub fn account_balance(balance: Decimal) {
    gauge!("account_balance").set(to_f64(balance));
}

pub fn open_pairs(count: usize) {
    gauge!("open_pairs").set(count as f64);
}

fn to_f64(d: Decimal) -> f64 {
    d.try_into().unwrap_or(0.0)
}
