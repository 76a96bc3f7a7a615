//! Historical tick loading
//!
//! CSV columns: `timestamp_ms,symbol,price[,bid,ask,volume]`. Missing book
//! fields fall back to the trade price so indicator math stays defined.
//! Rows are sorted by timestamp after loading; replay order must not depend
//! on file order.

use crate::feed::Tick;
use anyhow::Context;
use chrono::{TimeZone, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize)]
struct TickRow {
    timestamp_ms: i64,
    symbol: String,
    price: Decimal,
    #[serde(default)]
    bid: Option<Decimal>,
    #[serde(default)]
    ask: Option<Decimal>,
    #[serde(default)]
    volume: Option<Decimal>,
}

impl TickRow {
    fn into_tick(self) -> anyhow::Result<Tick> {
        let timestamp = Utc
            .timestamp_millis_opt(self.timestamp_ms)
            .single()
            .with_context(|| format!("invalid timestamp {}", self.timestamp_ms))?;

        let volume = self.volume.unwrap_or(Decimal::ZERO);
        Ok(Tick {
            symbol: self.symbol,
            timestamp,
            price: self.price,
            bid: self.bid.unwrap_or(self.price),
            bid_qty: Decimal::ZERO,
            ask: self.ask.unwrap_or(self.price),
            ask_qty: Decimal::ZERO,
            volume_24h: volume,
            quote_volume_24h: volume * self.price,
            change_pct_24h: Decimal::ZERO,
        })
    }
}

/// Load ticks from a CSV file, sorted by timestamp.
/// With `symbol` set, rows for other symbols are dropped.
pub fn load_ticks(path: impl AsRef<Path>, symbol: Option<&str>) -> anyhow::Result<Vec<Tick>> {
    let path = path.as_ref();
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("opening tick file {}", path.display()))?;

    let mut ticks = Vec::new();
    for (i, row) in reader.deserialize::<TickRow>().enumerate() {
        let row = row.with_context(|| format!("parsing row {} of {}", i + 1, path.display()))?;
        if let Some(want) = symbol {
            if row.symbol != want {
                continue;
            }
        }
        ticks.push(row.into_tick()?);
    }

    ticks.sort_by_key(|t| t.timestamp);
    Ok(ticks)
}
