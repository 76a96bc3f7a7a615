//! Tick feed types

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A single market tick: last trade price plus top-of-book and 24h statistics.
///
/// Immutable after creation; produced at roughly 10/second/symbol.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tick {
    /// Trading symbol (e.g., "BTCUSDT")
    pub symbol: String,
    /// Exchange event timestamp
    pub timestamp: DateTime<Utc>,
    /// Last trade price
    pub price: Decimal,
    /// Best bid price
    pub bid: Decimal,
    /// Best bid quantity
    pub bid_qty: Decimal,
    /// Best ask price
    pub ask: Decimal,
    /// Best ask quantity
    pub ask_qty: Decimal,
    /// Rolling 24h base-asset volume
    pub volume_24h: Decimal,
    /// Rolling 24h quote-asset volume
    pub quote_volume_24h: Decimal,
    /// Rolling 24h price change percent
    pub change_pct_24h: Decimal,
}

/// Top-of-book snapshot from an on-demand query
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopOfBook {
    /// Trading symbol
    pub symbol: String,
    /// Best bid price
    pub bid: Decimal,
    /// Best bid quantity
    pub bid_qty: Decimal,
    /// Best ask price
    pub ask: Decimal,
    /// Best ask quantity
    pub ask_qty: Decimal,
}

impl Tick {
    /// Mid price of the current book, falling back to last price when the
    /// book side is empty.
    pub fn mid(&self) -> Decimal {
        if self.bid.is_zero() || self.ask.is_zero() {
            self.price
        } else {
            (self.bid + self.ask) / Decimal::TWO
        }
    }
}
