//! Position, pair, and trade record types

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Direction of one leg
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    Long,
    Short,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Long => write!(f, "LONG"),
            Side::Short => write!(f, "SHORT"),
        }
    }
}

/// Why a leg was closed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CloseReason {
    HardStop,
    TrailingStop,
    Signal,
    SetProtection,
    BacktestEnd,
    Shutdown,
}

impl fmt::Display for CloseReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CloseReason::HardStop => "hard stop",
            CloseReason::TrailingStop => "trailing stop",
            CloseReason::Signal => "signal exit",
            CloseReason::SetProtection => "SET protection",
            CloseReason::BacktestEnd => "backtest end",
            CloseReason::Shutdown => "engine shutdown",
        };
        write!(f, "{s}")
    }
}

/// One open leg of a pair
#[derive(Debug, Clone)]
pub struct Leg {
    pub pair_id: Uuid,
    pub symbol: String,
    pub side: Side,
    /// Fill price including entry slippage
    pub entry_price: Decimal,
    /// Size in base units
    pub size: Decimal,
    pub entry_time: DateTime<Utc>,
    /// Most favorable price seen since entry (peak for LONG, trough for SHORT)
    pub extreme_price: Decimal,
    pub confidence: Decimal,
    /// Fee charged at open
    pub open_fee: Decimal,
    /// Profit this leg must reach to offset its closed sibling; set when the
    /// sibling closes first
    pub breakeven_target: Option<Decimal>,
    /// Whether the breakeven target has been reached; once set, the leg is
    /// back on ordinary trailing logic for good
    pub breakeven_reached: bool,
    /// Whether the leg has ever had positive unrealized P&L
    pub been_in_profit: bool,
}

impl Leg {
    /// Unrealized gross P&L at the given price, leveraged
    pub fn gross_pnl(&self, price: Decimal, leverage: Decimal) -> Decimal {
        let delta = match self.side {
            Side::Long => price - self.entry_price,
            Side::Short => self.entry_price - price,
        };
        delta * self.size * leverage
    }

    /// Unrealized P&L as percent of entry notional
    pub fn pnl_pct(&self, price: Decimal, leverage: Decimal) -> Decimal {
        let notional = self.entry_price * self.size;
        if notional.is_zero() {
            return Decimal::ZERO;
        }
        self.gross_pnl(price, leverage) / notional * Decimal::ONE_HUNDRED
    }

    /// Move the peak/trough toward the more favorable of itself and `price`
    pub fn update_extreme(&mut self, price: Decimal) {
        self.extreme_price = match self.side {
            Side::Long => self.extreme_price.max(price),
            Side::Short => self.extreme_price.min(price),
        };
    }

    /// Adverse distance the price has pulled back from the extreme
    pub fn pullback(&self, price: Decimal) -> Decimal {
        match self.side {
            Side::Long => self.extreme_price - price,
            Side::Short => price - self.extreme_price,
        }
    }
}

/// Record of one closed leg
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LegClose {
    pub side: Side,
    pub entry_price: Decimal,
    /// Fill price including exit slippage
    pub exit_price: Decimal,
    pub size: Decimal,
    pub exit_time: DateTime<Utc>,
    /// Leveraged price P&L at the exit fill, before fees
    pub gross_pnl: Decimal,
    /// Open fee plus close fee for this leg
    pub fees: Decimal,
    /// gross_pnl minus fees
    pub net_pnl: Decimal,
    pub reason: CloseReason,
}

/// A linked LONG+SHORT entry awaiting settlement
#[derive(Debug, Clone)]
pub struct OpenPair {
    pub id: Uuid,
    pub symbol: String,
    /// Unslipped market price both legs entered at
    pub entry_price: Decimal,
    pub entry_time: DateTime<Utc>,
    pub long: Option<Leg>,
    pub short: Option<Leg>,
    /// Set when the first leg closes; the pair settles when the second does
    pub first_close: Option<LegClose>,
    /// Set when the second leg closes, immediately before settlement
    pub second_close: Option<LegClose>,
}

impl OpenPair {
    /// Number of legs still open
    pub fn open_legs(&self) -> usize {
        self.long.is_some() as usize + self.short.is_some() as usize
    }
}

/// One settled pair, emitted exactly once
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeRecord {
    pub pair_id: Uuid,
    pub symbol: String,
    pub entry_price: Decimal,
    pub entry_time: DateTime<Utc>,
    pub exit_time: DateTime<Utc>,
    pub first_close: LegClose,
    pub second_close: LegClose,
    /// Combined net P&L of both legs; the single balance mutation
    pub net_pnl: Decimal,
    pub total_fees: Decimal,
    pub hold_secs: i64,
}

impl TradeRecord {
    pub fn is_win(&self) -> bool {
        self.net_pnl > Decimal::ZERO
    }
}
