//! Account state and performance reporting
//!
//! The account is the single owner of balance-affecting state. A pair
//! settlement is the only operation that moves the balance, and each settled
//! pair moves it exactly once.

use crate::config::AccountConfig;
use crate::position::TradeRecord;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::info;

/// Health of a symbol's tick feed, surfaced in performance snapshots
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedStatus {
    Live,
    Reconnecting,
    Dead,
}

/// One point on the realized equity curve
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EquityPoint {
    pub time: DateTime<Utc>,
    pub balance: Decimal,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SymbolPerformance {
    pub trades: usize,
    pub wins: usize,
    pub net_pnl: Decimal,
    pub total_fees: Decimal,
    #[serde(default = "default_feed_status")]
    pub feed: FeedStatus,
}

fn default_feed_status() -> FeedStatus {
    FeedStatus::Live
}

impl Default for FeedStatus {
    fn default() -> Self {
        FeedStatus::Live
    }
}

/// Aggregate performance view
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerformanceSnapshot {
    pub time: DateTime<Utc>,
    pub balance: Decimal,
    pub starting_balance: Decimal,
    pub realized_pnl: Decimal,
    pub return_pct: Decimal,
    pub trade_count: usize,
    pub win_rate_pct: Decimal,
    pub trades_per_day: Decimal,
    pub max_drawdown_pct: Decimal,
    pub total_fees: Decimal,
    pub open_pairs: usize,
    pub symbols: HashMap<String, SymbolPerformance>,
}

/// Trading account: balance, ledger, equity curve
#[derive(Debug)]
pub struct Account {
    starting_balance: Decimal,
    balance: Decimal,
    total_fees: Decimal,
    trades: Vec<TradeRecord>,
    equity_curve: Vec<EquityPoint>,
    symbols: HashMap<String, SymbolPerformance>,
}

impl Account {
    pub fn new(config: &AccountConfig) -> Self {
        Self {
            starting_balance: config.starting_balance,
            balance: config.starting_balance,
            total_fees: Decimal::ZERO,
            trades: Vec::new(),
            equity_curve: Vec::new(),
            symbols: HashMap::new(),
        }
    }

    /// Apply one settled pair. The single balance mutation per pair.
    pub fn settle(&mut self, record: TradeRecord) {
        self.balance += record.net_pnl;
        self.total_fees += record.total_fees;
        self.equity_curve.push(EquityPoint {
            time: record.exit_time,
            balance: self.balance,
        });

        let entry = self.symbols.entry(record.symbol.clone()).or_default();
        entry.trades += 1;
        if record.is_win() {
            entry.wins += 1;
        }
        entry.net_pnl += record.net_pnl;
        entry.total_fees += record.total_fees;

        info!(
            symbol = %record.symbol,
            net_pnl = %record.net_pnl,
            balance = %self.balance,
            "trade settled"
        );
        self.trades.push(record);
    }

    pub fn set_feed_status(&mut self, symbol: &str, status: FeedStatus) {
        self.symbols.entry(symbol.to_string()).or_default().feed = status;
    }

    pub fn balance(&self) -> Decimal {
        self.balance
    }

    pub fn starting_balance(&self) -> Decimal {
        self.starting_balance
    }

    pub fn realized_pnl(&self) -> Decimal {
        self.balance - self.starting_balance
    }

    pub fn total_fees(&self) -> Decimal {
        self.total_fees
    }

    pub fn trades(&self) -> &[TradeRecord] {
        &self.trades
    }

    pub fn equity_curve(&self) -> &[EquityPoint] {
        &self.equity_curve
    }

    /// Worst realized peak-to-trough decline, as percent of the peak
    pub fn max_drawdown_pct(&self) -> Decimal {
        let mut peak = self.starting_balance;
        let mut worst = Decimal::ZERO;
        for point in &self.equity_curve {
            peak = peak.max(point.balance);
            if peak > Decimal::ZERO {
                let dd = (peak - point.balance) / peak * Decimal::ONE_HUNDRED;
                worst = worst.max(dd);
            }
        }
        worst
    }

    pub fn snapshot(&self, open_pairs: usize, now: DateTime<Utc>) -> PerformanceSnapshot {
        let trade_count = self.trades.len();
        let wins = self.trades.iter().filter(|t| t.is_win()).count();
        let win_rate_pct = if trade_count > 0 {
            Decimal::from(wins) / Decimal::from(trade_count) * Decimal::ONE_HUNDRED
        } else {
            Decimal::ZERO
        };

        let return_pct = if self.starting_balance.is_zero() {
            Decimal::ZERO
        } else {
            self.realized_pnl() / self.starting_balance * Decimal::ONE_HUNDRED
        };

        let trades_per_day = match self.trades.first() {
            Some(first) => {
                let secs = (now - first.entry_time).num_seconds().max(1);
                Decimal::from(trade_count) * Decimal::from(86_400) / Decimal::from(secs)
            }
            None => Decimal::ZERO,
        };

        PerformanceSnapshot {
            time: now,
            balance: self.balance,
            starting_balance: self.starting_balance,
            realized_pnl: self.realized_pnl(),
            return_pct,
            trade_count,
            win_rate_pct,
            trades_per_day,
            max_drawdown_pct: self.max_drawdown_pct(),
            total_fees: self.total_fees,
            open_pairs,
            symbols: self.symbols.clone(),
        }
    }
}
