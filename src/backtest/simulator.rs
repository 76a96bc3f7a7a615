//! Deterministic tick replay
//!
//! Drives the same trading core the live engine uses, so backtests exercise
//! the exact signal thresholds and stop formulas that would run in
//! production. The only difference from live operation is where the ticks
//! come from.

use super::analytics::BacktestSummary;
use crate::account::EquityPoint;
use crate::config::Config;
use crate::engine::TradingCore;
use crate::feed::Tick;
use crate::position::{CloseReason, TradeRecord};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Full backtest output: metrics plus the raw trade list and equity curve
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestReport {
    pub summary: BacktestSummary,
    pub trades: Vec<TradeRecord>,
    pub equity_curve: Vec<EquityPoint>,
}

/// Tick replay harness
pub struct Simulator {
    config: Config,
}

impl Simulator {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Replay a time-sorted tick sequence, force-closing any open pairs at
    /// the end so every opened pair is settled before metrics are computed
    pub fn run(self, ticks: Vec<Tick>) -> BacktestReport {
        let mut core = TradingCore::new(self.config);
        let total = ticks.len();
        info!(ticks = total, "backtest started");

        for tick in ticks {
            core.on_tick(tick);
        }
        core.finish(CloseReason::BacktestEnd);

        let account = core.account();
        let report = BacktestReport {
            summary: BacktestSummary::from_account(account),
            trades: account.trades().to_vec(),
            equity_curve: account.equity_curve().to_vec(),
        };
        info!(
            trades = report.summary.trade_count,
            pnl = %report.summary.total_pnl,
            "backtest finished"
        );
        report
    }
}
