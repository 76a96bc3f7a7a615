//! Backtest performance metrics

use crate::account::{Account, EquityPoint};
use crate::position::TradeRecord;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Aggregate metrics over one backtest run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestSummary {
    pub starting_balance: Decimal,
    pub final_balance: Decimal,
    pub total_pnl: Decimal,
    pub return_pct: Decimal,
    pub trade_count: usize,
    pub win_rate_pct: Decimal,
    /// Gross winnings over gross losses; None when there are no losers
    pub profit_factor: Option<Decimal>,
    /// Mean over standard deviation of per-trade returns, not annualized
    pub sharpe: Decimal,
    pub max_drawdown_pct: Decimal,
    pub total_fees: Decimal,
    /// Fees as percent of absolute gross P&L
    pub fee_pct_of_gross: Decimal,
}

impl BacktestSummary {
    pub fn from_account(account: &Account) -> Self {
        let trades = account.trades();
        let trade_count = trades.len();
        let wins = trades.iter().filter(|t| t.is_win()).count();
        let win_rate_pct = if trade_count > 0 {
            Decimal::from(wins) / Decimal::from(trade_count) * Decimal::ONE_HUNDRED
        } else {
            Decimal::ZERO
        };

        let starting = account.starting_balance();
        let return_pct = if starting.is_zero() {
            Decimal::ZERO
        } else {
            account.realized_pnl() / starting * Decimal::ONE_HUNDRED
        };

        let gross_pnl: Decimal = trades.iter().map(|t| t.net_pnl + t.total_fees).sum();
        let fee_pct_of_gross = if gross_pnl.is_zero() {
            Decimal::ZERO
        } else {
            account.total_fees() / gross_pnl.abs() * Decimal::ONE_HUNDRED
        };

        Self {
            starting_balance: starting,
            final_balance: account.balance(),
            total_pnl: account.realized_pnl(),
            return_pct,
            trade_count,
            win_rate_pct,
            profit_factor: profit_factor(trades),
            sharpe: sharpe_ratio(starting, account.equity_curve()),
            max_drawdown_pct: account.max_drawdown_pct(),
            total_fees: account.total_fees(),
            fee_pct_of_gross,
        }
    }
}

/// Gross wins / gross losses. None when no trade lost money.
fn profit_factor(trades: &[TradeRecord]) -> Option<Decimal> {
    let gross_wins: Decimal = trades
        .iter()
        .filter(|t| t.net_pnl > Decimal::ZERO)
        .map(|t| t.net_pnl)
        .sum();
    let gross_losses: Decimal = trades
        .iter()
        .filter(|t| t.net_pnl < Decimal::ZERO)
        .map(|t| -t.net_pnl)
        .sum();

    if gross_losses.is_zero() {
        None
    } else {
        Some(gross_wins / gross_losses)
    }
}

/// Mean/std of per-settlement returns. The std-dev needs a square root, so
/// this drops to f64 and converts back.
fn sharpe_ratio(starting_balance: Decimal, curve: &[EquityPoint]) -> Decimal {
    if curve.len() < 2 {
        return Decimal::ZERO;
    }

    let mut returns = Vec::with_capacity(curve.len());
    let mut prev: f64 = starting_balance.try_into().unwrap_or(0.0);
    for point in curve {
        let balance: f64 = point.balance.try_into().unwrap_or(0.0);
        if prev != 0.0 {
            returns.push((balance - prev) / prev);
        }
        prev = balance;
    }
    if returns.len() < 2 {
        return Decimal::ZERO;
    }

    let n = returns.len() as f64;
    let mean = returns.iter().sum::<f64>() / n;
    let variance = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / n;
    let std = variance.sqrt();
    if std == 0.0 {
        return Decimal::ZERO;
    }
    Decimal::try_from(mean / std).unwrap_or(Decimal::ZERO)
}

impl fmt::Display for BacktestSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "==================== BACKTEST ====================")?;
        writeln!(f, "Starting balance:   {:>14.2}", self.starting_balance)?;
        writeln!(f, "Final balance:      {:>14.2}", self.final_balance)?;
        writeln!(f, "Total P&L:          {:>14.2}", self.total_pnl)?;
        writeln!(f, "Return:             {:>13.2}%", self.return_pct)?;
        writeln!(f, "Trades:             {:>14}", self.trade_count)?;
        writeln!(f, "Win rate:           {:>13.2}%", self.win_rate_pct)?;
        match self.profit_factor {
            Some(pf) => writeln!(f, "Profit factor:      {:>14.2}", pf)?,
            None => writeln!(f, "Profit factor:      {:>14}", "n/a")?,
        }
        writeln!(f, "Sharpe (per trade): {:>14.2}", self.sharpe)?;
        writeln!(f, "Max drawdown:       {:>13.2}%", self.max_drawdown_pct)?;
        writeln!(f, "Total fees:         {:>14.2}", self.total_fees)?;
        writeln!(f, "Fees / gross P&L:   {:>13.2}%", self.fee_pct_of_gross)?;
        write!(f, "==================================================")
    }
}
