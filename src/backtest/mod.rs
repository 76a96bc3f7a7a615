//! Backtesting over historical ticks

mod analytics;
mod simulator;

pub use analytics::BacktestSummary;
pub use simulator::{BacktestReport, Simulator};
