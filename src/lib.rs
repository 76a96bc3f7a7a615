//! tick-straddle: tick-driven two-way (straddle) trading engine for crypto futures
//!
//! This library provides the core components for:
//! - Real-time tick ingestion with one feed task per symbol
//! - Fixed-capacity tick buffers and tick-derived indicators (no candles)
//! - Volatility-breakout signal generation for simultaneous long+short entries
//! - Trailing-stop management and paired ("SET") settlement
//! - A deterministic tick-by-tick backtest simulator sharing the live decision code
//! - Full observability stack

pub mod account;
pub mod backtest;
pub mod buffer;
pub mod cli;
pub mod config;
pub mod costs;
pub mod data;
pub mod engine;
pub mod feed;
pub mod indicators;
pub mod pipeline;
pub mod position;
pub mod signal;
pub mod sizing;
pub mod telemetry;
pub mod ws;
