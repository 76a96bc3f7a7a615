//! Tick feed module
//!
//! Capability interface for per-symbol tick subscriptions plus an on-demand
//! top-of-book query. The concrete exchange adapter lives in `binance`.

mod binance;
mod types;

pub use binance::BinanceFeed;
pub use types::{Tick, TopOfBook};

use async_trait::async_trait;
use tokio::sync::mpsc;

/// Trait for tick feed implementations
#[async_trait]
pub trait TickFeed: Send + Sync {
    /// Open a persistent tick subscription for one symbol
    async fn subscribe(&self, symbol: &str) -> anyhow::Result<mpsc::Receiver<Tick>>;

    /// Query the current top-of-book for a symbol
    async fn top_of_book(&self, symbol: &str) -> anyhow::Result<TopOfBook>;
}
