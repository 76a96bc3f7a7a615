//! Live trading entry point

use crate::config::Config;
use crate::engine::Engine;
use crate::feed::BinanceFeed;
use crate::telemetry;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::info;

pub async fn run(config: Config) -> anyhow::Result<()> {
    telemetry::init(&config.telemetry)?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("interrupt received, shutting down");
            let _ = shutdown_tx.send(true);
        }
    });

    let feed = Arc::new(BinanceFeed::new(config.feed.clone(), shutdown_rx.clone()));
    Engine::new(config, feed).run(shutdown_rx).await
}
