//! Live trading engine
//!
//! One ingestion task per symbol feeds a single coordinator over a channel.
//! The coordinator exclusively owns the trading core (book, account,
//! cooldowns), so every balance and ledger mutation is serialized no matter
//! which symbol produced the event. A feed that exhausts its reconnect budget
//! is fatal for that symbol only.

mod core;

pub use self::core::{CoreEvent, TradingCore};

use crate::account::FeedStatus;
use crate::config::Config;
use crate::data::Recorder;
use crate::feed::{Tick, TickFeed};
use crate::position::CloseReason;
use crate::telemetry::metrics;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tracing::{error, info, warn};

/// Message from an ingestion task to the coordinator
#[derive(Debug)]
enum EngineEvent {
    Tick(Tick),
    FeedDead { symbol: String },
}

/// Live engine over a tick feed
pub struct Engine {
    config: Config,
    feed: Arc<dyn TickFeed>,
}

impl Engine {
    pub fn new(config: Config, feed: Arc<dyn TickFeed>) -> Self {
        Self { config, feed }
    }

    /// Run until the shutdown signal flips or every feed dies.
    /// All open pairs are force-closed at the last known price on the way out.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) -> anyhow::Result<()> {
        let recorder = Recorder::new(&self.config.data)?;
        let (event_tx, mut event_rx) = mpsc::channel::<EngineEvent>(4096);

        for symbol in &self.config.engine.symbols {
            tokio::spawn(ingest_symbol(
                Arc::clone(&self.feed),
                symbol.clone(),
                event_tx.clone(),
            ));
        }
        drop(event_tx);

        let mut core = TradingCore::new(self.config.clone());
        let mut tick_counts: HashMap<String, u64> = HashMap::new();
        let mut last_report: HashMap<String, u64> = HashMap::new();

        let mut watchdog = tokio::time::interval(Duration::from_secs(
            self.config.engine.watchdog_secs.max(1),
        ));
        watchdog.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        let mut snapshot_timer = tokio::time::interval(Duration::from_secs(
            self.config.data.snapshot_interval_secs.max(1),
        ));
        snapshot_timer.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        // Both intervals fire immediately once; swallow that
        watchdog.tick().await;
        snapshot_timer.tick().await;

        info!(symbols = ?self.config.engine.symbols, "engine started");

        loop {
            tokio::select! {
                Ok(()) = shutdown.changed() => {
                    if *shutdown.borrow() {
                        info!("shutdown signal received");
                        break;
                    }
                }
                event = event_rx.recv() => {
                    match event {
                        Some(EngineEvent::Tick(tick)) => {
                            metrics::tick_received(&tick.symbol);
                            *tick_counts.entry(tick.symbol.clone()).or_default() += 1;
                            let events = core.on_tick(tick);
                            handle_core_events(&events, &core, &recorder);
                        }
                        Some(EngineEvent::FeedDead { symbol }) => {
                            error!(symbol, "feed dead after exhausting reconnects");
                            metrics::feed_dead(&symbol);
                            core.account_mut().set_feed_status(&symbol, FeedStatus::Dead);
                        }
                        None => {
                            warn!("all ingestion tasks terminated");
                            break;
                        }
                    }
                }
                _ = watchdog.tick() => {
                    for (symbol, count) in &tick_counts {
                        let prev = last_report.get(symbol).copied().unwrap_or(0);
                        let delta = count - prev;
                        info!(symbol, ticks = delta, total = count, "watchdog");
                        if delta == 0 {
                            warn!(symbol, "no ticks since last watchdog interval");
                        }
                    }
                    last_report = tick_counts.clone();
                }
                _ = snapshot_timer.tick() => {
                    let snapshot = core.snapshot(Utc::now());
                    metrics::account_balance(snapshot.balance);
                    metrics::open_pairs(snapshot.open_pairs);
                    if let Err(e) = recorder.record_snapshot(&snapshot) {
                        warn!(error = %e, "failed to persist snapshot");
                    }
                }
            }
        }

        let events = core.finish(CloseReason::Shutdown);
        handle_core_events(&events, &core, &recorder);

        let snapshot = core.snapshot(Utc::now());
        if let Err(e) = recorder.record_snapshot(&snapshot) {
            warn!(error = %e, "failed to persist final snapshot");
        }
        info!(
            balance = %snapshot.balance,
            realized_pnl = %snapshot.realized_pnl,
            trades = snapshot.trade_count,
            "engine stopped"
        );
        Ok(())
    }
}

fn handle_core_events(events: &[CoreEvent], core: &TradingCore, recorder: &Recorder) {
    for event in events {
        match event {
            CoreEvent::PairOpened { symbol, .. } => {
                metrics::pair_opened(symbol);
                metrics::open_pairs(core.book().open_pair_count());
            }
            CoreEvent::LegClosed { .. } => {}
            CoreEvent::PairSettled(record) => {
                metrics::pair_settled(record);
                metrics::account_balance(core.account().balance());
                metrics::open_pairs(core.book().open_pair_count());
                if let Err(e) = recorder.record_trade(record) {
                    warn!(error = %e, "failed to persist trade record");
                }
            }
        }
    }
}

/// Forward one symbol's ticks into the coordinator channel.
/// Reconnection lives inside the feed; this task ends when the feed gives up.
async fn ingest_symbol(feed: Arc<dyn TickFeed>, symbol: String, tx: mpsc::Sender<EngineEvent>) {
    match feed.subscribe(&symbol).await {
        Ok(mut ticks) => {
            while let Some(tick) = ticks.recv().await {
                if tx.send(EngineEvent::Tick(tick)).await.is_err() {
                    return;
                }
            }
            let _ = tx.send(EngineEvent::FeedDead { symbol }).await;
        }
        Err(e) => {
            error!(symbol, error = %e, "failed to subscribe");
            let _ = tx.send(EngineEvent::FeedDead { symbol }).await;
        }
    }
}
