//! Symbol-agnostic trading core
//!
//! One synchronous decision path shared verbatim by the live engine and the
//! backtest simulator. Both construct a core from the same configuration and
//! push ticks through `on_tick`; any divergence between live and simulated
//! behavior would invalidate backtest predictivity, so neither side carries
//! its own copy of the rules.
//!
//! Per tick, stops are evaluated before the (cadenced) signal pass, and all
//! times come from tick timestamps rather than the wall clock so replays are
//! deterministic.

use crate::account::Account;
use crate::config::Config;
use crate::costs::CostModel;
use crate::feed::Tick;
use crate::pipeline::SymbolPipeline;
use crate::position::{CloseReason, LegClose, PairBook, PairEvent, TradeRecord};
use crate::signal::{SignalAction, SignalContext, SignalGenerator};
use crate::sizing::FixedSizer;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::collections::HashMap;
use tracing::info;
use uuid::Uuid;

/// Everything the core did in response to one tick
#[derive(Debug, Clone)]
pub enum CoreEvent {
    PairOpened {
        symbol: String,
        pair_id: Uuid,
        price: Decimal,
        size: Decimal,
        time: DateTime<Utc>,
        reason: String,
    },
    LegClosed {
        symbol: String,
        pair_id: Uuid,
        close: LegClose,
    },
    PairSettled(TradeRecord),
}

struct SymbolState {
    pipeline: SymbolPipeline,
    generator: SignalGenerator,
    trail: crate::config::TrailConfig,
}

/// Shared decision engine over pipelines, book, and account
pub struct TradingCore {
    config: Config,
    costs: CostModel,
    sizer: FixedSizer,
    symbols: HashMap<String, SymbolState>,
    book: PairBook,
    account: Account,
    cooldowns: HashMap<String, DateTime<Utc>>,
    last_price: HashMap<String, (Decimal, DateTime<Utc>)>,
}

impl TradingCore {
    pub fn new(config: Config) -> Self {
        let costs = CostModel::new(&config.costs);
        let sizer = FixedSizer::new(&config.account);
        let account = Account::new(&config.account);
        Self {
            config,
            costs,
            sizer,
            symbols: HashMap::new(),
            book: PairBook::new(),
            account,
            cooldowns: HashMap::new(),
            last_price: HashMap::new(),
        }
    }

    fn symbol_state(&mut self, symbol: &str) -> &mut SymbolState {
        if !self.symbols.contains_key(symbol) {
            let state = SymbolState {
                pipeline: SymbolPipeline::new(
                    &self.config.engine,
                    self.config.indicators.clone(),
                ),
                generator: SignalGenerator::new(self.config.signal_for(symbol)),
                trail: self.config.trailing_for(symbol),
            };
            self.symbols.insert(symbol.to_string(), state);
        }
        self.symbols.get_mut(symbol).expect("inserted above")
    }

    /// Process one tick: stops first, then the cadenced signal pass
    pub fn on_tick(&mut self, tick: Tick) -> Vec<CoreEvent> {
        let symbol = tick.symbol.clone();
        let price = tick.price;
        let time = tick.timestamp;
        self.last_price.insert(symbol.clone(), (price, time));

        let outcome = self.symbol_state(&symbol).pipeline.process(tick);

        let mut events = Vec::new();
        let trail = self.symbols[&symbol].trail.clone();
        let stop_events =
            self.book
                .on_tick(&symbol, price, time, outcome.volatility, &trail, &self.costs);
        self.absorb(stop_events, &mut events);

        if let Some(snapshot) = outcome.snapshot {
            let ctx = SignalContext {
                has_open_pair: self.book.has_open(&symbol),
                last_entry: self.cooldowns.get(&symbol).copied(),
                now: time,
            };
            let action = self.symbols[&symbol].generator.evaluate(&snapshot, &ctx);
            match action {
                SignalAction::EnterBoth { confidence, reason } => {
                    let size = self.sizer.units(self.account.balance(), price);
                    if let Some(pair_id) =
                        self.book
                            .open_pair(&symbol, price, time, size, confidence, &self.costs)
                    {
                        self.cooldowns.insert(symbol.clone(), time);
                        info!(%symbol, %price, %size, %reason, "straddle entered");
                        events.push(CoreEvent::PairOpened {
                            symbol: symbol.clone(),
                            pair_id,
                            price,
                            size,
                            time,
                            reason,
                        });
                    }
                }
                SignalAction::Close { reason } => {
                    info!(%symbol, %reason, "signal exit");
                    let close_events =
                        self.book
                            .close_pair(&symbol, price, time, CloseReason::Signal, &self.costs);
                    self.absorb(close_events, &mut events);
                }
                SignalAction::Hold => {}
            }
        }

        events
    }

    /// Force-close every open pair at its symbol's last known price.
    /// No pair is left behind with an unsettled balance.
    pub fn finish(&mut self, reason: CloseReason) -> Vec<CoreEvent> {
        let mut events = Vec::new();
        for symbol in self.book.open_symbols() {
            let Some(&(price, time)) = self.last_price.get(&symbol) else {
                continue;
            };
            let close_events = self.book.close_pair(&symbol, price, time, reason, &self.costs);
            self.absorb(close_events, &mut events);
        }
        events
    }

    fn absorb(&mut self, pair_events: Vec<PairEvent>, out: &mut Vec<CoreEvent>) {
        for event in pair_events {
            match event {
                PairEvent::LegClosed {
                    symbol,
                    pair_id,
                    close,
                } => out.push(CoreEvent::LegClosed {
                    symbol,
                    pair_id,
                    close,
                }),
                PairEvent::PairSettled(record) => {
                    self.account.settle(record.clone());
                    out.push(CoreEvent::PairSettled(record));
                }
            }
        }
    }

    pub fn account(&self) -> &Account {
        &self.account
    }

    pub fn account_mut(&mut self) -> &mut Account {
        &mut self.account
    }

    pub fn book(&self) -> &PairBook {
        &self.book
    }

    pub fn last_entry(&self, symbol: &str) -> Option<DateTime<Utc>> {
        self.cooldowns.get(symbol).copied()
    }

    pub fn snapshot(&self, now: DateTime<Utc>) -> crate::account::PerformanceSnapshot {
        self.account.snapshot(self.book.open_pair_count(), now)
    }
}
