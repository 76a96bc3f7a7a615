//! Per-symbol tick pipeline
//!
//! Owns one symbol's buffer and sequencing. Every tick yields the volatility
//! the stop logic needs; a full indicator snapshot is only computed on the
//! configured cadence to bound CPU cost.

use crate::buffer::TickBuffer;
use crate::config::{EngineConfig, IndicatorConfig};
use crate::feed::Tick;
use crate::indicators::{self, IndicatorSnapshot};
use chrono::Duration;
use rust_decimal::Decimal;

/// What one tick produced
#[derive(Debug)]
pub struct TickOutcome {
    /// Window volatility, available on every tick for trailing stops
    pub volatility: Decimal,
    /// Full snapshot on signal-evaluation ticks, None otherwise
    pub snapshot: Option<IndicatorSnapshot>,
}

/// Buffer plus evaluation cadence for one symbol
#[derive(Debug)]
pub struct SymbolPipeline {
    buffer: TickBuffer,
    indicator_config: IndicatorConfig,
    signal_every_ticks: u64,
    tick_seq: u64,
}

impl SymbolPipeline {
    pub fn new(engine: &EngineConfig, indicators: IndicatorConfig) -> Self {
        Self {
            buffer: TickBuffer::new(engine.buffer_capacity),
            indicator_config: indicators,
            signal_every_ticks: engine.signal_every_ticks,
            tick_seq: 0,
        }
    }

    /// Ingest one tick
    pub fn process(&mut self, tick: Tick) -> TickOutcome {
        self.buffer.push(tick);
        self.tick_seq += 1;

        let window = self
            .buffer
            .window(Duration::seconds(self.indicator_config.window_secs));
        let volatility = indicators::volatility(&window);

        let snapshot = if self.tick_seq % self.signal_every_ticks == 0 {
            Some(IndicatorSnapshot::compute(&self.buffer, &self.indicator_config))
        } else {
            None
        };

        TickOutcome { volatility, snapshot }
    }

    pub fn buffer(&self) -> &TickBuffer {
        &self.buffer
    }

    pub fn ticks_seen(&self) -> u64 {
        self.tick_seq
    }
}
