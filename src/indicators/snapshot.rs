//! Derived indicator snapshot over a tick buffer

use super::Trend;
use crate::buffer::TickBuffer;
use crate::config::IndicatorConfig;
use chrono::Duration;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Ephemeral view of a symbol's tick-derived indicators.
///
/// Recomputed on demand; holds no state beyond what the buffer slice gave it.
/// With insufficient data every field carries its neutral sentinel and
/// `tick_count` lets the caller gate decisions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndicatorSnapshot {
    /// Std-dev of absolute consecutive deltas (quote units)
    pub volatility: Decimal,
    /// Volatility as percent of the current price
    pub volatility_pct: Decimal,
    /// Mean absolute consecutive delta (quote units)
    pub atr: Decimal,
    /// Mean absolute delta as percent of the current price
    pub atr_pct: Decimal,
    /// Volume-weighted average price over the main window
    pub vwap: Decimal,
    /// Plain mean price over the main window
    pub twap: Decimal,
    /// Percent price change per second across the window
    pub momentum_pct_per_sec: Decimal,
    /// Lower synthetic band bound
    pub band_lower: Decimal,
    /// Upper synthetic band bound
    pub band_upper: Decimal,
    /// Normalized price position within the band, in [0, 1]
    pub band_position: Decimal,
    /// Short-vs-long VWAP trend classification
    pub trend: Trend,
    /// Mean bid/ask spread percent over the most recent ticks
    pub spread_pct: Decimal,
    /// 25th percentile of in-window prices below current
    pub support: Decimal,
    /// 75th percentile of in-window prices above current
    pub resistance: Decimal,
    /// Ticks in the main window
    pub tick_count: usize,
}

impl IndicatorSnapshot {
    /// Compute a snapshot from the buffer's trailing window
    pub fn compute(buffer: &TickBuffer, config: &IndicatorConfig) -> Self {
        let window = buffer.window(Duration::seconds(config.window_secs));
        let short_window = buffer.window(Duration::seconds(config.short_window_secs));
        let price = buffer.last().map(|t| t.price).unwrap_or(Decimal::ZERO);

        let volatility = super::volatility(&window);
        let atr = super::mean_abs_delta(&window);
        let (volatility_pct, atr_pct) = if price.is_zero() {
            (Decimal::ZERO, Decimal::ZERO)
        } else {
            (
                volatility / price * Decimal::ONE_HUNDRED,
                atr / price * Decimal::ONE_HUNDRED,
            )
        };

        let vwap = super::vwap(&window);
        let short_vwap = super::vwap(&short_window);
        let (band_lower, band_upper) = super::bands(vwap, volatility, config.band_k);
        let (support, resistance) = super::support_resistance(&window, price);

        Self {
            volatility,
            volatility_pct,
            atr,
            atr_pct,
            vwap,
            twap: super::twap(&window),
            momentum_pct_per_sec: super::momentum_pct_per_sec(&window),
            band_lower,
            band_upper,
            band_position: super::band_position(price, band_lower, band_upper),
            trend: super::trend(short_vwap, vwap, config.trend_threshold_pct),
            spread_pct: super::mean_spread_pct(&buffer.recent(config.spread_ticks)),
            support,
            resistance,
            tick_count: window.len(),
        }
    }
}
