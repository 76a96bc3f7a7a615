//! Tick indicator engine
//!
//! Pure functions over a trailing time window of buffered ticks. No candle or
//! OHLCV aggregation anywhere: everything derives from raw tick sequences.
//! Every function degrades to a neutral sentinel on insufficient data; the
//! caller gates signal generation on a minimum tick count.

mod snapshot;

pub use snapshot::IndicatorSnapshot;

use crate::feed::Tick;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Trend classification from short-vs-long VWAP comparison
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Trend {
    Bullish,
    Bearish,
    Neutral,
}

fn to_f64(d: Decimal) -> f64 {
    d.try_into().unwrap_or(0.0)
}

fn from_f64(v: f64) -> Decimal {
    Decimal::try_from(v).unwrap_or(Decimal::ZERO)
}

/// Standard deviation of absolute consecutive price deltas within the window.
///
/// Returns 0 with fewer than 2 ticks.
pub fn volatility(window: &[&Tick]) -> Decimal {
    if window.len() < 2 {
        return Decimal::ZERO;
    }

    let deltas: Vec<f64> = window
        .windows(2)
        .map(|w| (to_f64(w[1].price) - to_f64(w[0].price)).abs())
        .collect();

    let n = deltas.len() as f64;
    let mean = deltas.iter().sum::<f64>() / n;
    let variance = deltas.iter().map(|d| (d - mean).powi(2)).sum::<f64>() / n;

    from_f64(variance.sqrt())
}

/// Mean absolute consecutive price delta (ATR-style secondary volatility
/// measure). Returns 0 with fewer than 2 ticks.
pub fn mean_abs_delta(window: &[&Tick]) -> Decimal {
    if window.len() < 2 {
        return Decimal::ZERO;
    }

    let sum: f64 = window
        .windows(2)
        .map(|w| (to_f64(w[1].price) - to_f64(w[0].price)).abs())
        .sum();

    from_f64(sum / (window.len() - 1) as f64)
}

/// Volume-weighted average price using each tick's 24h volume as weight.
///
/// Falls back to the unweighted mean when total weight is 0; returns 0 for an
/// empty window.
pub fn vwap(window: &[&Tick]) -> Decimal {
    if window.is_empty() {
        return Decimal::ZERO;
    }

    let total_weight: Decimal = window.iter().map(|t| t.volume_24h).sum();
    if total_weight.is_zero() {
        return twap(window);
    }

    let weighted: Decimal = window.iter().map(|t| t.price * t.volume_24h).sum();
    weighted / total_weight
}

/// Time-weighted average price: plain mean over the window's ticks
pub fn twap(window: &[&Tick]) -> Decimal {
    if window.is_empty() {
        return Decimal::ZERO;
    }
    let sum: Decimal = window.iter().map(|t| t.price).sum();
    sum / Decimal::from(window.len())
}

/// Percent price change from window start to end, normalized by elapsed
/// seconds (a rate, not a magnitude). Returns 0 with fewer than 2 ticks or
/// zero elapsed time.
pub fn momentum_pct_per_sec(window: &[&Tick]) -> Decimal {
    let (Some(first), Some(last)) = (window.first(), window.last()) else {
        return Decimal::ZERO;
    };
    if window.len() < 2 || first.price.is_zero() {
        return Decimal::ZERO;
    }

    let elapsed = (last.timestamp - first.timestamp).num_seconds();
    if elapsed <= 0 {
        return Decimal::ZERO;
    }

    let change_pct = (last.price - first.price) / first.price * Decimal::ONE_HUNDRED;
    change_pct / Decimal::from(elapsed)
}

/// Synthetic band bounds: center ± k × volatility
pub fn bands(center: Decimal, volatility: Decimal, k: Decimal) -> (Decimal, Decimal) {
    let half_width = volatility * k;
    (center - half_width, center + half_width)
}

/// Normalized position of price within the band, clamped to [0, 1].
///
/// Defaults to 0.5 when the band has no width.
pub fn band_position(price: Decimal, lower: Decimal, upper: Decimal) -> Decimal {
    if upper <= lower {
        return Decimal::new(5, 1);
    }
    let pos = (price - lower) / (upper - lower);
    pos.clamp(Decimal::ZERO, Decimal::ONE)
}

/// Trend from short-window VWAP vs long-window VWAP beyond a relative
/// threshold (percent)
pub fn trend(short_vwap: Decimal, long_vwap: Decimal, threshold_pct: Decimal) -> Trend {
    if long_vwap.is_zero() {
        return Trend::Neutral;
    }
    let diff_pct = (short_vwap - long_vwap) / long_vwap * Decimal::ONE_HUNDRED;
    if diff_pct > threshold_pct {
        Trend::Bullish
    } else if diff_pct < -threshold_pct {
        Trend::Bearish
    } else {
        Trend::Neutral
    }
}

/// Mean of (ask − bid) / price over the given ticks, in percent
pub fn mean_spread_pct(ticks: &[&Tick]) -> Decimal {
    let spreads: Vec<Decimal> = ticks
        .iter()
        .filter(|t| !t.price.is_zero())
        .map(|t| (t.ask - t.bid) / t.price * Decimal::ONE_HUNDRED)
        .collect();

    if spreads.is_empty() {
        return Decimal::ZERO;
    }
    spreads.iter().sum::<Decimal>() / Decimal::from(spreads.len())
}

/// Support and resistance: 25th percentile of in-window prices below the
/// current price, 75th percentile of those above. Either side falls back to
/// the current price when empty.
pub fn support_resistance(window: &[&Tick], current: Decimal) -> (Decimal, Decimal) {
    let below: Vec<f64> = window
        .iter()
        .filter(|t| t.price < current)
        .map(|t| to_f64(t.price))
        .collect();
    let above: Vec<f64> = window
        .iter()
        .filter(|t| t.price > current)
        .map(|t| to_f64(t.price))
        .collect();

    let support = percentile(&below, 0.25).map(from_f64).unwrap_or(current);
    let resistance = percentile(&above, 0.75).map(from_f64).unwrap_or(current);
    (support, resistance)
}

fn percentile(values: &[f64], q: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let idx = ((sorted.len() - 1) as f64 * q).round() as usize;
    Some(sorted[idx])
}
