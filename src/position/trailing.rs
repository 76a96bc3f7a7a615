//! Trailing-stop distance calculation
//!
//! Distance = volatility x multiplier. The multiplier shrinks linearly from
//! its base toward a floor as unrealized profit grows, so winners get stopped
//! tighter the more they are winning.

use crate::config::TrailConfig;
use rust_decimal::Decimal;

/// Multiplier for the given unrealized profit percent
pub fn trail_multiplier(profit_pct: Decimal, config: &TrailConfig) -> Decimal {
    if profit_pct <= config.accel_start_pct {
        return config.base_multiplier;
    }
    if profit_pct >= config.accel_full_pct {
        return config.min_multiplier;
    }

    let span = config.accel_full_pct - config.accel_start_pct;
    if span.is_zero() {
        return config.min_multiplier;
    }
    let progress = (profit_pct - config.accel_start_pct) / span;
    config.base_multiplier - (config.base_multiplier - config.min_multiplier) * progress
}

/// Trailing distance in quote units
pub fn trail_distance(volatility: Decimal, profit_pct: Decimal, config: &TrailConfig) -> Decimal {
    volatility * trail_multiplier(profit_pct, config)
}
