//! Straddle entry/exit signal generation
//!
//! Pure evaluation over an indicator snapshot plus caller-supplied context.
//! The generator holds configuration only; it never mutates state, so the
//! live engine and the backtest simulator get identical decisions from
//! identical inputs.
//!
//! Entry requires every gate to pass:
//! 1. enough buffered ticks,
//! 2. cooldown elapsed since the symbol's last entry,
//! 3. both volatility measures above their thresholds,
//! 4. price near the band center,
//! 5. (selective variant) momentum magnitude above a small floor, filtering
//!    out completely flat books that happen to be noisy.
//!
//! Exit fires on a quiet regime (volatility collapsed relative to the mean
//! absolute delta) or on the price pinning either band extreme.

use super::types::{SignalAction, SignalContext};
use crate::config::SignalConfig;
use crate::indicators::IndicatorSnapshot;
use chrono::Duration;
use rust_decimal::Decimal;
use tracing::debug;

/// Stateless signal generator for one symbol
#[derive(Debug, Clone)]
pub struct SignalGenerator {
    config: SignalConfig,
}

impl SignalGenerator {
    pub fn new(config: SignalConfig) -> Self {
        Self { config }
    }

    /// Evaluate the snapshot and decide
    pub fn evaluate(&self, snapshot: &IndicatorSnapshot, ctx: &SignalContext) -> SignalAction {
        if snapshot.tick_count < self.config.min_ticks {
            return SignalAction::Hold;
        }

        if ctx.has_open_pair {
            self.evaluate_exit(snapshot)
        } else {
            self.evaluate_entry(snapshot, ctx)
        }
    }

    fn evaluate_entry(&self, snapshot: &IndicatorSnapshot, ctx: &SignalContext) -> SignalAction {
        if let Some(last_entry) = ctx.last_entry {
            let cooldown = Duration::seconds(self.config.cooldown_secs);
            if ctx.now - last_entry < cooldown {
                return SignalAction::Hold;
            }
        }

        if snapshot.volatility_pct <= self.config.hybrid_vol_pct {
            return SignalAction::Hold;
        }
        if snapshot.atr_pct <= self.config.atr_vol_pct {
            return SignalAction::Hold;
        }

        if snapshot.band_position < self.config.band_entry_low
            || snapshot.band_position > self.config.band_entry_high
        {
            debug!(
                band_position = %snapshot.band_position,
                "volatility gates passed but price is off-center"
            );
            return SignalAction::Hold;
        }

        if self.config.selective {
            let momentum_abs = snapshot.momentum_pct_per_sec.abs();
            if momentum_abs < self.config.momentum_floor_pct {
                return SignalAction::Hold;
            }
        }

        SignalAction::EnterBoth {
            confidence: self.config.entry_confidence,
            reason: format!(
                "vol {:.4}% > {:.4}%, atr {:.4}% > {:.4}%, band {:.2}",
                snapshot.volatility_pct,
                self.config.hybrid_vol_pct,
                snapshot.atr_pct,
                self.config.atr_vol_pct,
                snapshot.band_position
            ),
        }
    }

    fn evaluate_exit(&self, snapshot: &IndicatorSnapshot) -> SignalAction {
        // Quiet regime: volatility collapsed relative to the mean abs delta.
        // Guard against a zero secondary measure on flat data.
        if snapshot.atr > Decimal::ZERO
            && snapshot.volatility < self.config.quiet_fraction * snapshot.atr
        {
            return SignalAction::Close {
                reason: format!(
                    "quiet regime: vol {} below {} of atr {}",
                    snapshot.volatility, self.config.quiet_fraction, snapshot.atr
                ),
            };
        }

        if snapshot.band_position <= self.config.band_exit_low {
            return SignalAction::Close {
                reason: format!("band floor reached: {:.2}", snapshot.band_position),
            };
        }
        if snapshot.band_position >= self.config.band_exit_high {
            return SignalAction::Close {
                reason: format!("band ceiling reached: {:.2}", snapshot.band_position),
            };
        }

        SignalAction::Hold
    }
}
