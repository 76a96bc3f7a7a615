//! Position sizing
//!
//! Sizes each leg as a fixed fraction of the current account balance, with a
//! minimum notional floor so tiny balances still place a tradeable order.

use crate::config::AccountConfig;
use rust_decimal::Decimal;

/// Fixed-fraction sizer
#[derive(Debug, Clone)]
pub struct FixedSizer {
    /// Fraction of balance allocated per leg
    pub fraction: Decimal,
    /// Minimum notional per leg
    pub min_notional: Decimal,
}

impl FixedSizer {
    pub fn new(config: &AccountConfig) -> Self {
        Self {
            fraction: config.size_fraction,
            min_notional: config.min_notional,
        }
    }

    /// Notional allocated per leg for the given balance
    pub fn notional(&self, balance: Decimal) -> Decimal {
        (balance * self.fraction).max(self.min_notional)
    }

    /// Leg size in base units at the given price. Zero when the price is
    /// non-positive; callers treat that as "do not enter".
    pub fn units(&self, balance: Decimal, price: Decimal) -> Decimal {
        if price <= Decimal::ZERO {
            return Decimal::ZERO;
        }
        self.notional(balance) / price
    }
}
