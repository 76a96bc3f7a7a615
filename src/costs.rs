//! Fee, slippage, and leverage model
//!
//! Shared by the live engine and the backtest simulator so that both price
//! fills and charge fees identically. Slippage always worsens the fill
//! against the trader; fees are charged on the open and the close of each
//! leg.

use crate::config::CostConfig;
use crate::position::Side;
use rust_decimal::Decimal;

/// Execution cost model
#[derive(Debug, Clone)]
pub struct CostModel {
    /// Fee as a fraction of notional per transaction
    pub fee_rate: Decimal,
    /// Slippage as a fraction of price per fill
    pub slippage_rate: Decimal,
    /// P&L leverage multiplier
    pub leverage: Decimal,
}

impl CostModel {
    /// Build from configuration
    pub fn new(config: &CostConfig) -> Self {
        Self {
            fee_rate: config.fee_rate,
            slippage_rate: config.slippage_rate,
            leverage: config.leverage,
        }
    }

    /// Frictionless model for tests and parity checks
    pub fn zero() -> Self {
        Self {
            fee_rate: Decimal::ZERO,
            slippage_rate: Decimal::ZERO,
            leverage: Decimal::ONE,
        }
    }

    /// Entry fill price with slippage applied against the trader
    pub fn entry_fill(&self, side: Side, price: Decimal) -> Decimal {
        match side {
            Side::Long => price * (Decimal::ONE + self.slippage_rate),
            Side::Short => price * (Decimal::ONE - self.slippage_rate),
        }
    }

    /// Exit fill price with slippage applied against the trader
    pub fn exit_fill(&self, side: Side, price: Decimal) -> Decimal {
        match side {
            Side::Long => price * (Decimal::ONE - self.slippage_rate),
            Side::Short => price * (Decimal::ONE + self.slippage_rate),
        }
    }

    /// Fee for one transaction at the given price and size
    pub fn fee(&self, price: Decimal, size: Decimal) -> Decimal {
        price * size * self.fee_rate
    }
}
