//! Signal actions and evaluation context

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Decision produced by one signal evaluation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SignalAction {
    /// Open a LONG and a SHORT leg together on the symbol
    EnterBoth { confidence: Decimal, reason: String },
    /// Close whatever legs remain open on the symbol
    Close { reason: String },
    /// Do nothing
    Hold,
}

impl SignalAction {
    pub fn is_hold(&self) -> bool {
        matches!(self, SignalAction::Hold)
    }
}

/// Caller-supplied state the generator needs but does not own.
///
/// The generator is a pure function of snapshot + context; entry bookkeeping
/// (open pairs, cooldown timestamps) lives with the engine.
#[derive(Debug, Clone, Copy)]
pub struct SignalContext {
    /// Whether the symbol already has an open pair
    pub has_open_pair: bool,
    /// When the symbol last entered, if ever
    pub last_entry: Option<DateTime<Utc>>,
    /// Evaluation time; the current tick's timestamp, never wall-clock
    pub now: DateTime<Utc>,
}
