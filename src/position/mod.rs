//! Pair lifecycle: open, trail, survive, settle

mod book;
mod trailing;
mod types;

pub use book::{PairBook, PairEvent};
pub use trailing::{trail_distance, trail_multiplier};
pub use types::{CloseReason, Leg, LegClose, OpenPair, Side, TradeRecord};
