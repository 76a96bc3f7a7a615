//! Entry and exit signal generation

mod generator;
mod types;

pub use generator::SignalGenerator;
pub use types::{SignalAction, SignalContext};
