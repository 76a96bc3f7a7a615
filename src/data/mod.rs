//! Historical data loading and result persistence

mod loader;
mod recorder;

pub use loader::load_ticks;
pub use recorder::Recorder;
