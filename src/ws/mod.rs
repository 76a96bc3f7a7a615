//! Reconnecting WebSocket transport used by the tick feed adapters

mod client;
mod types;

pub use client::WsClient;
pub use types::{WsConfig, WsError, WsMessage};
