//! Binance WebSocket tick feed implementation
//!
//! Parses the 24h rolling `@ticker` stream into [`Tick`] values and serves
//! on-demand top-of-book queries over REST.

use super::{Tick, TickFeed, TopOfBook};
use crate::config::FeedConfig;
use crate::ws::{WsClient, WsConfig, WsMessage};
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::str::FromStr;
use std::time::Duration;
use tokio::sync::{mpsc, watch};

/// Binance 24h ticker stream message
#[derive(Debug, Deserialize)]
struct BinanceTickerMessage {
    /// Event type
    #[serde(rename = "e")]
    event_type: String,
    /// Event time (milliseconds)
    #[serde(rename = "E")]
    event_time: i64,
    /// Symbol
    #[serde(rename = "s")]
    symbol: String,
    /// Price change percent
    #[serde(rename = "P")]
    change_pct: String,
    /// Last price
    #[serde(rename = "c")]
    last_price: String,
    /// Best bid price
    #[serde(rename = "b")]
    bid: String,
    /// Best bid quantity
    #[serde(rename = "B")]
    bid_qty: String,
    /// Best ask price
    #[serde(rename = "a")]
    ask: String,
    /// Best ask quantity
    #[serde(rename = "A")]
    ask_qty: String,
    /// 24h base-asset volume
    #[serde(rename = "v")]
    volume: String,
    /// 24h quote-asset volume
    #[serde(rename = "q")]
    quote_volume: String,
}

/// Binance REST bookTicker response
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BookTickerResponse {
    symbol: String,
    bid_price: String,
    bid_qty: String,
    ask_price: String,
    ask_qty: String,
}

/// Binance feed for `<symbol>@ticker` streams
pub struct BinanceFeed {
    config: FeedConfig,
    http: reqwest::Client,
    shutdown: watch::Receiver<bool>,
}

impl BinanceFeed {
    /// Create a new Binance feed
    pub fn new(config: FeedConfig, shutdown: watch::Receiver<bool>) -> Self {
        Self {
            config,
            http: reqwest::Client::new(),
            shutdown,
        }
    }

    /// Build the WebSocket URL for a symbol's ticker stream
    fn build_ws_url(&self, symbol: &str) -> String {
        format!("{}/{}@ticker", self.config.ws_url, symbol.to_lowercase())
    }

    /// Parse a Binance ticker message into a Tick
    fn parse_message(msg: &str) -> Option<Tick> {
        let ticker: BinanceTickerMessage = serde_json::from_str(msg).ok()?;

        if ticker.event_type != "24hrTicker" {
            return None;
        }

        let timestamp = Utc.timestamp_millis_opt(ticker.event_time).single()?;

        Some(Tick {
            symbol: ticker.symbol,
            timestamp,
            price: Decimal::from_str(&ticker.last_price).ok()?,
            bid: Decimal::from_str(&ticker.bid).ok()?,
            bid_qty: Decimal::from_str(&ticker.bid_qty).ok()?,
            ask: Decimal::from_str(&ticker.ask).ok()?,
            ask_qty: Decimal::from_str(&ticker.ask_qty).ok()?,
            volume_24h: Decimal::from_str(&ticker.volume).ok()?,
            quote_volume_24h: Decimal::from_str(&ticker.quote_volume).ok()?,
            change_pct_24h: Decimal::from_str(&ticker.change_pct).ok()?,
        })
    }

    /// Run the message processing loop
    async fn run_message_loop(mut ws_rx: mpsc::Receiver<WsMessage>, tick_tx: mpsc::Sender<Tick>) {
        while let Some(msg) = ws_rx.recv().await {
            match msg {
                WsMessage::Text(text) => {
                    if let Some(tick) = Self::parse_message(&text) {
                        if tick_tx.send(tick).await.is_err() {
                            tracing::debug!("Tick receiver dropped, stopping feed");
                            break;
                        }
                    }
                }
                WsMessage::Connected => {
                    tracing::info!("Binance feed connected");
                }
                WsMessage::Disconnected => {
                    tracing::warn!("Binance feed disconnected");
                    break;
                }
                WsMessage::Reconnecting { attempt } => {
                    tracing::warn!(attempt, "Binance feed reconnecting...");
                }
                WsMessage::Binary(_) => {
                    // Ticker streams are text only
                }
            }
        }
    }
}

#[async_trait]
impl TickFeed for BinanceFeed {
    async fn subscribe(&self, symbol: &str) -> anyhow::Result<mpsc::Receiver<Tick>> {
        let (tick_tx, tick_rx) = mpsc::channel(1024);
        let url = self.build_ws_url(symbol);

        tracing::info!(symbol = %symbol, "Subscribing to Binance ticker feed");

        let ws_config = WsConfig::new(url)
            .max_reconnects(self.config.max_reconnects)
            .initial_delay(Duration::from_secs(self.config.initial_backoff_secs))
            .max_delay(Duration::from_secs(self.config.max_backoff_secs))
            .idle_timeout(Duration::from_secs(self.config.stale_feed_secs));

        let client = WsClient::new(ws_config);
        let ws_rx = client.connect(self.shutdown.clone());

        tokio::spawn(async move {
            Self::run_message_loop(ws_rx, tick_tx).await;
        });

        Ok(tick_rx)
    }

    async fn top_of_book(&self, symbol: &str) -> anyhow::Result<TopOfBook> {
        let url = format!(
            "{}/api/v3/ticker/bookTicker?symbol={}",
            self.config.rest_url,
            symbol.to_uppercase()
        );

        let resp: BookTickerResponse = self.http.get(&url).send().await?.json().await?;

        Ok(TopOfBook {
            symbol: resp.symbol,
            bid: Decimal::from_str(&resp.bid_price)?,
            bid_qty: Decimal::from_str(&resp.bid_qty)?,
            ask: Decimal::from_str(&resp.ask_price)?,
            ask_qty: Decimal::from_str(&resp.ask_qty)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    const TICKER_MSG: &str = r#"{
        "e": "24hrTicker",
        "E": 1704067200123,
        "s": "BTCUSDT",
        "p": "500.00",
        "P": "1.18",
        "c": "42500.50",
        "b": "42500.00",
        "B": "2.5",
        "a": "42501.00",
        "A": "1.2",
        "v": "35000.4",
        "q": "1480000000.0"
    }"#;

    fn test_config() -> FeedConfig {
        FeedConfig::default()
    }

    fn shutdown_rx() -> watch::Receiver<bool> {
        let (tx, rx) = watch::channel(false);
        std::mem::forget(tx);
        rx
    }

    #[test]
    fn test_build_ws_url() {
        let feed = BinanceFeed::new(test_config(), shutdown_rx());
        let url = feed.build_ws_url("BTCUSDT");
        assert_eq!(url, "wss://stream.binance.com:9443/ws/btcusdt@ticker");
    }

    #[test]
    fn test_parse_valid_ticker_message() {
        let tick = BinanceFeed::parse_message(TICKER_MSG).unwrap();
        assert_eq!(tick.symbol, "BTCUSDT");
        assert_eq!(tick.price, dec!(42500.50));
        assert_eq!(tick.bid, dec!(42500.00));
        assert_eq!(tick.ask, dec!(42501.00));
        assert_eq!(tick.volume_24h, dec!(35000.4));
        assert_eq!(tick.change_pct_24h, dec!(1.18));
    }

    #[test]
    fn test_parse_wrong_event_type() {
        let msg = TICKER_MSG.replace("24hrTicker", "aggTrade");
        assert!(BinanceFeed::parse_message(&msg).is_none());
    }

    #[test]
    fn test_parse_invalid_json() {
        assert!(BinanceFeed::parse_message("not valid json").is_none());
    }

    #[test]
    fn test_parse_invalid_price() {
        let msg = TICKER_MSG.replace("42500.50", "not_a_number");
        assert!(BinanceFeed::parse_message(&msg).is_none());
    }

    #[tokio::test]
    async fn test_message_loop_forwards_ticks() {
        let (ws_tx, ws_rx) = mpsc::channel(10);
        let (tick_tx, mut tick_rx) = mpsc::channel(10);

        let handle = tokio::spawn(async move {
            BinanceFeed::run_message_loop(ws_rx, tick_tx).await;
        });

        ws_tx
            .send(WsMessage::Text(TICKER_MSG.to_string()))
            .await
            .unwrap();

        let tick = tick_rx.recv().await.unwrap();
        assert_eq!(tick.symbol, "BTCUSDT");
        assert_eq!(tick.price, dec!(42500.50));

        ws_tx.send(WsMessage::Disconnected).await.unwrap();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_message_loop_ignores_invalid() {
        let (ws_tx, ws_rx) = mpsc::channel(10);
        let (tick_tx, mut tick_rx) = mpsc::channel(10);

        let handle = tokio::spawn(async move {
            BinanceFeed::run_message_loop(ws_rx, tick_tx).await;
        });

        ws_tx
            .send(WsMessage::Text("garbage".to_string()))
            .await
            .unwrap();
        ws_tx
            .send(WsMessage::Text(TICKER_MSG.to_string()))
            .await
            .unwrap();

        // Only the valid message comes through
        let tick = tick_rx.recv().await.unwrap();
        assert_eq!(tick.symbol, "BTCUSDT");

        ws_tx.send(WsMessage::Disconnected).await.unwrap();
        handle.await.unwrap();
    }
}
