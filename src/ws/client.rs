//! WebSocket client with automatic reconnection and staleness detection

use super::types::{WsConfig, WsError, WsMessage};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::{mpsc, watch};
use tokio::time::{sleep, timeout};
use tokio_tungstenite::{connect_async, tungstenite::Message};

/// Reusable WebSocket client with exponential-backoff reconnection.
///
/// A connection that delivers no message within the configured idle timeout
/// is treated as stale and torn down. Backoff sleeps race against the
/// shutdown signal so cancellation is prompt.
pub struct WsClient {
    config: WsConfig,
}

impl WsClient {
    /// Create a new WebSocket client with the given configuration
    pub fn new(config: WsConfig) -> Self {
        Self { config }
    }

    /// Get the configured URL
    pub fn url(&self) -> &str {
        &self.config.url
    }

    /// Connect and return a receiver for messages
    ///
    /// Spawns a background task that handles connection management and
    /// automatic reconnection with exponential backoff. The stream ends with
    /// a final `Disconnected` when retries are exhausted, the server closes
    /// cleanly, or shutdown is signalled.
    pub fn connect(&self, shutdown: watch::Receiver<bool>) -> mpsc::Receiver<WsMessage> {
        let (tx, rx) = mpsc::channel(1024);
        let config = self.config.clone();

        tokio::spawn(async move {
            if let Err(e) = Self::run_connection_loop(config, tx, shutdown).await {
                tracing::error!(error = %e, "WebSocket connection loop failed");
            }
        });

        rx
    }

    /// Run the connection loop with automatic reconnection
    async fn run_connection_loop(
        config: WsConfig,
        tx: mpsc::Sender<WsMessage>,
        mut shutdown: watch::Receiver<bool>,
    ) -> Result<(), WsError> {
        let mut reconnect_attempts = 0u32;
        let mut reconnect_delay = config.initial_reconnect_delay;

        loop {
            match Self::connect_and_stream(&config, &tx, &mut shutdown).await {
                Ok(()) => {
                    tracing::info!("WebSocket connection closed cleanly");
                    let _ = tx.send(WsMessage::Disconnected).await;
                    break;
                }
                Err(e) => {
                    reconnect_attempts += 1;
                    tracing::warn!(
                        error = %e,
                        attempt = reconnect_attempts,
                        "WebSocket connection error, reconnecting..."
                    );

                    // Check max reconnects (0 = infinite)
                    if config.max_reconnect_attempts > 0
                        && reconnect_attempts >= config.max_reconnect_attempts
                    {
                        tracing::error!("Max reconnection attempts reached");
                        let _ = tx.send(WsMessage::Disconnected).await;
                        return Err(WsError::MaxReconnectsExceeded);
                    }

                    if tx.is_closed() {
                        tracing::info!("Receiver dropped, stopping reconnection");
                        break;
                    }

                    let _ = tx
                        .send(WsMessage::Reconnecting {
                            attempt: reconnect_attempts,
                        })
                        .await;

                    // Backoff sleep, cancellable by shutdown
                    tokio::select! {
                        _ = sleep(reconnect_delay) => {}
                        _ = shutdown.changed() => {
                            if *shutdown.borrow() {
                                let _ = tx.send(WsMessage::Disconnected).await;
                                break;
                            }
                        }
                    }
                    reconnect_delay = (reconnect_delay * 2).min(config.max_reconnect_delay);
                }
            }
        }

        Ok(())
    }

    /// Connect to the WebSocket and stream messages until close, error,
    /// staleness, or shutdown
    async fn connect_and_stream(
        config: &WsConfig,
        tx: &mpsc::Sender<WsMessage>,
        shutdown: &mut watch::Receiver<bool>,
    ) -> Result<(), WsError> {
        tracing::info!(url = %config.url, "Connecting to WebSocket");

        let (ws_stream, _response) = connect_async(config.url.as_str())
            .await
            .map_err(|e| WsError::ConnectionFailed(e.to_string()))?;

        let (mut write, mut read) = ws_stream.split();

        tracing::info!("WebSocket connected");

        if tx.send(WsMessage::Connected).await.is_err() {
            return Ok(());
        }

        loop {
            tokio::select! {
                msg = timeout(config.idle_timeout, read.next()) => {
                    match msg {
                        Err(_) => {
                            // Nothing received within the idle window
                            return Err(WsError::Stale);
                        }
                        Ok(Some(Ok(Message::Text(text)))) => {
                            if tx.send(WsMessage::Text(text)).await.is_err() {
                                tracing::debug!("Receiver dropped, closing connection");
                                return Ok(());
                            }
                        }
                        Ok(Some(Ok(Message::Binary(data)))) => {
                            if tx.send(WsMessage::Binary(data)).await.is_err() {
                                tracing::debug!("Receiver dropped, closing connection");
                                return Ok(());
                            }
                        }
                        Ok(Some(Ok(Message::Ping(data)))) => {
                            write.send(Message::Pong(data)).await
                                .map_err(|e| WsError::SendFailed(e.to_string()))?;
                        }
                        Ok(Some(Ok(Message::Close(_)))) => {
                            tracing::info!("Received close frame");
                            return Ok(());
                        }
                        Ok(Some(Err(e))) => {
                            return Err(WsError::ConnectionFailed(e.to_string()));
                        }
                        Ok(None) => {
                            return Err(WsError::ConnectionFailed("Stream ended unexpectedly".into()));
                        }
                        Ok(Some(Ok(_))) => {}
                    }
                }

                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        tracing::info!("Shutdown signalled, closing connection");
                        let _ = write.send(Message::Close(None)).await;
                        return Ok(());
                    }
                }
            }
        }
    }
}
