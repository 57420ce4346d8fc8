//! Duplex push channel with automatic reconnection.
//!
//! The channel is a single task that connects, pumps frames, and on loss
//! sleeps a fixed delay before reconnecting. The sleep is owned by that
//! task, so there is never more than one pending reconnect. Intentional
//! teardown goes through a cancellation token and suppresses both the
//! reconnect and the disconnect event.

use std::sync::mpsc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tokio_util::sync::CancellationToken;

use crate::types::{ChatEnvelope, ClientError, EngineEvent};
use client_logging::{client_debug, client_info, client_warn};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

#[derive(Debug, Clone)]
pub struct ChannelConfig {
    /// Pause between a lost connection and the next attempt.
    pub reconnect_delay: Duration,
    pub connect_timeout: Duration,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            reconnect_delay: Duration::from_secs(3),
            connect_timeout: Duration::from_secs(10),
        }
    }
}

pub struct DuplexChannel {
    cancel: CancellationToken,
    task: tokio::task::JoinHandle<()>,
}

impl DuplexChannel {
    /// Opens the channel and keeps it alive until `shutdown` or drop.
    pub fn connect(
        handle: &tokio::runtime::Handle,
        ws_url: String,
        config: ChannelConfig,
        events: mpsc::Sender<EngineEvent>,
    ) -> Self {
        let cancel = CancellationToken::new();
        let task = handle.spawn(run_channel(ws_url, config, events, cancel.clone()));
        Self { cancel, task }
    }

    /// Intentional teardown: no disconnect event, no reconnect.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }
}

impl Drop for DuplexChannel {
    fn drop(&mut self) {
        self.cancel.cancel();
        self.task.abort();
    }
}

async fn run_channel(
    ws_url: String,
    config: ChannelConfig,
    events: mpsc::Sender<EngineEvent>,
    cancel: CancellationToken,
) {
    loop {
        let attempt = tokio::select! {
            _ = cancel.cancelled() => return,
            outcome = tokio::time::timeout(config.connect_timeout, connect_async(ws_url.as_str())) => outcome,
        };
        match attempt {
            Ok(Ok((stream, _response))) => {
                client_info!("push channel connected");
                if events.send(EngineEvent::ChannelUp).is_err() {
                    return;
                }
                pump_frames(stream, &events, &cancel).await;
                if cancel.is_cancelled() {
                    return;
                }
                client_warn!("push channel lost; reconnecting in {:?}", config.reconnect_delay);
                if events.send(EngineEvent::ChannelDown).is_err() {
                    return;
                }
            }
            Ok(Err(error)) => {
                client_warn!("push channel connect failed: {error}");
            }
            Err(_elapsed) => {
                client_warn!("push channel connect timed out");
            }
        }
        // The only reconnect timer lives here, in the one channel task.
        tokio::select! {
            _ = cancel.cancelled() => return,
            _ = tokio::time::sleep(config.reconnect_delay) => {}
        }
    }
}

/// Reads frames until the connection closes or teardown is requested.
async fn pump_frames(
    stream: WsStream,
    events: &mpsc::Sender<EngineEvent>,
    cancel: &CancellationToken,
) {
    let (mut writer, mut reader) = stream.split();
    loop {
        let frame = tokio::select! {
            _ = cancel.cancelled() => {
                let _ = writer.send(Message::Close(None)).await;
                return;
            }
            frame = reader.next() => frame,
        };
        match frame {
            Some(Ok(Message::Text(text))) => match decode_envelope(text.as_str()) {
                Ok(envelope) => {
                    if events.send(EngineEvent::EnvelopeReceived(envelope)).is_err() {
                        return;
                    }
                }
                Err(error) => {
                    // Malformed frames are dropped individually; the
                    // connection stays up.
                    client_debug!("dropping frame: {error}");
                }
            },
            Some(Ok(Message::Ping(payload))) => {
                let _ = writer.send(Message::Pong(payload)).await;
            }
            Some(Ok(Message::Close(_))) | None => return,
            Some(Ok(_)) => {}
            Some(Err(error)) => {
                client_warn!("push channel read failed: {error}");
                return;
            }
        }
    }
}

fn decode_envelope(text: &str) -> Result<ChatEnvelope, ClientError> {
    serde_json::from_str(text).map_err(|e| ClientError::Protocol(e.to_string()))
}
