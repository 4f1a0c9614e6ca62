//! RTM connection management.
//!
//! [`RtmConnection`] keeps a real-time session open in a background task and
//! feeds decoded [`InboundEvent`]s into a channel read by the dispatcher.
//! Reconnection happens here and is invisible to the consumer, apart from an
//! extra `Connected` event per session.

use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use serde_json::Value;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tracing::{debug, info, warn};

use super::SlackAdapter;
use crate::application::errors::BotError;
use crate::domain::entities::{InboundEvent, MessageEvent, MessageSubtype};

/// Capacity of the event queue between the connection task and the dispatcher
pub const EVENT_QUEUE_CAPACITY: usize = 256;

const INITIAL_BACKOFF: Duration = Duration::from_secs(1);
const MAX_BACKOFF: Duration = Duration::from_secs(30);

/// Interval between client pings on an idle socket
const PING_INTERVAL: Duration = Duration::from_secs(30);

/// A decoded RTM frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RtmFrame {
    Event(InboundEvent),
    /// Server is about to close the socket
    Goodbye,
}

#[derive(Debug, Deserialize)]
struct RawFrame {
    #[serde(rename = "type")]
    kind: Option<String>,
    subtype: Option<String>,
    // objects rather than ids on some event types
    channel: Option<Value>,
    user: Option<Value>,
    text: Option<String>,
    error: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct RawError {
    #[serde(default)]
    code: i64,
    #[serde(default)]
    msg: String,
}

/// Decode one text frame from the socket
pub fn decode_frame(text: &str) -> RtmFrame {
    let frame: RawFrame = match serde_json::from_str(text) {
        Ok(frame) => frame,
        Err(e) => {
            debug!(error = %e, "Undecodable RTM frame");
            return RtmFrame::Event(InboundEvent::Other { kind: "undecodable".to_string() });
        }
    };

    let Some(kind) = frame.kind else {
        // replies to our own pings and sends carry `reply_to` and no type
        return RtmFrame::Event(InboundEvent::Other { kind: "reply".to_string() });
    };

    match kind.as_str() {
        "message" => RtmFrame::Event(InboundEvent::Message(MessageEvent {
            subtype: MessageSubtype::from_wire(frame.subtype.as_deref()),
            channel: id_of(frame.channel),
            user: id_of(frame.user),
            text: frame.text.unwrap_or_default(),
        })),
        "error" => {
            let message = frame
                .error
                .and_then(|e| serde_json::from_value::<RawError>(e).ok())
                .map(|e| format!("{} (code {})", e.msg, e.code))
                .unwrap_or_else(|| "unknown RTM error".to_string());
            RtmFrame::Event(InboundEvent::ConnectionError { message })
        }
        "goodbye" => RtmFrame::Goodbye,
        _ => RtmFrame::Event(InboundEvent::Other { kind }),
    }
}

fn id_of(value: Option<Value>) -> String {
    match value {
        Some(Value::String(id)) => id,
        _ => String::new(),
    }
}

/// Why a single socket session ended
enum SessionExit {
    /// Server said goodbye, closed, or the stream ended
    Disconnect,
    /// Nobody is reading events any more
    ReceiverGone,
}

/// Background producer of the event stream
pub struct RtmConnection {
    adapter: Arc<SlackAdapter>,
    events: mpsc::Sender<InboundEvent>,
    connection_count: u32,
    ping_id: u64,
}

impl RtmConnection {
    /// Start the connection task and return the consumer side of the queue
    pub fn spawn(adapter: Arc<SlackAdapter>) -> (mpsc::Receiver<InboundEvent>, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(EVENT_QUEUE_CAPACITY);
        let connection = Self {
            adapter,
            events: tx,
            connection_count: 0,
            ping_id: 0,
        };
        let handle = tokio::spawn(connection.run());
        (rx, handle)
    }

    async fn run(mut self) {
        let mut backoff = INITIAL_BACKOFF;

        loop {
            match self.adapter.rtm_connect().await {
                Err(BotError::Auth(e)) => {
                    warn!(error = %e, "rtm.connect rejected the token");
                    let _ = self.events.send(InboundEvent::InvalidAuth).await;
                    return;
                }
                Err(e) => {
                    if !self.emit(InboundEvent::ConnectionError { message: e.to_string() }).await {
                        return;
                    }
                }
                Ok(session) => {
                    let connected = InboundEvent::Connected {
                        self_id: session.bot.id.clone(),
                        connection_count: self.connection_count,
                    };
                    self.connection_count += 1;
                    if !self.emit(connected).await {
                        return;
                    }
                    backoff = INITIAL_BACKOFF;

                    match self.pump(&session.url).await {
                        Ok(SessionExit::ReceiverGone) => return,
                        Ok(SessionExit::Disconnect) => {
                            info!("RTM session ended, reconnecting");
                        }
                        Err(e) => {
                            if !self.emit(InboundEvent::ConnectionError { message: e.to_string() }).await {
                                return;
                            }
                        }
                    }
                }
            }

            info!(backoff_secs = backoff.as_secs(), "Reconnecting after backoff");
            tokio::time::sleep(backoff).await;
            backoff = (backoff * 2).min(MAX_BACKOFF);
        }
    }

    /// Returns false when the dispatcher has gone away
    async fn emit(&self, event: InboundEvent) -> bool {
        self.events.send(event).await.is_ok()
    }

    /// Read one socket session until it ends
    async fn pump(&mut self, url: &str) -> Result<SessionExit, BotError> {
        let (stream, _response) = connect_async(url)
            .await
            .map_err(|e| BotError::Network(format!("WebSocket connect failed: {}", e)))?;
        info!("RTM WebSocket connected");

        let (mut write, mut read) = stream.split();
        let mut keepalive = tokio::time::interval(PING_INTERVAL);
        keepalive.tick().await;

        loop {
            tokio::select! {
                frame = read.next() => {
                    let Some(frame) = frame else {
                        info!("WebSocket stream ended");
                        return Ok(SessionExit::Disconnect);
                    };
                    let frame = frame
                        .map_err(|e| BotError::Network(format!("WebSocket read error: {}", e)))?;

                    match frame {
                        WsMessage::Text(text) => match decode_frame(text.as_str()) {
                            RtmFrame::Event(event) => {
                                if !self.emit(event).await {
                                    return Ok(SessionExit::ReceiverGone);
                                }
                            }
                            RtmFrame::Goodbye => {
                                info!("Server sent goodbye");
                                return Ok(SessionExit::Disconnect);
                            }
                        },
                        WsMessage::Close(_) => {
                            info!("Received WebSocket close frame");
                            return Ok(SessionExit::Disconnect);
                        }
                        // tungstenite answers protocol pings itself
                        _ => {}
                    }
                }
                _ = keepalive.tick() => {
                    self.ping_id += 1;
                    let ping = serde_json::json!({ "id": self.ping_id, "type": "ping" });
                    write.send(WsMessage::Text(ping.to_string().into())).await
                        .map_err(|e| BotError::Network(format!("Ping send failed: {}", e)))?;
                }
            }
        }
    }
}
