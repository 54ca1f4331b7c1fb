//! WebSocket transport for the sync channel.
//!
//! One listener, one live connection. Each accepted socket gets its own
//! [`SyncSession`]; a newer connection supersedes the previous one.

use super::{ChannelEvent, ChannelSender, InboundMessage, OUTBOUND_CAPACITY};
use crate::error::SyncError;
use crate::session::{SessionConfig, SyncSession};
use crate::transform::TransformPipeline;
use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, error, info, warn};

/// Listener settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Bind attempts before giving up.
    #[serde(default = "default_bind_attempts")]
    pub bind_attempts: u32,

    #[serde(default = "default_bind_retry_delay_ms")]
    pub bind_retry_delay_ms: u64,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8001
}

fn default_bind_attempts() -> u32 {
    5
}

fn default_bind_retry_delay_ms() -> u64 {
    500
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            bind_attempts: default_bind_attempts(),
            bind_retry_delay_ms: default_bind_retry_delay_ms(),
        }
    }
}

impl ServerConfig {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Accepts editor connections and runs a session for the latest one.
pub struct SyncServer {
    listener: TcpListener,
    session: SessionConfig,
    pipeline: TransformPipeline,
}

impl SyncServer {
    /// Bind the listener, retrying with a fixed delay.
    pub async fn bind(
        config: &ServerConfig,
        session: SessionConfig,
        pipeline: TransformPipeline,
    ) -> Result<Self, SyncError> {
        let listener = bind_with_retry(config).await?;
        Ok(Self {
            listener,
            session,
            pipeline,
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, SyncError> {
        self.listener
            .local_addr()
            .map_err(|e| SyncError::Channel(format!("listener has no address: {}", e)))
    }

    /// Accept connections until the listener fails.
    pub async fn serve(self) -> Result<(), SyncError> {
        let mut current: Option<JoinHandle<()>> = None;

        loop {
            let (stream, peer) = self
                .listener
                .accept()
                .await
                .map_err(|e| SyncError::Channel(format!("accept failed: {}", e)))?;

            if let Some(previous) = current.take() {
                if !previous.is_finished() {
                    info!(peer = %peer, "New connection supersedes the active one");
                }
                previous.abort();
            }

            let session = self.session.clone();
            let pipeline = self.pipeline.clone();
            current = Some(tokio::spawn(async move {
                if let Err(e) = handle_connection(stream, peer, session, pipeline).await {
                    warn!(peer = %peer, error = %e, "Connection ended with error");
                }
            }));
        }
    }
}

async fn bind_with_retry(config: &ServerConfig) -> Result<TcpListener, SyncError> {
    let address = config.address();
    let attempts = config.bind_attempts.max(1);
    let delay = Duration::from_millis(config.bind_retry_delay_ms);

    let mut last_error = None;
    for attempt in 1..=attempts {
        match TcpListener::bind(&address).await {
            Ok(listener) => {
                info!(address = %address, "Listening for editor connections");
                return Ok(listener);
            }
            Err(e) => {
                warn!(address = %address, attempt, error = %e, "Bind failed");
                last_error = Some(e);
                if attempt < attempts {
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    let reason = last_error
        .map(|e| e.to_string())
        .unwrap_or_else(|| "no attempts made".to_string());
    Err(SyncError::Channel(format!(
        "could not bind {} after {} attempts: {}",
        address, attempts, reason
    )))
}

/// Run one WebSocket connection: pump frames both ways while a session task
/// consumes the inbound events.
async fn handle_connection(
    stream: TcpStream,
    peer: SocketAddr,
    session_config: SessionConfig,
    pipeline: TransformPipeline,
) -> Result<(), SyncError> {
    let socket = tokio_tungstenite::accept_async(stream)
        .await
        .map_err(|e| SyncError::Channel(format!("handshake with {} failed: {}", peer, e)))?;
    info!(peer = %peer, "Editor connected");

    let (mut sink, mut source) = socket.split();
    let (events_tx, events_rx) = mpsc::channel::<ChannelEvent>(OUTBOUND_CAPACITY);
    let (outbound, mut outbound_rx) = ChannelSender::pair(OUTBOUND_CAPACITY);

    let session_task = tokio::spawn(async move {
        let mut session = SyncSession::with_pipeline(session_config, pipeline);
        if let Err(e) = session.run(events_rx, outbound).await {
            warn!(error = %e, "Session stopped");
        }
    });

    // Buffer has room; the session has not consumed anything yet.
    let _ = events_tx.send(ChannelEvent::Connected).await;

    loop {
        tokio::select! {
            Some(message) = outbound_rx.recv() => {
                let frame = match message.encode() {
                    Ok(frame) => frame,
                    Err(e) => {
                        warn!(event = message.event_name(), error = %e, "Dropping unencodable message");
                        continue;
                    }
                };
                if let Err(e) = sink.send(Message::Text(frame)).await {
                    debug!(peer = %peer, "Failed to send frame: {}", e);
                    break;
                }
            }

            frame = source.next() => {
                match frame {
                    Some(Ok(Message::Text(text))) => match InboundMessage::decode(&text) {
                        Ok(message) => {
                            if events_tx.send(ChannelEvent::Message(message)).await.is_err() {
                                break;
                            }
                        }
                        Err(e) => warn!(peer = %peer, error = %e, "Malformed frame"),
                    },
                    Some(Ok(Message::Ping(payload))) => {
                        if let Err(e) = sink.send(Message::Pong(payload)).await {
                            debug!(peer = %peer, "Failed to send pong: {}", e);
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) => {
                        info!(peer = %peer, "Editor closed the connection");
                        break;
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        error!(peer = %peer, "WebSocket error: {}", e);
                        break;
                    }
                    None => {
                        info!(peer = %peer, "WebSocket stream ended");
                        break;
                    }
                }
            }
        }
    }

    let _ = events_tx.send(ChannelEvent::Disconnected).await;
    drop(events_tx);
    if let Err(e) = session_task.await {
        warn!(error = %e, "Session task failed");
    }
    info!(peer = %peer, "Editor disconnected");
    Ok(())
}
