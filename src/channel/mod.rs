//! Duplex channel between the editor and the local agent.
//!
//! The session never talks to a socket directly: it consumes [`ChannelEvent`]s
//! and emits through a [`ChannelSender`]. The WebSocket transport in
//! [`websocket`] feeds both ends; tests can drive them in memory.

pub mod protocol;
pub mod websocket;

pub use protocol::{
    FileDeletePayload, InboundMessage, OutboundMessage, SyncSinglePayload, FILE_DELETE,
    SYNC_ALL_REQUEST, SYNC_ALL_RESPONSE, SYNC_SINGLE,
};
pub use websocket::{ServerConfig, SyncServer};

use crate::error::SyncError;
use crate::types::SyncAction;
use tokio::sync::mpsc;

/// Outbound queue depth per connection.
pub const OUTBOUND_CAPACITY: usize = 256;

/// Connection lifecycle and inbound traffic, in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelEvent {
    Connected,
    Message(InboundMessage),
    Disconnected,
}

/// Sending half of the channel, cheap to clone into per-file tasks.
#[derive(Debug, Clone)]
pub struct ChannelSender {
    tx: mpsc::Sender<OutboundMessage>,
}

impl ChannelSender {
    pub fn new(tx: mpsc::Sender<OutboundMessage>) -> Self {
        Self { tx }
    }

    /// In-memory channel pair.
    pub fn pair(capacity: usize) -> (Self, mpsc::Receiver<OutboundMessage>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self::new(tx), rx)
    }

    pub async fn emit(&self, message: OutboundMessage) -> Result<(), SyncError> {
        self.tx
            .send(message)
            .await
            .map_err(|_| SyncError::Channel("connection closed".to_string()))
    }

    pub async fn emit_action(&self, action: SyncAction) -> Result<(), SyncError> {
        self.emit(action.into()).await
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}
