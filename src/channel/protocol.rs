//! Wire protocol between the editor and the local agent.
//!
//! Every frame is a JSON object `{"event": <name>, "data": <payload>}`. Event
//! names are part of the contract with the editor and must not change.

use crate::error::SyncError;
use crate::types::{RemoteNode, SyncAction};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const SYNC_ALL_REQUEST: &str = "codesync:ide:syncAllRequest";
pub const SYNC_ALL_RESPONSE: &str = "codesync:wcode:syncAllResponse";
pub const SYNC_SINGLE: &str = "codesync:ide:syncSingle";
pub const FILE_DELETE: &str = "codesync:ide:fileDelete";

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Envelope {
    event: String,
    #[serde(default)]
    data: Value,
}

/// Payload of `codesync:ide:syncSingle`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncSinglePayload {
    pub file_relative_path: String,
    pub file_content: String,
}

/// Payload of `codesync:ide:fileDelete`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileDeletePayload {
    pub file_relative_path: String,
}

/// Messages the agent sends to the editor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundMessage {
    SyncAllRequest,
    SyncSingle(SyncSinglePayload),
    FileDelete(FileDeletePayload),
}

impl OutboundMessage {
    pub fn event_name(&self) -> &'static str {
        match self {
            OutboundMessage::SyncAllRequest => SYNC_ALL_REQUEST,
            OutboundMessage::SyncSingle(_) => SYNC_SINGLE,
            OutboundMessage::FileDelete(_) => FILE_DELETE,
        }
    }

    pub fn encode(&self) -> Result<String, SyncError> {
        let data = match self {
            OutboundMessage::SyncAllRequest => Value::Null,
            OutboundMessage::SyncSingle(payload) => serde_json::to_value(payload)?,
            OutboundMessage::FileDelete(payload) => serde_json::to_value(payload)?,
        };
        Ok(serde_json::to_string(&Envelope {
            event: self.event_name().to_string(),
            data,
        })?)
    }
}

impl From<SyncAction> for OutboundMessage {
    fn from(action: SyncAction) -> Self {
        match action {
            SyncAction::Changed { path, content } | SyncAction::Added { path, content } => {
                OutboundMessage::SyncSingle(SyncSinglePayload {
                    file_relative_path: path,
                    file_content: content,
                })
            }
            SyncAction::Deleted { path } => OutboundMessage::FileDelete(FileDeletePayload {
                file_relative_path: path,
            }),
        }
    }
}

/// Messages the editor sends to the agent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundMessage {
    SyncAllResponse(Vec<RemoteNode>),
    /// Any event this agent does not handle.
    Unknown(String),
}

impl InboundMessage {
    pub fn decode(frame: &str) -> Result<Self, SyncError> {
        let envelope: Envelope = serde_json::from_str(frame)?;
        match envelope.event.as_str() {
            SYNC_ALL_RESPONSE => {
                let nodes = if envelope.data.is_null() {
                    Vec::new()
                } else {
                    let values: Vec<Value> = serde_json::from_value(envelope.data)?;
                    RemoteNode::decode_each(values)
                };
                Ok(InboundMessage::SyncAllResponse(nodes))
            }
            _ => Ok(InboundMessage::Unknown(envelope.event)),
        }
    }

    /// Encode as the editor would; used by test clients.
    pub fn encode(&self) -> Result<String, SyncError> {
        let (event, data) = match self {
            InboundMessage::SyncAllResponse(nodes) => {
                (SYNC_ALL_RESPONSE.to_string(), serde_json::to_value(nodes)?)
            }
            InboundMessage::Unknown(event) => (event.clone(), Value::Null),
        };
        Ok(serde_json::to_string(&Envelope { event, data })?)
    }
}

/// Decode an outbound frame; used by test clients standing in for the editor.
pub fn decode_outbound(frame: &str) -> Result<OutboundMessage, SyncError> {
    let envelope: Envelope = serde_json::from_str(frame)?;
    match envelope.event.as_str() {
        SYNC_ALL_REQUEST => Ok(OutboundMessage::SyncAllRequest),
        SYNC_SINGLE => Ok(OutboundMessage::SyncSingle(serde_json::from_value(
            envelope.data,
        )?)),
        FILE_DELETE => Ok(OutboundMessage::FileDelete(serde_json::from_value(
            envelope.data,
        )?)),
        other => Err(SyncError::Channel(format!("unexpected event {}", other))),
    }
}
