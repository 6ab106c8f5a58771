//! JSON wire format for stored messages.
//!
//! Each list element is one object:
//! `{"message_type":"user","text":"hi","metadata":{"timestamp":"..."}}`.
//! Assistant entries may add `tool_calls`, tool entries carry `responses`
//! and no `text`.

use crate::model::{Message, MessageKind, MessageType, Metadata, ToolCall, ToolResponse};
use serde::{Deserialize, Serialize};

/// Errors raised while encoding or decoding a stored message.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// Invalid JSON or an unknown message type.
    #[error("invalid message json: {0}")]
    Json(#[from] serde_json::Error),
    /// A role that requires text was stored without it.
    #[error("{0} message is missing its text")]
    MissingText(&'static str),
}

#[derive(Debug, Serialize, Deserialize)]
struct WireMessage {
    message_type: MessageType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(default)]
    metadata: Metadata,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    tool_calls: Vec<ToolCall>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    responses: Vec<ToolResponse>,
}

/// Encode a message into its stored form.
pub fn encode(message: &Message) -> Result<String, CodecError> {
    let mut wire = WireMessage {
        message_type: message.message_type(),
        text: None,
        metadata: message.metadata.clone(),
        tool_calls: Vec::new(),
        responses: Vec::new(),
    };
    match &message.kind {
        MessageKind::System { text } | MessageKind::User { text } => {
            wire.text = Some(text.clone());
        }
        MessageKind::Assistant { text, tool_calls } => {
            wire.text = text.clone();
            wire.tool_calls = tool_calls.clone();
        }
        MessageKind::Tool { responses } => {
            wire.responses = responses.clone();
        }
    }
    Ok(serde_json::to_string(&wire)?)
}

/// Decode a stored entry back into a message.
pub fn decode(raw: &str) -> Result<Message, CodecError> {
    let wire: WireMessage = serde_json::from_str(raw)?;
    let kind = match wire.message_type {
        MessageType::System => MessageKind::System {
            text: wire.text.ok_or(CodecError::MissingText("system"))?,
        },
        MessageType::User => MessageKind::User {
            text: wire.text.ok_or(CodecError::MissingText("user"))?,
        },
        MessageType::Assistant => MessageKind::Assistant {
            text: wire.text,
            tool_calls: wire.tool_calls,
        },
        MessageType::Tool => MessageKind::Tool {
            responses: wire.responses,
        },
    };
    Ok(Message {
        kind,
        metadata: wire.metadata,
    })
}
