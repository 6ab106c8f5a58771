//! Message records persisted per conversation.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Metadata key holding the creation time assigned at write.
pub const TIMESTAMP_KEY: &str = "timestamp";

/// Free-form message metadata.
pub type Metadata = serde_json::Map<String, Value>;

/// Role tag of a message.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    /// System instructions.
    System,
    /// User-authored turn.
    User,
    /// Model-authored turn.
    Assistant,
    /// Tool execution results.
    Tool,
}

impl MessageType {
    /// Return the role as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageType::System => "system",
            MessageType::User => "user",
            MessageType::Assistant => "assistant",
            MessageType::Tool => "tool",
        }
    }
}

/// Tool invocation requested by the assistant.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    /// Raw arguments as produced by the model.
    pub arguments: String,
}

/// Result of a tool invocation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ToolResponse {
    /// Identifier of the tool call this answers.
    pub id: String,
    pub name: String,
    pub data: String,
}

/// Role-specific payload of a message.
#[derive(Debug, Clone, PartialEq)]
pub enum MessageKind {
    System { text: String },
    User { text: String },
    /// Text is absent when the turn only requests tools.
    Assistant {
        text: Option<String>,
        tool_calls: Vec<ToolCall>,
    },
    Tool { responses: Vec<ToolResponse> },
}

/// One chat turn.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub kind: MessageKind,
    pub metadata: Metadata,
}

impl Message {
    /// Wrap a payload with empty metadata.
    pub fn new(kind: MessageKind) -> Self {
        Self {
            kind,
            metadata: Metadata::new(),
        }
    }

    pub fn system(text: impl Into<String>) -> Self {
        Self::new(MessageKind::System { text: text.into() })
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new(MessageKind::User { text: text.into() })
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new(MessageKind::Assistant {
            text: Some(text.into()),
            tool_calls: Vec::new(),
        })
    }

    /// Assistant turn that only requests tool calls.
    pub fn assistant_tool_calls(tool_calls: Vec<ToolCall>) -> Self {
        Self::new(MessageKind::Assistant {
            text: None,
            tool_calls,
        })
    }

    pub fn tool(responses: Vec<ToolResponse>) -> Self {
        Self::new(MessageKind::Tool { responses })
    }

    /// Add a metadata entry.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Role tag of this message.
    pub fn message_type(&self) -> MessageType {
        match &self.kind {
            MessageKind::System { .. } => MessageType::System,
            MessageKind::User { .. } => MessageType::User,
            MessageKind::Assistant { .. } => MessageType::Assistant,
            MessageKind::Tool { .. } => MessageType::Tool,
        }
    }

    /// Plain text of this message, if the role carries any.
    pub fn text(&self) -> Option<&str> {
        match &self.kind {
            MessageKind::System { text } | MessageKind::User { text } => Some(text.as_str()),
            MessageKind::Assistant { text, .. } => text.as_deref(),
            MessageKind::Tool { .. } => None,
        }
    }

    /// Creation time recorded in metadata, if present and well formed.
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        let raw = self.metadata.get(TIMESTAMP_KEY)?.as_str()?;
        DateTime::parse_from_rfc3339(raw)
            .ok()
            .map(|parsed| parsed.with_timezone(&Utc))
    }

    /// Overwrite the creation timestamp.
    pub(crate) fn stamp(&mut self, at: DateTime<Utc>) {
        self.metadata.insert(
            TIMESTAMP_KEY.to_string(),
            Value::String(at.to_rfc3339_opts(SecondsFormat::Millis, true)),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::{Message, MessageType, TIMESTAMP_KEY, ToolCall, ToolResponse};
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn text_follows_role() {
        assert_eq!(Message::user("hi").text(), Some("hi"));
        assert_eq!(Message::system("rules").text(), Some("rules"));
        assert_eq!(Message::assistant("ok").text(), Some("ok"));
        let call = ToolCall {
            id: "call-1".to_string(),
            name: "search".to_string(),
            arguments: "{}".to_string(),
        };
        assert_eq!(Message::assistant_tool_calls(vec![call]).text(), None);
        let response = ToolResponse {
            id: "call-1".to_string(),
            name: "search".to_string(),
            data: "[]".to_string(),
        };
        let tool = Message::tool(vec![response]);
        assert_eq!(tool.text(), None);
        assert_eq!(tool.message_type(), MessageType::Tool);
    }

    #[test]
    fn stamp_overwrites_caller_timestamp() {
        let at = Utc.with_ymd_and_hms(2025, 3, 1, 12, 30, 0).unwrap();
        let mut message = Message::user("hi").with_metadata(TIMESTAMP_KEY, "yesterday");
        assert_eq!(message.timestamp(), None);

        message.stamp(at);
        assert_eq!(message.metadata[TIMESTAMP_KEY], json!("2025-03-01T12:30:00.000Z"));
        assert_eq!(message.timestamp(), Some(at));
    }

    #[test]
    fn message_type_strings() {
        assert_eq!(MessageType::Assistant.as_str(), "assistant");
        assert_eq!(
            serde_json::to_string(&MessageType::Tool).expect("serialize"),
            "\"tool\""
        );
    }
}
