//! Conversation memory persisted in a key-value engine.
//!
//! Each conversation is one engine-native list stored under
//! `{key_prefix}{conversation_id}`; every element is one JSON-encoded
//! [`Message`]. Appends push to the tail so reads return write order, and an
//! optional time-to-live is re-armed on every append.

pub mod codec;
pub mod engine;
pub mod error;
pub mod model;
pub mod repository;

/// Wire codec error type.
pub use codec::CodecError;
/// Key-value engine interface and bundled clients.
pub use engine::{InMemoryKvClient, KeyExpiry, KvClient};
#[cfg(feature = "redis-backend")]
pub use engine::RedisKvClient;
/// Memory and engine error types.
pub use error::{KvError, MemoryError};
/// Message record model.
pub use model::{Message, MessageKind, MessageType, Metadata, TIMESTAMP_KEY, ToolCall, ToolResponse};
/// Repository interface and key-value implementation.
pub use repository::{ChatMemoryRepository, KvChatMemoryRepository, KvChatMemoryRepositoryBuilder};
/// Parsed conversation expiry.
pub use mnemo_rs_config::TimeToLive;
