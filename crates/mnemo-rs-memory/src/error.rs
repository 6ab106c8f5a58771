//! Error types for conversation memory operations.

use crate::codec::CodecError;
use mnemo_rs_config::ConfigError;

/// Errors returned by key-value engine clients.
#[derive(Debug, thiserror::Error)]
pub enum KvError {
    /// The engine could not be reached.
    #[error("connection error: {0}")]
    Connection(String),
    /// The engine rejected or failed a command.
    #[error("engine error: {0}")]
    Backend(String),
    /// Redis client error.
    #[cfg(feature = "redis-backend")]
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),
}

/// Errors returned by conversation repositories.
#[derive(Debug, thiserror::Error)]
pub enum MemoryError {
    /// The repository was built without a key-value client.
    #[error("a key-value client is required to build the repository")]
    MissingClient,
    /// The configured engine is not available in this build.
    #[error("unsupported engine: {0}")]
    UnsupportedEngine(String),
    /// Engine I/O or protocol failure.
    #[error("engine error: {0}")]
    Engine(#[from] KvError),
    /// A message could not be encoded for storage.
    #[error("failed to encode message {index} for conversation {conversation_id}: {source}")]
    Encode {
        conversation_id: String,
        index: usize,
        #[source]
        source: CodecError,
    },
    /// A stored entry could not be decoded.
    #[error("failed to decode entry {index} of conversation {conversation_id}: {source}")]
    Decode {
        conversation_id: String,
        index: usize,
        #[source]
        source: CodecError,
    },
    /// Repository configuration was invalid.
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
}
