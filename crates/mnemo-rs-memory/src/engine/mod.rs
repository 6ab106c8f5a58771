//! Key-value engine interface consumed by the repository.

mod memory;
#[cfg(feature = "redis-backend")]
mod redis;

pub use memory::InMemoryKvClient;
#[cfg(feature = "redis-backend")]
pub use self::redis::RedisKvClient;

use crate::error::KvError;
use async_trait::async_trait;
use std::time::Duration;

/// Expiry state of a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyExpiry {
    /// The key does not exist (never written, deleted, or expired).
    Missing,
    /// The key exists and never expires.
    Persistent,
    /// The key expires after the remaining duration.
    ExpiresIn(Duration),
}

impl KeyExpiry {
    /// Map an engine TTL reply (`-2` missing, `-1` persistent, else seconds).
    pub fn from_engine_seconds(seconds: i64) -> Self {
        match seconds {
            -2 => KeyExpiry::Missing,
            value if value < 0 => KeyExpiry::Persistent,
            value => KeyExpiry::ExpiresIn(Duration::from_secs(value.unsigned_abs())),
        }
    }
}

#[async_trait]
/// List-capable key-value engine client.
///
/// Each call must be atomic for its single key.
pub trait KvClient: Send + Sync {
    /// Append values to the tail of the list at `key`, creating it if absent.
    async fn push_tail(&self, key: &str, values: &[String]) -> Result<(), KvError>;

    /// Read the whole list at `key`; a missing key reads as empty.
    async fn range_all(&self, key: &str) -> Result<Vec<String>, KvError>;

    /// Set or refresh the expiry of `key`. Returns false if the key is missing.
    async fn expire(&self, key: &str, seconds: u64) -> Result<bool, KvError>;

    /// Report the expiry state of `key`.
    async fn expiry(&self, key: &str) -> Result<KeyExpiry, KvError>;

    /// Enumerate live keys starting with `prefix`.
    async fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>, KvError>;

    /// Remove `key`. Returns false if it did not exist.
    async fn delete(&self, key: &str) -> Result<bool, KvError>;
}
