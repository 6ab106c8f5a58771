//! Redis-backed engine client.

use super::{KeyExpiry, KvClient};
use crate::error::KvError;
use async_trait::async_trait;
use log::{debug, info};
use redis::AsyncCommands;
use redis::aio::ConnectionManager;

/// Keys fetched per SCAN round trip.
const SCAN_BATCH: usize = 256;

/// Engine client speaking to a Redis server through a shared connection manager.
///
/// Cloning is cheap; clones share the underlying multiplexed connection.
#[derive(Clone)]
pub struct RedisKvClient {
    connection: ConnectionManager,
}

impl RedisKvClient {
    /// Connect to the server at `url` (for example `redis://127.0.0.1:6379/`).
    pub async fn connect(url: &str) -> Result<Self, KvError> {
        let client = redis::Client::open(url)?;
        let connection = ConnectionManager::new(client).await?;
        info!("connected redis key-value engine");
        Ok(Self { connection })
    }

    /// Wrap an existing connection manager.
    pub fn from_connection(connection: ConnectionManager) -> Self {
        Self { connection }
    }
}

#[async_trait]
impl KvClient for RedisKvClient {
    async fn push_tail(&self, key: &str, values: &[String]) -> Result<(), KvError> {
        if values.is_empty() {
            return Ok(());
        }
        let mut connection = self.connection.clone();
        let len: usize = connection.rpush(key, values).await?;
        debug!("rpush (key={}, pushed={}, len={})", key, values.len(), len);
        Ok(())
    }

    async fn range_all(&self, key: &str) -> Result<Vec<String>, KvError> {
        let mut connection = self.connection.clone();
        Ok(connection.lrange(key, 0, -1).await?)
    }

    async fn expire(&self, key: &str, seconds: u64) -> Result<bool, KvError> {
        let seconds = i64::try_from(seconds)
            .map_err(|_| KvError::Backend(format!("expiry out of range: {seconds}s")))?;
        let mut connection = self.connection.clone();
        Ok(connection.expire(key, seconds).await?)
    }

    async fn expiry(&self, key: &str) -> Result<KeyExpiry, KvError> {
        let mut connection = self.connection.clone();
        let seconds: i64 = connection.ttl(key).await?;
        Ok(KeyExpiry::from_engine_seconds(seconds))
    }

    async fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>, KvError> {
        let pattern = format!("{}*", escape_glob(prefix));
        let mut connection = self.connection.clone();
        let mut cursor: u64 = 0;
        let mut keys = Vec::new();
        loop {
            let (next, batch): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(&pattern)
                .arg("COUNT")
                .arg(SCAN_BATCH)
                .query_async(&mut connection)
                .await?;
            keys.extend(batch);
            if next == 0 {
                break;
            }
            cursor = next;
        }
        debug!("scan (pattern={}, matched={})", pattern, keys.len());
        Ok(keys)
    }

    async fn delete(&self, key: &str) -> Result<bool, KvError> {
        let mut connection = self.connection.clone();
        let removed: usize = connection.del(key).await?;
        Ok(removed > 0)
    }
}

/// Escape Redis glob metacharacters so the prefix matches literally.
fn escape_glob(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        if matches!(ch, '*' | '?' | '[' | ']' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::escape_glob;
    use pretty_assertions::assert_eq;

    #[test]
    fn escapes_glob_metacharacters() {
        assert_eq!(escape_glob("chat:"), "chat:");
        assert_eq!(escape_glob("a*b?[c]\\"), "a\\*b\\?\\[c\\]\\\\");
    }
}
