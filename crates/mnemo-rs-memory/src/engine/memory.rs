//! Process-local list engine with key expiry.

use super::{KeyExpiry, KvClient};
use crate::error::KvError;
use async_trait::async_trait;
use log::{debug, info};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug)]
struct Entry {
    values: Vec<String>,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.is_none_or(|at| at > now)
    }
}

/// In-memory engine for development and tests.
///
/// Expired keys are dropped lazily on the next access. Time comes from
/// `tokio::time`, so a paused test runtime controls expiry.
#[derive(Debug, Clone, Default)]
pub struct InMemoryKvClient {
    entries: Arc<RwLock<HashMap<String, Entry>>>,
}

impl InMemoryKvClient {
    /// Create an empty engine.
    pub fn new() -> Self {
        info!("initialized in-memory key-value engine");
        Self::default()
    }
}

#[async_trait]
impl KvClient for InMemoryKvClient {
    async fn push_tail(&self, key: &str, values: &[String]) -> Result<(), KvError> {
        if values.is_empty() {
            return Ok(());
        }
        let now = Instant::now();
        let mut entries = self.entries.write();
        if entries.get(key).is_some_and(|entry| !entry.is_live(now)) {
            entries.remove(key);
        }
        let entry = entries.entry(key.to_string()).or_insert_with(|| Entry {
            values: Vec::new(),
            expires_at: None,
        });
        entry.values.extend_from_slice(values);
        debug!(
            "pushed list values (key={}, pushed={}, len={})",
            key,
            values.len(),
            entry.values.len()
        );
        Ok(())
    }

    async fn range_all(&self, key: &str) -> Result<Vec<String>, KvError> {
        let now = Instant::now();
        let entries = self.entries.read();
        Ok(entries
            .get(key)
            .filter(|entry| entry.is_live(now))
            .map(|entry| entry.values.clone())
            .unwrap_or_default())
    }

    async fn expire(&self, key: &str, seconds: u64) -> Result<bool, KvError> {
        let now = Instant::now();
        let mut entries = self.entries.write();
        match entries.get_mut(key) {
            Some(entry) if entry.is_live(now) => {
                entry.expires_at = Some(now + Duration::from_secs(seconds));
                Ok(true)
            }
            Some(_) => {
                entries.remove(key);
                Ok(false)
            }
            None => Ok(false),
        }
    }

    async fn expiry(&self, key: &str) -> Result<KeyExpiry, KvError> {
        let now = Instant::now();
        let entries = self.entries.read();
        let expiry = match entries.get(key) {
            Some(entry) if entry.is_live(now) => match entry.expires_at {
                Some(at) => KeyExpiry::ExpiresIn(at - now),
                None => KeyExpiry::Persistent,
            },
            _ => KeyExpiry::Missing,
        };
        Ok(expiry)
    }

    async fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>, KvError> {
        let now = Instant::now();
        let mut entries = self.entries.write();
        entries.retain(|_, entry| entry.is_live(now));
        Ok(entries
            .keys()
            .filter(|key| key.starts_with(prefix))
            .cloned()
            .collect())
    }

    async fn delete(&self, key: &str) -> Result<bool, KvError> {
        let now = Instant::now();
        let removed = self.entries.write().remove(key);
        Ok(removed.is_some_and(|entry| entry.is_live(now)))
    }
}

#[cfg(test)]
mod tests {
    use super::InMemoryKvClient;
    use crate::engine::{KeyExpiry, KvClient};
    use pretty_assertions::assert_eq;
    use std::time::Duration;

    fn values(items: &[&str]) -> Vec<String> {
        items.iter().map(|item| item.to_string()).collect()
    }

    #[tokio::test]
    async fn push_appends_in_order() {
        let kv = InMemoryKvClient::new();
        kv.push_tail("list", &values(&["a", "b"])).await.expect("push");
        kv.push_tail("list", &values(&["c"])).await.expect("push");
        assert_eq!(
            kv.range_all("list").await.expect("range"),
            values(&["a", "b", "c"])
        );
        assert_eq!(kv.range_all("other").await.expect("range"), Vec::<String>::new());
    }

    #[tokio::test]
    async fn empty_push_does_not_create_key() {
        let kv = InMemoryKvClient::new();
        kv.push_tail("list", &[]).await.expect("push");
        assert_eq!(kv.expiry("list").await.expect("expiry"), KeyExpiry::Missing);
    }

    #[tokio::test(start_paused = true)]
    async fn expired_keys_disappear() {
        let kv = InMemoryKvClient::new();
        kv.push_tail("chat:a", &values(&["x"])).await.expect("push");
        kv.push_tail("chat:b", &values(&["y"])).await.expect("push");
        assert!(kv.expire("chat:a", 10).await.expect("expire"));
        assert_eq!(
            kv.expiry("chat:a").await.expect("expiry"),
            KeyExpiry::ExpiresIn(Duration::from_secs(10))
        );
        assert_eq!(
            kv.expiry("chat:b").await.expect("expiry"),
            KeyExpiry::Persistent
        );

        tokio::time::advance(Duration::from_secs(11)).await;

        assert_eq!(kv.expiry("chat:a").await.expect("expiry"), KeyExpiry::Missing);
        assert!(kv.range_all("chat:a").await.expect("range").is_empty());
        assert_eq!(
            kv.keys_with_prefix("chat:").await.expect("keys"),
            values(&["chat:b"])
        );
        assert!(!kv.delete("chat:a").await.expect("delete"));
    }

    #[tokio::test(start_paused = true)]
    async fn push_after_expiry_starts_a_fresh_list() {
        let kv = InMemoryKvClient::new();
        kv.push_tail("list", &values(&["old"])).await.expect("push");
        kv.expire("list", 1).await.expect("expire");
        tokio::time::advance(Duration::from_secs(2)).await;

        kv.push_tail("list", &values(&["new"])).await.expect("push");
        assert_eq!(kv.range_all("list").await.expect("range"), values(&["new"]));
        assert_eq!(kv.expiry("list").await.expect("expiry"), KeyExpiry::Persistent);
    }

    #[tokio::test]
    async fn expire_and_delete_report_missing_keys() {
        let kv = InMemoryKvClient::new();
        assert!(!kv.expire("absent", 5).await.expect("expire"));
        assert!(!kv.delete("absent").await.expect("delete"));
        kv.push_tail("present", &values(&["v"])).await.expect("push");
        assert!(kv.delete("present").await.expect("delete"));
    }

    #[test]
    fn engine_ttl_replies_map_to_expiry() {
        assert_eq!(KeyExpiry::from_engine_seconds(-2), KeyExpiry::Missing);
        assert_eq!(KeyExpiry::from_engine_seconds(-1), KeyExpiry::Persistent);
        assert_eq!(
            KeyExpiry::from_engine_seconds(1800),
            KeyExpiry::ExpiresIn(Duration::from_secs(1800))
        );
    }
}
