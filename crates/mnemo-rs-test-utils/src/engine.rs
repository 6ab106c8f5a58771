use async_trait::async_trait;
use mnemo_rs_memory::{InMemoryKvClient, KeyExpiry, KvClient, KvError};
use parking_lot::Mutex;
use std::sync::Arc;

/// Engine client whose every call fails with a connection error.
#[derive(Clone, Debug)]
pub struct FailingKvClient {
    message: String,
}

impl FailingKvClient {
    pub fn new() -> Self {
        Self::with_message("engine unavailable")
    }

    pub fn with_message(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    fn error(&self) -> KvError {
        KvError::Connection(self.message.clone())
    }
}

impl Default for FailingKvClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl KvClient for FailingKvClient {
    async fn push_tail(&self, _key: &str, _values: &[String]) -> Result<(), KvError> {
        Err(self.error())
    }

    async fn range_all(&self, _key: &str) -> Result<Vec<String>, KvError> {
        Err(self.error())
    }

    async fn expire(&self, _key: &str, _seconds: u64) -> Result<bool, KvError> {
        Err(self.error())
    }

    async fn expiry(&self, _key: &str) -> Result<KeyExpiry, KvError> {
        Err(self.error())
    }

    async fn keys_with_prefix(&self, _prefix: &str) -> Result<Vec<String>, KvError> {
        Err(self.error())
    }

    async fn delete(&self, _key: &str) -> Result<bool, KvError> {
        Err(self.error())
    }
}

/// A single engine call observed by [`RecordingKvClient`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum KvCall {
    PushTail { key: String, count: usize },
    RangeAll { key: String },
    Expire { key: String, seconds: u64 },
    Expiry { key: String },
    KeysWithPrefix { prefix: String },
    Delete { key: String },
}

/// In-memory engine that records every call before delegating.
#[derive(Clone, Debug, Default)]
pub struct RecordingKvClient {
    inner: InMemoryKvClient,
    calls: Arc<Mutex<Vec<KvCall>>>,
}

impl RecordingKvClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<KvCall> {
        self.calls.lock().clone()
    }

    pub fn clear(&self) {
        self.calls.lock().clear();
    }

    fn record(&self, call: KvCall) {
        self.calls.lock().push(call);
    }
}

#[async_trait]
impl KvClient for RecordingKvClient {
    async fn push_tail(&self, key: &str, values: &[String]) -> Result<(), KvError> {
        self.record(KvCall::PushTail {
            key: key.to_string(),
            count: values.len(),
        });
        self.inner.push_tail(key, values).await
    }

    async fn range_all(&self, key: &str) -> Result<Vec<String>, KvError> {
        self.record(KvCall::RangeAll {
            key: key.to_string(),
        });
        self.inner.range_all(key).await
    }

    async fn expire(&self, key: &str, seconds: u64) -> Result<bool, KvError> {
        self.record(KvCall::Expire {
            key: key.to_string(),
            seconds,
        });
        self.inner.expire(key, seconds).await
    }

    async fn expiry(&self, key: &str) -> Result<KeyExpiry, KvError> {
        self.record(KvCall::Expiry {
            key: key.to_string(),
        });
        self.inner.expiry(key).await
    }

    async fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>, KvError> {
        self.record(KvCall::KeysWithPrefix {
            prefix: prefix.to_string(),
        });
        self.inner.keys_with_prefix(prefix).await
    }

    async fn delete(&self, key: &str) -> Result<bool, KvError> {
        self.record(KvCall::Delete {
            key: key.to_string(),
        });
        self.inner.delete(key).await
    }
}
