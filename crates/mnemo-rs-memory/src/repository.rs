//! Conversation repository over a key-value engine.

use crate::codec;
use crate::engine::{KeyExpiry, KvClient};
use crate::error::MemoryError;
use crate::model::Message;
use async_trait::async_trait;
use chrono::Utc;
use log::{debug, info};
use mnemo_rs_config::{DEFAULT_KEY_PREFIX, RepositoryConfig, TimeToLive};
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

#[async_trait]
/// Persistence contract used by conversation memory.
///
/// Window sizing, truncation and prompt assembly are the caller's concern;
/// a repository only stores and returns messages.
pub trait ChatMemoryRepository: Send + Sync {
    /// Identifiers of all live conversations.
    async fn find_conversation_ids(&self) -> Result<BTreeSet<String>, MemoryError>;

    /// Full history of a conversation in write order; empty if unknown.
    async fn find_by_conversation_id(
        &self,
        conversation_id: &str,
    ) -> Result<Vec<Message>, MemoryError>;

    /// Append messages to a conversation, preserving their order.
    async fn append_messages(
        &self,
        conversation_id: &str,
        messages: &[Message],
    ) -> Result<(), MemoryError>;

    /// Remove a conversation. Unknown conversations are ignored.
    async fn delete_by_conversation_id(&self, conversation_id: &str) -> Result<(), MemoryError>;
}

/// Repository storing each conversation as one engine list.
///
/// Configuration is fixed at build time; build a new repository to change it.
#[derive(Clone)]
pub struct KvChatMemoryRepository {
    client: Arc<dyn KvClient>,
    key_prefix: String,
    time_to_live: TimeToLive,
}

impl KvChatMemoryRepository {
    /// Start a builder with the default prefix and no expiry.
    pub fn builder() -> KvChatMemoryRepositoryBuilder {
        KvChatMemoryRepositoryBuilder::new()
    }

    /// Prefix prepended to every conversation key.
    pub fn key_prefix(&self) -> &str {
        &self.key_prefix
    }

    /// Expiry re-armed after each append.
    pub fn time_to_live(&self) -> TimeToLive {
        self.time_to_live
    }

    /// Engine client handle.
    pub fn client(&self) -> &Arc<dyn KvClient> {
        &self.client
    }

    /// Storage key of a conversation.
    pub fn conversation_key(&self, conversation_id: &str) -> String {
        format!("{}{}", self.key_prefix, conversation_id)
    }

    /// Current expiry state of a conversation's key.
    pub async fn conversation_expiry(
        &self,
        conversation_id: &str,
    ) -> Result<KeyExpiry, MemoryError> {
        let key = self.conversation_key(conversation_id);
        Ok(self.client.expiry(&key).await?)
    }
}

impl fmt::Debug for KvChatMemoryRepository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KvChatMemoryRepository")
            .field("key_prefix", &self.key_prefix)
            .field("time_to_live", &self.time_to_live)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl ChatMemoryRepository for KvChatMemoryRepository {
    async fn find_conversation_ids(&self) -> Result<BTreeSet<String>, MemoryError> {
        let keys = self.client.keys_with_prefix(&self.key_prefix).await?;
        let ids: BTreeSet<String> = keys
            .iter()
            .filter_map(|key| key.strip_prefix(self.key_prefix.as_str()))
            .map(str::to_string)
            .collect();
        debug!(
            "listed conversations (prefix={}, count={})",
            self.key_prefix,
            ids.len()
        );
        Ok(ids)
    }

    async fn find_by_conversation_id(
        &self,
        conversation_id: &str,
    ) -> Result<Vec<Message>, MemoryError> {
        let key = self.conversation_key(conversation_id);
        let entries = self.client.range_all(&key).await?;
        let messages = entries
            .iter()
            .enumerate()
            .map(|(index, raw)| {
                codec::decode(raw).map_err(|source| MemoryError::Decode {
                    conversation_id: conversation_id.to_string(),
                    index,
                    source,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        debug!(
            "loaded conversation (conversation_id={}, messages={})",
            conversation_id,
            messages.len()
        );
        Ok(messages)
    }

    async fn append_messages(
        &self,
        conversation_id: &str,
        messages: &[Message],
    ) -> Result<(), MemoryError> {
        if messages.is_empty() {
            return Ok(());
        }

        let mut encoded = Vec::with_capacity(messages.len());
        for (index, message) in messages.iter().enumerate() {
            let mut message = message.clone();
            message.stamp(Utc::now());
            let raw = codec::encode(&message).map_err(|source| MemoryError::Encode {
                conversation_id: conversation_id.to_string(),
                index,
                source,
            })?;
            encoded.push(raw);
        }

        let key = self.conversation_key(conversation_id);
        self.client.push_tail(&key, &encoded).await?;
        if let TimeToLive::Seconds(seconds) = self.time_to_live {
            self.client.expire(&key, seconds).await?;
        }
        debug!(
            "appended messages (conversation_id={}, count={}, ttl={})",
            conversation_id,
            encoded.len(),
            self.time_to_live
        );
        Ok(())
    }

    async fn delete_by_conversation_id(&self, conversation_id: &str) -> Result<(), MemoryError> {
        let key = self.conversation_key(conversation_id);
        let removed = self.client.delete(&key).await?;
        debug!(
            "deleted conversation (conversation_id={}, existed={})",
            conversation_id, removed
        );
        Ok(())
    }
}

/// Builder for [`KvChatMemoryRepository`].
#[derive(Clone)]
pub struct KvChatMemoryRepositoryBuilder {
    key_prefix: String,
    time_to_live: TimeToLive,
    client: Option<Arc<dyn KvClient>>,
}

impl KvChatMemoryRepositoryBuilder {
    /// Create a builder seeded with defaults.
    pub fn new() -> Self {
        Self {
            key_prefix: DEFAULT_KEY_PREFIX.to_string(),
            time_to_live: TimeToLive::Never,
            client: None,
        }
    }

    /// Seed prefix and expiry from repository config.
    pub fn from_config(config: &RepositoryConfig) -> Result<Self, MemoryError> {
        Ok(Self::new()
            .key_prefix(config.key_prefix.clone())
            .time_to_live(config.resolve_time_to_live()?))
    }

    /// Set the key prefix.
    pub fn key_prefix(mut self, key_prefix: impl Into<String>) -> Self {
        self.key_prefix = key_prefix.into();
        self
    }

    /// Set the expiry, either parsed or as a token such as `"30m"`.
    pub fn time_to_live(mut self, time_to_live: impl Into<TimeToLive>) -> Self {
        self.time_to_live = time_to_live.into();
        self
    }

    /// Set the engine client.
    pub fn client(mut self, client: Arc<dyn KvClient>) -> Self {
        self.client = Some(client);
        self
    }

    /// Build the repository; fails without a client or with an expiry the
    /// engine cannot arm.
    pub fn build(self) -> Result<KvChatMemoryRepository, MemoryError> {
        let client = self.client.ok_or(MemoryError::MissingClient)?;
        self.time_to_live.validate()?;
        info!(
            "initialized key-value chat memory repository (prefix={}, ttl={})",
            self.key_prefix, self.time_to_live
        );
        Ok(KvChatMemoryRepository {
            client,
            key_prefix: self.key_prefix,
            time_to_live: self.time_to_live,
        })
    }
}

impl fmt::Debug for KvChatMemoryRepositoryBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KvChatMemoryRepositoryBuilder")
            .field("key_prefix", &self.key_prefix)
            .field("time_to_live", &self.time_to_live)
            .field("has_client", &self.client.is_some())
            .finish()
    }
}

impl Default for KvChatMemoryRepositoryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::{ChatMemoryRepository, KvChatMemoryRepository};
    use crate::engine::{InMemoryKvClient, KeyExpiry, KvClient};
    use crate::error::MemoryError;
    use crate::model::{Message, MessageType};
    use mnemo_rs_config::{ConfigError, DEFAULT_KEY_PREFIX, RepositoryConfig, TimeToLive};
    use pretty_assertions::assert_eq;
    use std::sync::Arc;
    use std::time::Duration;

    fn repository(ttl: &str) -> (Arc<InMemoryKvClient>, KvChatMemoryRepository) {
        let kv = Arc::new(InMemoryKvClient::new());
        let repository = KvChatMemoryRepository::builder()
            .key_prefix("test_chat_memory:")
            .time_to_live(ttl)
            .client(kv.clone())
            .build()
            .expect("repository");
        (kv, repository)
    }

    #[test]
    fn builder_defaults() {
        let repository = KvChatMemoryRepository::builder()
            .client(Arc::new(InMemoryKvClient::new()))
            .build()
            .expect("repository");
        assert_eq!(repository.key_prefix(), DEFAULT_KEY_PREFIX);
        assert_eq!(repository.time_to_live(), TimeToLive::Never);
        assert_eq!(repository.time_to_live().as_engine_seconds(), -1);
    }

    #[test]
    fn builder_parses_time_to_live_tokens() {
        for (token, expected) in [
            ("1s", 1),
            ("1m", 60),
            ("1h", 3600),
            ("1d", 86400),
            ("-1", -1),
            ("1xx", -1),
        ] {
            let (_, repository) = repository(token);
            assert_eq!(repository.key_prefix(), "test_chat_memory:");
            assert_eq!(
                repository.time_to_live().as_engine_seconds(),
                expected,
                "{token}"
            );
        }
    }

    #[test]
    fn builder_requires_client() {
        let err = KvChatMemoryRepository::builder().build().unwrap_err();
        assert!(matches!(err, MemoryError::MissingClient));
    }

    #[test]
    fn builder_rejects_expiry_the_engine_cannot_arm() {
        for time_to_live in [
            TimeToLive::Seconds(0),
            TimeToLive::Seconds(mnemo_rs_config::ttl::MAX_SECONDS + 1),
        ] {
            let err = KvChatMemoryRepository::builder()
                .time_to_live(time_to_live)
                .client(Arc::new(InMemoryKvClient::new()))
                .build()
                .unwrap_err();
            assert!(
                matches!(
                    err,
                    MemoryError::Config(ConfigError::InvalidTimeToLive { .. })
                ),
                "{time_to_live:?}"
            );
        }
    }

    #[test]
    fn builder_reads_repository_config() {
        let config = RepositoryConfig {
            key_prefix: "cfg:".to_string(),
            time_to_live: "2h".to_string(),
            strict_time_to_live: true,
        };
        let repository = super::KvChatMemoryRepositoryBuilder::from_config(&config)
            .expect("builder")
            .client(Arc::new(InMemoryKvClient::new()))
            .build()
            .expect("repository");
        assert_eq!(repository.key_prefix(), "cfg:");
        assert_eq!(repository.time_to_live(), TimeToLive::Seconds(7200));

        let strict = RepositoryConfig {
            time_to_live: "2 hours".to_string(),
            ..config
        };
        let err = super::KvChatMemoryRepositoryBuilder::from_config(&strict).unwrap_err();
        assert!(matches!(err, MemoryError::Config(_)));
    }

    #[tokio::test]
    async fn conversation_key_is_prefix_plus_id() {
        let (kv, repository) = repository("-1");
        assert_eq!(repository.conversation_key("abc"), "test_chat_memory:abc");
        repository
            .append_messages("abc", &[Message::user("hi")])
            .await
            .expect("append");
        assert_eq!(
            kv.range_all("test_chat_memory:abc")
                .await
                .expect("range")
                .len(),
            1
        );
    }

    #[tokio::test]
    async fn append_stamps_timestamps_and_keeps_order() {
        let (_, repository) = repository("30m");
        let messages = vec![
            Message::assistant("one"),
            Message::user("two").with_metadata("timestamp", "caller supplied"),
            Message::system("three"),
        ];
        repository
            .append_messages("c1", &messages)
            .await
            .expect("append");

        let stored = repository.find_by_conversation_id("c1").await.expect("find");
        assert_eq!(stored.len(), 3);
        for (original, stored) in messages.iter().zip(&stored) {
            assert_eq!(stored.message_type(), original.message_type());
            assert_eq!(stored.text(), original.text());
            assert!(stored.timestamp().is_some());
        }
        assert_eq!(stored[1].message_type(), MessageType::User);
    }

    #[tokio::test]
    async fn empty_append_does_not_create_conversation() {
        let (_, repository) = repository("30m");
        repository.append_messages("c1", &[]).await.expect("append");
        assert!(repository.find_conversation_ids().await.expect("ids").is_empty());
        assert_eq!(
            repository.conversation_expiry("c1").await.expect("expiry"),
            KeyExpiry::Missing
        );
    }

    #[tokio::test(start_paused = true)]
    async fn every_append_rearms_expiry() {
        let (_, repository) = repository("1m");
        repository
            .append_messages("c1", &[Message::user("first")])
            .await
            .expect("append");
        tokio::time::advance(Duration::from_secs(45)).await;
        repository
            .append_messages("c1", &[Message::assistant("second")])
            .await
            .expect("append");
        tokio::time::advance(Duration::from_secs(45)).await;

        let stored = repository.find_by_conversation_id("c1").await.expect("find");
        assert_eq!(stored.len(), 2);
        assert_eq!(
            repository.conversation_expiry("c1").await.expect("expiry"),
            KeyExpiry::ExpiresIn(Duration::from_secs(15))
        );

        tokio::time::advance(Duration::from_secs(16)).await;
        assert!(repository.find_by_conversation_id("c1").await.expect("find").is_empty());
        assert!(!repository
            .find_conversation_ids()
            .await
            .expect("ids")
            .contains("c1"));
    }

    #[tokio::test]
    async fn corrupt_entry_fails_only_its_conversation() {
        let (kv, repository) = repository("-1");
        repository
            .append_messages("good", &[Message::user("fine")])
            .await
            .expect("append");
        repository
            .append_messages("bad", &[Message::user("fine")])
            .await
            .expect("append");
        kv.push_tail("test_chat_memory:bad", &["{not json".to_string()])
            .await
            .expect("push");

        let err = repository.find_by_conversation_id("bad").await.unwrap_err();
        match err {
            MemoryError::Decode {
                conversation_id,
                index,
                ..
            } => {
                assert_eq!(conversation_id, "bad");
                assert_eq!(index, 1);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(
            repository
                .find_by_conversation_id("good")
                .await
                .expect("find")
                .len(),
            1
        );
    }

    #[tokio::test]
    async fn listing_ignores_other_prefixes() {
        let (kv, repository) = repository("-1");
        kv.push_tail("other_app:c9", &["x".to_string()])
            .await
            .expect("push");
        repository
            .append_messages("c1", &[Message::user("hi")])
            .await
            .expect("append");
        let ids = repository.find_conversation_ids().await.expect("ids");
        assert_eq!(ids.into_iter().collect::<Vec<_>>(), vec!["c1".to_string()]);
    }
}
