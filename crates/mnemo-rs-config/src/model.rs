//! Configuration schema for Mnemo.

use crate::ConfigError;
use crate::ttl::{NO_EXPIRY_TOKEN, TimeToLive};
use serde::{Deserialize, Serialize};

/// Default prefix prepended to every conversation key.
pub const DEFAULT_KEY_PREFIX: &str = "spring_ai_chat_memory:";
/// Default time-to-live token (never expire).
pub const DEFAULT_TIME_TO_LIVE: &str = NO_EXPIRY_TOKEN;

/// Root config for the Mnemo SDK.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct MnemoConfig {
    #[serde(default, rename = "$schema")]
    pub schema: Option<String>,
    #[serde(default)]
    pub chat_memory: ChatMemoryConfig,
    #[serde(default)]
    pub engine: EngineConfig,
}

impl MnemoConfig {
    /// Start building a config programmatically with defaults applied.
    pub fn builder() -> MnemoConfigBuilder {
        MnemoConfigBuilder::new()
    }
}

/// Builder for assembling a `MnemoConfig` in code.
#[derive(Debug, Default, Clone)]
pub struct MnemoConfigBuilder {
    config: MnemoConfig,
}

impl MnemoConfigBuilder {
    /// Create a new builder seeded with default config values.
    pub fn new() -> Self {
        Self {
            config: MnemoConfig::default(),
        }
    }

    /// Replace the chat memory repository configuration.
    pub fn repository(mut self, repository: RepositoryConfig) -> Self {
        self.config.chat_memory.repository = repository;
        self
    }

    /// Set the conversation key prefix.
    pub fn key_prefix(mut self, key_prefix: impl Into<String>) -> Self {
        self.config.chat_memory.repository.key_prefix = key_prefix.into();
        self
    }

    /// Set the conversation time-to-live token (for example `30m`).
    pub fn time_to_live(mut self, time_to_live: impl Into<String>) -> Self {
        self.config.chat_memory.repository.time_to_live = time_to_live.into();
        self
    }

    /// Replace the key-value engine configuration.
    pub fn engine(mut self, engine: EngineConfig) -> Self {
        self.config.engine = engine;
        self
    }

    /// Finalize and return the built `MnemoConfig`.
    pub fn build(self) -> MnemoConfig {
        self.config
    }
}

/// Chat memory settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ChatMemoryConfig {
    #[serde(default)]
    pub repository: RepositoryConfig,
}

/// Settings for the key-value backed conversation repository.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RepositoryConfig {
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,
    #[serde(default = "default_time_to_live")]
    pub time_to_live: String,
    /// Reject unrecognized time-to-live tokens instead of disabling expiry.
    #[serde(default)]
    pub strict_time_to_live: bool,
}

impl RepositoryConfig {
    /// Resolve the configured token into a [`TimeToLive`].
    ///
    /// Unrecognized tokens resolve to [`TimeToLive::Never`] unless
    /// `strict_time_to_live` is set, in which case they are an error.
    pub fn resolve_time_to_live(&self) -> Result<TimeToLive, ConfigError> {
        if self.strict_time_to_live {
            TimeToLive::parse_strict(&self.time_to_live)
        } else {
            Ok(TimeToLive::parse(&self.time_to_live))
        }
    }
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            key_prefix: default_key_prefix(),
            time_to_live: default_time_to_live(),
            strict_time_to_live: false,
        }
    }
}

fn default_key_prefix() -> String {
    DEFAULT_KEY_PREFIX.to_string()
}

fn default_time_to_live() -> String {
    DEFAULT_TIME_TO_LIVE.to_string()
}

/// Key-value engine binding used by the repository.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct EngineConfig {
    #[serde(default)]
    pub provider: EngineProvider,
    /// Connection URL, required for remote engines.
    #[serde(default)]
    pub url: Option<String>,
}

/// Supported key-value engines.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum EngineProvider {
    /// Process-local engine, data is lost on exit.
    #[default]
    Memory,
    /// Redis server.
    Redis,
}

impl EngineProvider {
    /// Return the provider as its config string.
    pub fn as_str(&self) -> &'static str {
        match self {
            EngineProvider::Memory => "memory",
            EngineProvider::Redis => "redis",
        }
    }
}
