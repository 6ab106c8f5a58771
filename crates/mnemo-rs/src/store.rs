use log::info;
#[cfg(feature = "redis-backend")]
use mnemo_rs_config::ConfigError;
use mnemo_rs_config::{EngineConfig, EngineProvider, MnemoConfig};
use mnemo_rs_memory::{
    InMemoryKvClient, KvChatMemoryRepository, KvChatMemoryRepositoryBuilder, KvClient,
    MemoryError,
};
use std::sync::Arc;

/// Open the engine client selected by `engine.provider`.
pub async fn connect_engine(engine: &EngineConfig) -> Result<Arc<dyn KvClient>, MemoryError> {
    match engine.provider {
        EngineProvider::Memory => Ok(Arc::new(InMemoryKvClient::new())),
        EngineProvider::Redis => connect_redis(engine).await,
    }
}

#[cfg(feature = "redis-backend")]
async fn connect_redis(engine: &EngineConfig) -> Result<Arc<dyn KvClient>, MemoryError> {
    let url = engine
        .url
        .as_deref()
        .filter(|url| !url.is_empty())
        .ok_or_else(|| ConfigError::InvalidField {
            path: "engine.url".to_string(),
            message: "redis engine requires a url".to_string(),
        })?;
    let client = mnemo_rs_memory::RedisKvClient::connect(url).await?;
    Ok(Arc::new(client))
}

#[cfg(not(feature = "redis-backend"))]
async fn connect_redis(_engine: &EngineConfig) -> Result<Arc<dyn KvClient>, MemoryError> {
    Err(MemoryError::UnsupportedEngine(
        "redis (built without the redis-backend feature)".to_string(),
    ))
}

/// Build a repository from config, connecting the configured engine.
pub async fn open_repository(
    config: &MnemoConfig,
) -> Result<KvChatMemoryRepository, MemoryError> {
    let client = connect_engine(&config.engine).await?;
    open_repository_with_client(config, client)
}

/// Build a repository from config over an existing engine client.
pub fn open_repository_with_client(
    config: &MnemoConfig,
    client: Arc<dyn KvClient>,
) -> Result<KvChatMemoryRepository, MemoryError> {
    let repository = KvChatMemoryRepositoryBuilder::from_config(&config.chat_memory.repository)?
        .client(client)
        .build()?;
    info!(
        "opened chat memory (engine={}, prefix={})",
        config.engine.provider.as_str(),
        repository.key_prefix()
    );
    Ok(repository)
}
