//! Layered configuration loader.
//!
//! Layers are read from the system, user and working-directory locations,
//! then from any runtime override files. Each layer is shape-checked on its
//! own, merged over the previous ones, and the result is validated once.

mod layers;
mod schema;


use crate::{ConfigError, EngineProvider, MnemoConfig};
use directories::UserDirs;
use log::{debug, info};
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// File name looked up in every discovered layer location.
const CONFIG_FILE_NAME: &str = "mnemo.json5";
/// Directory under the user's home holding the user layer.
const USER_CONFIG_DIR: &str = ".mnemo";
/// System layer location on Unix.
const SYSTEM_CONFIG_PATH: &str = "/etc/mnemo/mnemo.json5";

/// Effective config plus the layers it was built from.
#[derive(Debug, Clone)]
pub struct LayeredConfig {
    pub config: MnemoConfig,
    /// Contributing layers, lowest precedence first.
    pub layers: Vec<ConfigLayer>,
}

/// Where a config layer was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigLayerSource {
    System,
    User,
    /// `mnemo.json5` in the working directory.
    Cwd,
    /// Explicit override files, applied last.
    Runtime,
}

impl ConfigLayerSource {
    /// Short name used in logs and error labels.
    pub fn as_str(&self) -> &'static str {
        match self {
            ConfigLayerSource::System => "system",
            ConfigLayerSource::User => "user",
            ConfigLayerSource::Cwd => "cwd",
            ConfigLayerSource::Runtime => "runtime",
        }
    }

    fn default_path(self) -> Option<PathBuf> {
        match self {
            ConfigLayerSource::System if cfg!(unix) => Some(PathBuf::from(SYSTEM_CONFIG_PATH)),
            ConfigLayerSource::User => UserDirs::new().map(|dirs| {
                dirs.home_dir()
                    .join(USER_CONFIG_DIR)
                    .join(CONFIG_FILE_NAME)
            }),
            _ => None,
        }
    }
}

/// A layer that contributed to the effective config.
#[derive(Debug, Clone)]
pub struct ConfigLayer {
    pub source: ConfigLayerSource,
    pub path: PathBuf,
}

/// Layer locations for [`MnemoConfig::load_layered_with_options`].
#[derive(Debug, Clone)]
pub struct LayeredConfigOptions {
    /// Directory searched for `mnemo.json5`.
    pub cwd: PathBuf,
    /// System layer; `/etc/mnemo/mnemo.json5` by default on Unix.
    pub system_config_path: Option<PathBuf>,
    /// User layer; `~/.mnemo/mnemo.json5` by default.
    pub user_config_path: Option<PathBuf>,
    /// Override files that must exist, applied in order.
    pub runtime_paths: Vec<PathBuf>,
}

impl LayeredConfigOptions {
    /// Default layer locations around `cwd`.
    pub fn new(cwd: impl AsRef<Path>) -> Self {
        Self {
            cwd: cwd.as_ref().to_path_buf(),
            system_config_path: ConfigLayerSource::System.default_path(),
            user_config_path: ConfigLayerSource::User.default_path(),
            runtime_paths: Vec::new(),
        }
    }

    /// Append a runtime override file.
    pub fn with_runtime_path(mut self, path: impl AsRef<Path>) -> Self {
        self.runtime_paths.push(path.as_ref().to_path_buf());
        self
    }
}

struct LoadedLayer {
    meta: ConfigLayer,
    value: Value,
}

impl MnemoConfig {
    /// Load a single config file without layering.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        info!("loading config (path={})", path.display());
        let origin = path.display().to_string();
        let value = layers::read_json5(path, &origin)?;
        config_from_value(value, &origin)
    }

    /// Load a config from JSON5 text without layering.
    pub fn load_from_str(contents: &str) -> Result<Self, ConfigError> {
        debug!("loading config from text (len={})", contents.len());
        let value = layers::parse_json5(contents, "config")?;
        config_from_value(value, "config")
    }

    /// Load the layered config stack from the default locations around `cwd`.
    pub fn load_layered(cwd: impl AsRef<Path>) -> Result<LayeredConfig, ConfigError> {
        Self::load_layered_with_options(LayeredConfigOptions::new(cwd))
    }

    /// Load the layered config stack.
    ///
    /// Precedence, low to high: system, user, cwd, runtime overrides. Missing
    /// discovered layers are skipped; missing runtime files are an error. A
    /// file reached through two locations is only applied once.
    pub fn load_layered_with_options(
        options: LayeredConfigOptions,
    ) -> Result<LayeredConfig, ConfigError> {
        let local = layers::canonical(&options.cwd).join(CONFIG_FILE_NAME);
        let discovered = [
            (ConfigLayerSource::System, options.system_config_path),
            (ConfigLayerSource::User, options.user_config_path),
            (ConfigLayerSource::Cwd, Some(local)),
        ];

        let mut seen = HashSet::new();
        let mut loaded = Vec::new();
        for (source, path) in discovered {
            let Some(path) = path.filter(|path| path.is_file()) else {
                debug!("config layer absent (source={})", source.as_str());
                continue;
            };
            if !seen.insert(layers::canonical(&path)) {
                debug!(
                    "config layer already applied (source={}, path={})",
                    source.as_str(),
                    path.display()
                );
                continue;
            }
            loaded.push(layers::read_layer(source, &path)?);
        }
        for path in &options.runtime_paths {
            loaded.push(layers::read_layer(ConfigLayerSource::Runtime, path)?);
        }

        let mut merged = Value::Object(Map::new());
        let mut applied = Vec::with_capacity(loaded.len());
        for layer in loaded {
            layers::merge_into(&mut merged, layer.value);
            applied.push(layer.meta);
        }

        let config = config_from_value(merged, "effective")?;
        info!("layered config loaded (layers={})", applied.len());
        Ok(LayeredConfig {
            config,
            layers: applied,
        })
    }

    /// Check rules that span fields or need parsing.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let repository = &self.chat_memory.repository;
        if repository.key_prefix.is_empty() {
            return Err(ConfigError::InvalidField {
                path: "chat_memory.repository.key_prefix".to_string(),
                message: "key prefix must not be empty".to_string(),
            });
        }
        repository.resolve_time_to_live()?;

        if self.engine.provider == EngineProvider::Redis
            && self.engine.url.as_deref().is_none_or(str::is_empty)
        {
            return Err(ConfigError::InvalidField {
                path: "engine.url".to_string(),
                message: format!("{} engine requires a url", self.engine.provider.as_str()),
            });
        }

        Ok(())
    }
}

fn config_from_value(value: Value, origin: &str) -> Result<MnemoConfig, ConfigError> {
    schema::check(&value, origin)?;
    let config: MnemoConfig = serde_json::from_value(value)?;
    config.validate()?;
    Ok(config)
}
