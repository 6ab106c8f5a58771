//! Reading and merging individual config layers.

use super::{ConfigLayer, ConfigLayerSource, LoadedLayer, schema};
use crate::ConfigError;
use log::debug;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

pub(super) fn parse_json5(contents: &str, origin: &str) -> Result<Value, ConfigError> {
    json5::from_str(contents).map_err(|source| ConfigError::Syntax {
        origin: origin.to_string(),
        source,
    })
}

pub(super) fn read_json5(path: &Path, origin: &str) -> Result<Value, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_json5(&contents, origin)
}

/// Read one layer and check it against the schema.
pub(super) fn read_layer(
    source: ConfigLayerSource,
    path: &Path,
) -> Result<LoadedLayer, ConfigError> {
    let origin = format!("{}({})", source.as_str(), path.display());
    debug!("reading config layer (origin={})", origin);
    let value = read_json5(path, &origin)?;
    schema::check(&value, &origin)?;
    Ok(LoadedLayer {
        meta: ConfigLayer {
            source,
            path: path.to_path_buf(),
        },
        value,
    })
}

/// Resolved form of `path`, or `path` itself when it cannot be resolved.
pub(super) fn canonical(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}

/// Fold `overlay` into `base`. Objects merge per key; any other value replaces.
pub(super) fn merge_into(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Object(base), Value::Object(entries)) => {
            for (key, value) in entries {
                match base.get_mut(&key) {
                    Some(slot) => merge_into(slot, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (slot, value) => *slot = value,
    }
}

#[cfg(test)]
mod tests {
    use super::merge_into;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn merge_replaces_leaves_and_keeps_siblings() {
        let mut base = json!({
            "chat_memory": { "repository": { "key_prefix": "a:", "time_to_live": "1h" } },
            "engine": { "provider": "redis", "url": "redis://one" }
        });
        merge_into(
            &mut base,
            json!({
                "chat_memory": { "repository": { "time_to_live": "2h" } },
                "engine": "memory"
            }),
        );
        assert_eq!(
            base,
            json!({
                "chat_memory": { "repository": { "key_prefix": "a:", "time_to_live": "2h" } },
                "engine": "memory"
            })
        );
    }
}
