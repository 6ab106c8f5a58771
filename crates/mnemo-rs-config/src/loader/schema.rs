//! Shape check for raw config layers.
//!
//! Runs before serde so unknown keys and wrong types are reported with the
//! layer they came from and a dotted field path.

use crate::ConfigError;
use serde_json::Value;

enum Rule {
    Object(&'static [(&'static str, Rule)]),
    String,
    Bool,
    OneOf(&'static [&'static str]),
}

const REPOSITORY: &[(&str, Rule)] = &[
    ("key_prefix", Rule::String),
    ("time_to_live", Rule::String),
    ("strict_time_to_live", Rule::Bool),
];

const CHAT_MEMORY: &[(&str, Rule)] = &[("repository", Rule::Object(REPOSITORY))];

const ENGINE: &[(&str, Rule)] = &[
    ("provider", Rule::OneOf(&["memory", "redis"])),
    ("url", Rule::String),
];

const ROOT: Rule = Rule::Object(&[
    ("$schema", Rule::String),
    ("chat_memory", Rule::Object(CHAT_MEMORY)),
    ("engine", Rule::Object(ENGINE)),
]);

/// Check a layer, labelling failures with `origin`.
pub(super) fn check(value: &Value, origin: &str) -> Result<(), ConfigError> {
    check_rule(value, &ROOT, origin, "")
}

fn check_rule(value: &Value, rule: &Rule, origin: &str, path: &str) -> Result<(), ConfigError> {
    match rule {
        Rule::Object(fields) => {
            let Value::Object(map) = value else {
                return Err(invalid(origin, path, "expected object"));
            };
            for (key, child) in map {
                let child_path = if path.is_empty() {
                    key.clone()
                } else {
                    format!("{path}.{key}")
                };
                let Some((_, child_rule)) = fields.iter().find(|(name, _)| name == key) else {
                    return Err(invalid(origin, &child_path, "unknown key"));
                };
                check_rule(child, child_rule, origin, &child_path)?;
            }
            Ok(())
        }
        Rule::String if value.is_string() => Ok(()),
        Rule::String => Err(invalid(origin, path, "expected string")),
        Rule::Bool if value.is_boolean() => Ok(()),
        Rule::Bool => Err(invalid(origin, path, "expected bool")),
        Rule::OneOf(choices) => match value.as_str() {
            Some(choice) if choices.contains(&choice) => Ok(()),
            Some(_) => Err(invalid(
                origin,
                path,
                &format!("expected one of {}", choices.join(", ")),
            )),
            None => Err(invalid(origin, path, "expected string")),
        },
    }
}

fn invalid(origin: &str, path: &str, message: &str) -> ConfigError {
    let path = if path.is_empty() { "root" } else { path };
    ConfigError::InvalidField {
        path: format!("{origin}:{path}"),
        message: message.to_string(),
    }
}
