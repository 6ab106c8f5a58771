//! Configuration models, time-to-live parsing, and layered config loading.
//!
//! This crate owns the Mnemo config schema and the compact duration grammar
//! (`30m`, `1h`, `1d`) used to configure conversation expiry.

mod error;
mod loader;
mod model;
pub mod ttl;

/// Public error type returned by config loading and validation APIs.
pub use error::ConfigError;
/// Layered config types and loader options.
pub use loader::{ConfigLayer, ConfigLayerSource, LayeredConfig, LayeredConfigOptions};
/// Configuration schema models.
pub use model::*;
/// Parsed conversation expiry.
pub use ttl::TimeToLive;
