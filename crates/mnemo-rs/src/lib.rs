//! Public SDK surface for Mnemo.
//!
//! This crate re-exports the config and memory crates and wires a loaded
//! [`MnemoConfig`](config::MnemoConfig) into a ready repository.

/// Config model, layered loader and duration tokens.
pub use mnemo_rs_config as config;
/// Messages, engine clients and the conversation repository.
pub use mnemo_rs_memory as memory;

mod store;

pub use store::{connect_engine, open_repository, open_repository_with_client};

/// Install `env_logger` as the `log` backend when built with `logging`.
///
/// Safe to call more than once; later calls and builds without the feature
/// do nothing. Filtering follows `RUST_LOG`.
pub fn init_logging() {
    #[cfg(feature = "logging")]
    {
        let _ = env_logger::try_init();
    }
}
