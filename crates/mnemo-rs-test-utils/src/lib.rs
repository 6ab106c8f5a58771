//! Test helpers shared across Mnemo crates.

pub mod engine;
pub mod messages;

pub use engine::{FailingKvClient, KvCall, RecordingKvClient};
pub use messages::{fresh_conversation_id, sample_conversation};
