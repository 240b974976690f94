//! # Session Manager
//!
//! Owns the live conversation: configuration, the persisted transcript and
//! the access token, and the session that ties them to the chat client.

pub mod config_store;
pub mod error;
pub mod manager;
pub mod secrets;
pub mod storage;
pub mod structs;

// Re-exports
pub use config_store::{ConfigStore, API_KEY_SECRET, TOKEN_ENV_VAR};
pub use error::SessionError;
pub use manager::ConversationSession;
pub use secrets::{EncryptedFileSecretStore, MemorySecretStore, SecretStore};
pub use storage::{JsonFileStore, KeyValueStore, MemoryStore, TranscriptStore, CONVERSATION_KEY};
pub use structs::{SessionConfig, SessionStatus};
