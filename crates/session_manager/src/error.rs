//! Session manager error types

use chat_client::ChatError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Secret store error: {0}")]
    SecretError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error(transparent)]
    Chat(#[from] ChatError),
}

pub type Result<T> = std::result::Result<T, SessionError>;
