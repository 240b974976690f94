use thiserror::Error;

/// Which piece of configuration is missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MissingSetting {
    #[error("Client not initialized. Please configure your GitHub Token.")]
    ApiKey,
    #[error("No AI model selected. Please configure it in settings.")]
    Model,
}

/// Failure of a single completion exchange. The message is user-facing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChatError {
    #[error("{0}")]
    NotConfigured(MissingSetting),

    #[error("Failed to get response from AI model. Details: {0}")]
    RequestFailed(String),

    #[error("No response from AI model.")]
    EmptyResponse,
}

impl From<reqwest::Error> for ChatError {
    fn from(err: reqwest::Error) -> Self {
        ChatError::RequestFailed(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ChatError>;
