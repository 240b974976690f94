//! Editor-side collaborator used by the panel bridge

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HostError {
    #[error("Clipboard unavailable: {0}")]
    Clipboard(String),

    #[error("Host error: {0}")]
    Other(String),
}

/// The editor the panel lives in.
#[async_trait]
pub trait EditorHost: Send + Sync {
    async fn copy_to_clipboard(&self, text: &str) -> Result<(), HostError>;

    /// Insert at the active cursor.
    async fn insert_text(&self, text: &str) -> Result<(), HostError>;

    /// Text currently selected in the active editor, if any.
    async fn selected_text(&self) -> Option<String>;

    async fn replace_selection(&self, text: &str) -> Result<(), HostError>;

    /// Ask the user for an access token. `None` when cancelled.
    async fn prompt_api_key(&self) -> Option<String>;

    async fn show_info(&self, message: &str);

    async fn show_error(&self, message: &str);
}
