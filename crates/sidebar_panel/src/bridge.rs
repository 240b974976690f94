//! Panel bridge - applies panel messages to the session, one at a time

use crate::host::EditorHost;
use crate::protocol::{InboundMessage, OutboundMessage};
use chat_core::SettingsUpdate;
use session_manager::{ConfigStore, ConversationSession, SessionError};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

const MODEL_PLACEHOLDER: &str = "N/A";

const SELECTION_MARKER: &str = " --- Selected Code: ";
const SELECTION_PREVIEW_CHARS: usize = 100;

/// Append a one-line preview of the editor selection to a prompt.
pub fn attach_selection(prompt: &str, selection: Option<&str>) -> String {
    match selection.filter(|text| !text.trim().is_empty()) {
        Some(text) => {
            let preview: String = text
                .chars()
                .take(SELECTION_PREVIEW_CHARS)
                .map(|c| if c == '\n' { ' ' } else { c })
                .collect();
            format!("{prompt}{SELECTION_MARKER}{preview}")
        }
        None => prompt.to_string(),
    }
}

#[derive(Debug, Error)]
pub enum PanelError {
    #[error("Panel channel closed")]
    ChannelClosed,

    #[error("Invalid panel message: {0}")]
    InvalidMessage(#[from] serde_json::Error),

    #[error(transparent)]
    Session(#[from] SessionError),
}

pub type Result<T> = std::result::Result<T, PanelError>;

/// Core side of the panel.
pub struct PanelBridge {
    session: Arc<ConversationSession>,
    config: Arc<ConfigStore>,
    host: Arc<dyn EditorHost>,
    outbound: mpsc::Sender<OutboundMessage>,
}

/// Panel side: send inbound messages, receive outbound ones.
pub struct PanelHandle {
    inbound: mpsc::Sender<InboundMessage>,
    outbound: mpsc::Receiver<OutboundMessage>,
    task: JoinHandle<()>,
}

impl PanelHandle {
    pub async fn send(&self, message: InboundMessage) -> Result<()> {
        self.inbound
            .send(message)
            .await
            .map_err(|_| PanelError::ChannelClosed)
    }

    /// Parse a raw JSON envelope and send it.
    pub async fn send_json(&self, raw: &str) -> Result<()> {
        let message: InboundMessage = serde_json::from_str(raw)?;
        self.send(message).await
    }

    pub async fn recv(&mut self) -> Option<OutboundMessage> {
        self.outbound.recv().await
    }

    /// Close the inbound side and wait for queued messages to be handled.
    pub async fn shutdown(self) {
        drop(self.inbound);
        if let Err(err) = self.task.await {
            log::error!("Panel bridge task failed: {}", err);
        }
    }
}

impl PanelBridge {
    pub fn new(
        session: Arc<ConversationSession>,
        config: Arc<ConfigStore>,
        host: Arc<dyn EditorHost>,
        outbound: mpsc::Sender<OutboundMessage>,
    ) -> Self {
        Self {
            session,
            config,
            host,
            outbound,
        }
    }

    /// Start the bridge on its own task.
    ///
    /// Messages are handled strictly in order, so a second query waits for
    /// the first one to finish.
    pub fn spawn(
        session: Arc<ConversationSession>,
        config: Arc<ConfigStore>,
        host: Arc<dyn EditorHost>,
    ) -> PanelHandle {
        let (inbound_tx, mut inbound_rx) = mpsc::channel::<InboundMessage>(32);
        let (outbound_tx, outbound_rx) = mpsc::channel::<OutboundMessage>(32);
        let bridge = PanelBridge::new(session, config, host, outbound_tx);

        let task = tokio::spawn(async move {
            while let Some(message) = inbound_rx.recv().await {
                if let Err(err) = bridge.handle(message).await {
                    log::warn!("Panel message dropped: {}", err);
                }
            }
            log::debug!("Panel bridge stopped");
        });

        PanelHandle {
            inbound: inbound_tx,
            outbound: outbound_rx,
            task,
        }
    }

    async fn post(&self, message: OutboundMessage) -> Result<()> {
        self.outbound
            .send(message)
            .await
            .map_err(|_| PanelError::ChannelClosed)
    }

    pub async fn handle(&self, message: InboundMessage) -> Result<()> {
        match message {
            InboundMessage::SubmitQuery { value } => self.submit_query(&value).await,
            InboundMessage::ClearConversation => self.clear_conversation().await,
            InboundMessage::ConfigureApiKey { value } => self.configure_api_key(value).await,
            InboundMessage::UpdateSettings { value } => self.update_settings(&value).await,
            InboundMessage::CopyToClipboard { value } => {
                match self.host.copy_to_clipboard(&value).await {
                    Ok(()) => self.host.show_info("Copied to clipboard!").await,
                    Err(err) => self.host.show_error(&err.to_string()).await,
                }
                Ok(())
            }
            InboundMessage::InsertToEditor { value } => {
                if let Err(err) = self.host.insert_text(&value).await {
                    self.host.show_error(&err.to_string()).await;
                }
                Ok(())
            }
            InboundMessage::GetModelInfo => self.post_model_info().await,
            InboundMessage::LoadConversation => {
                let history = self.session.history().await;
                self.post(OutboundMessage::LoadedConversation { value: history })
                    .await
            }
        }
    }

    async fn submit_query(&self, prompt: &str) -> Result<()> {
        if prompt.trim().is_empty() {
            log::debug!("Ignoring empty query");
            return Ok(());
        }
        let reply = match self.session.send_message(prompt).await {
            Ok(text) => OutboundMessage::response(text),
            Err(err) => OutboundMessage::error(err.to_string()),
        };
        self.post(reply).await
    }

    /// Ask about the current selection: the prompt carries a preview of the
    /// selected text and the reply goes to the panel like any query.
    pub async fn ask(&self, prompt: &str) -> Result<()> {
        if prompt.trim().is_empty() {
            return Ok(());
        }
        let selection = self.host.selected_text().await;
        self.submit_query(&attach_selection(prompt, selection.as_deref()))
            .await
    }

    /// Enhance the selection in place, or `prompt` into the clipboard when
    /// nothing is selected. Returns the enhanced text.
    pub async fn enhance_prompt(&self, prompt: Option<&str>) -> Option<String> {
        let selection = self
            .host
            .selected_text()
            .await
            .filter(|text| !text.trim().is_empty());
        let source = match (&selection, prompt) {
            (Some(selected), _) => selected.clone(),
            (None, Some(prompt)) if !prompt.trim().is_empty() => prompt.to_string(),
            _ => {
                log::debug!("Nothing to enhance");
                return None;
            }
        };

        let enhanced = match self.session.enhance(&source).await {
            Ok(text) => text,
            Err(err) => {
                self.host
                    .show_error(&format!("Error enhancing prompt: {err}"))
                    .await;
                return None;
            }
        };

        let delivered = if selection.is_some() {
            self.host.replace_selection(&enhanced).await
        } else {
            match self.host.copy_to_clipboard(&enhanced).await {
                Ok(()) => {
                    self.host
                        .show_info("Enhanced prompt copied to clipboard.")
                        .await;
                    Ok(())
                }
                Err(err) => Err(err),
            }
        };
        if let Err(err) = delivered {
            self.host.show_error(&err.to_string()).await;
        }
        Some(enhanced)
    }

    async fn clear_conversation(&self) -> Result<()> {
        if let Err(err) = self.session.clear().await {
            log::warn!("Failed to erase stored conversation: {}", err);
            self.host.show_error(&err.to_string()).await;
        }
        self.post(OutboundMessage::ClearConversation).await
    }

    async fn configure_api_key(&self, value: Option<String>) -> Result<()> {
        let provided = value.filter(|key| !key.trim().is_empty());
        let api_key = match provided {
            Some(key) => Some(key),
            None => self
                .host
                .prompt_api_key()
                .await
                .filter(|key| !key.trim().is_empty()),
        };
        let Some(api_key) = api_key else {
            log::debug!("API key prompt cancelled");
            return Ok(());
        };

        self.config.set_api_key(&api_key).await?;
        self.reload_session().await?;
        self.host.show_info("API key saved successfully!").await;
        self.post_model_info().await
    }

    async fn update_settings(&self, update: &SettingsUpdate) -> Result<()> {
        if update.is_empty() {
            return self.post_model_info().await;
        }
        if let Err(err) = self.config.update_settings(update) {
            self.host.show_error(&err.to_string()).await;
            return Err(err.into());
        }
        self.reload_session().await?;
        self.post_model_info().await
    }

    async fn reload_session(&self) -> Result<()> {
        let config = self.config.load().await?;
        if let Err(err) = self.session.reconfigure(config).await {
            self.host.show_error(&err.to_string()).await;
            return Err(err.into());
        }
        Ok(())
    }

    async fn post_model_info(&self) -> Result<()> {
        let model = self.session.model_name().await;
        let value = if model.trim().is_empty() {
            MODEL_PLACEHOLDER.to_string()
        } else {
            model
        };
        self.post(OutboundMessage::ModelInfo { value }).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_selection_leaves_prompt_alone() {
        assert_eq!(attach_selection("explain", None), "explain");
        assert_eq!(attach_selection("explain", Some("  \n ")), "explain");
    }

    #[test]
    fn test_selection_preview_is_flattened() {
        assert_eq!(
            attach_selection("explain", Some("fn a() {\n    b();\n}")),
            "explain --- Selected Code: fn a() {     b(); }"
        );
    }

    #[test]
    fn test_selection_preview_is_truncated_by_chars() {
        let selection = "é".repeat(150);
        let prompt = attach_selection("q", Some(&selection));
        assert_eq!(prompt, format!("q --- Selected Code: {}", "é".repeat(100)));
    }
}
