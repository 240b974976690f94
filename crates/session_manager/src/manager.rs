//! Conversation session - the live transcript and the client that extends it

use crate::error::Result;
use crate::storage::TranscriptStore;
use crate::structs::{SessionConfig, SessionStatus};
use chat_client::{ChatClient, ChatError, CompletionTransport};
use chat_core::{ConversationTranscript, ConversationTurn, Settings};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

/// Where the session gets its transport from when (re)configured.
#[derive(Clone)]
enum TransportSource {
    /// Build an HTTP transport from the current settings.
    Http,
    /// Always use the given transport.
    Fixed(Arc<dyn CompletionTransport>),
}

struct SessionState {
    client: ChatClient,
    settings: Settings,
}

/// Conversation session - owns the transcript exclusively
pub struct ConversationSession {
    state: RwLock<SessionState>,
    transcript: Mutex<ConversationTranscript>,
    store: TranscriptStore,
    transport: TransportSource,
}

impl ConversationSession {
    /// Create a session talking HTTP, hydrated from `store` when history is saved.
    pub async fn new(config: SessionConfig, store: TranscriptStore) -> Result<Self> {
        Self::build(config, store, TransportSource::Http).await
    }

    /// Create a session over a caller-provided transport.
    pub async fn with_transport(
        config: SessionConfig,
        store: TranscriptStore,
        transport: Arc<dyn CompletionTransport>,
    ) -> Result<Self> {
        Self::build(config, store, TransportSource::Fixed(transport)).await
    }

    async fn build(
        config: SessionConfig,
        store: TranscriptStore,
        transport: TransportSource,
    ) -> Result<Self> {
        let client = Self::build_client(&transport, &config)?;

        let transcript = if config.settings.save_history {
            let loaded = store.load().await;
            log::info!("Restored {} conversation turns", loaded.len());
            loaded
        } else {
            ConversationTranscript::new()
        };

        Ok(Self {
            state: RwLock::new(SessionState {
                client,
                settings: config.settings,
            }),
            transcript: Mutex::new(transcript),
            store,
            transport,
        })
    }

    fn build_client(
        transport: &TransportSource,
        config: &SessionConfig,
    ) -> std::result::Result<ChatClient, ChatError> {
        match transport {
            TransportSource::Http => ChatClient::from_settings(&config.settings, config.api_key.clone()),
            TransportSource::Fixed(transport) => {
                Ok(ChatClient::new(Arc::clone(transport), config.api_key.clone()))
            }
        }
    }

    /// Rebuild credentials and model settings. The transcript is left alone.
    pub async fn reconfigure(&self, config: SessionConfig) -> Result<()> {
        let client = Self::build_client(&self.transport, &config)?;
        let mut state = self.state.write().await;
        state.client = client;
        state.settings = config.settings;
        log::info!(
            "Session reconfigured: model={} token={}",
            state.settings.selected_model,
            if state.client.has_api_key() { "set" } else { "missing" }
        );
        Ok(())
    }

    pub async fn status(&self) -> SessionStatus {
        let configured = {
            let state = self.state.read().await;
            state.client.has_api_key() && !state.settings.selected_model.trim().is_empty()
        };
        if !configured {
            return SessionStatus::Unconfigured;
        }
        if self.transcript.lock().await.is_empty() {
            SessionStatus::Empty
        } else {
            SessionStatus::Ready
        }
    }

    pub async fn settings(&self) -> Settings {
        self.state.read().await.settings.clone()
    }

    pub async fn model_name(&self) -> String {
        self.state.read().await.settings.selected_model.clone()
    }

    /// Send a prompt as the next user turn.
    ///
    /// The user turn is appended before the request and stays even when the
    /// request fails; the assistant turn is appended only on success.
    pub async fn send_message(&self, prompt: &str) -> std::result::Result<String, ChatError> {
        let (client, model, temperature, save_history) = {
            let state = self.state.read().await;
            (
                state.client.clone(),
                state.settings.selected_model.clone(),
                state.settings.temperature,
                state.settings.save_history,
            )
        };

        if !client.has_api_key() {
            return Err(ChatError::NotConfigured(chat_client::MissingSetting::ApiKey));
        }
        if model.trim().is_empty() {
            return Err(ChatError::NotConfigured(chat_client::MissingSetting::Model));
        }

        let snapshot = {
            let mut transcript = self.transcript.lock().await;
            transcript.push(ConversationTurn::user(prompt));
            transcript.turns().to_vec()
        };

        let reply = match client.send(&snapshot, &model, temperature).await {
            Ok(reply) => reply,
            Err(err) => {
                log::error!("Error sending message to AI: {}", err);
                return Err(err);
            }
        };

        let to_persist = {
            let mut transcript = self.transcript.lock().await;
            transcript.push(ConversationTurn::assistant(reply.clone()));
            save_history.then(|| transcript.clone())
        };
        if let Some(transcript) = to_persist {
            if let Err(err) = self.store.save(&transcript).await {
                log::warn!("Reply received but conversation not saved: {}", err);
            }
        }

        Ok(reply)
    }

    /// Rewrite a prompt with the selected model. Never touches the transcript.
    pub async fn enhance(&self, prompt: &str) -> std::result::Result<String, ChatError> {
        let (client, model) = {
            let state = self.state.read().await;
            (state.client.clone(), state.settings.selected_model.clone())
        };
        client.enhance(prompt, &model).await.map_err(|err| {
            log::error!("Error enhancing prompt: {}", err);
            err
        })
    }

    /// Drop every turn, and the persisted copy when history is saved.
    pub async fn clear(&self) -> Result<()> {
        let save_history = self.state.read().await.settings.save_history;
        self.transcript.lock().await.clear();
        if save_history {
            self.store.clear().await?;
        }
        log::info!("Conversation cleared");
        Ok(())
    }

    /// Copy of the transcript.
    pub async fn history(&self) -> Vec<ConversationTurn> {
        self.transcript.lock().await.turns().to_vec()
    }
}
