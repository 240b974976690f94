use std::fmt;
use std::sync::Arc;

use chat_core::{ConversationTurn, Settings};
use log::{debug, info, warn};

use crate::adapters::openai_adapter::{adapt_one_shot, adapt_transcript};
use crate::api::models::{ChatCompletionRequest, ChatMessage};
use crate::api::transport::HttpTransport;
use crate::client_trait::CompletionTransport;
use crate::error::{ChatError, MissingSetting, Result};
use crate::masking::mask_secret;

pub const SYSTEM_PREAMBLE: &str = "You are a helpful AI coding assistant.";

pub const ENHANCE_INSTRUCTION: &str = "You are a prompt enhancement AI. Rewrite the following user prompt to be more detailed, clear, and effective for an AI coding assistant. Return only the enhanced prompt.";

pub const ENHANCE_TEMPERATURE: f32 = 0.5;

/// Stateless client for one chat completion per call.
///
/// Holds credentials and a transport; never owns or mutates a transcript.
#[derive(Clone)]
pub struct ChatClient {
    transport: Arc<dyn CompletionTransport>,
    api_key: Option<String>,
}

impl fmt::Debug for ChatClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChatClient")
            .field("api_key", &self.api_key.as_deref().map(mask_secret))
            .finish_non_exhaustive()
    }
}

impl ChatClient {
    /// Blank keys are treated as absent.
    pub fn new(transport: Arc<dyn CompletionTransport>, api_key: Option<String>) -> Self {
        let api_key = api_key
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty());
        Self { transport, api_key }
    }

    /// Build a client talking HTTP to `settings.api_base`.
    pub fn from_settings(settings: &Settings, api_key: Option<String>) -> Result<Self> {
        let transport = HttpTransport::from_settings(settings)?;
        info!("Chat client targeting {}", transport.base_url());
        Ok(Self::new(Arc::new(transport), api_key))
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Send the whole transcript and return the assistant's reply.
    pub async fn send(
        &self,
        transcript: &[ConversationTurn],
        model: &str,
        temperature: f32,
    ) -> Result<String> {
        let api_key = self.require_configured(model)?;
        let messages = adapt_transcript(transcript, SYSTEM_PREAMBLE);
        self.complete(api_key, model, messages, temperature).await
    }

    /// Rewrite a prompt without touching any conversation.
    pub async fn enhance(&self, prompt: &str, model: &str) -> Result<String> {
        let api_key = self.require_configured(model)?;
        let messages = adapt_one_shot(ENHANCE_INSTRUCTION, prompt);
        self.complete(api_key, model, messages, ENHANCE_TEMPERATURE)
            .await
    }

    fn require_configured(&self, model: &str) -> Result<&str> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(ChatError::NotConfigured(MissingSetting::ApiKey))?;
        if model.trim().is_empty() {
            return Err(ChatError::NotConfigured(MissingSetting::Model));
        }
        Ok(api_key)
    }

    async fn complete(
        &self,
        api_key: &str,
        model: &str,
        messages: Vec<ChatMessage>,
        temperature: f32,
    ) -> Result<String> {
        let request = ChatCompletionRequest {
            model: model.to_string(),
            messages,
            temperature,
        };
        debug!(
            "Sending {} messages to {} with key {}",
            request.messages.len(),
            model,
            mask_secret(api_key)
        );

        let response = self.transport.complete(api_key, &request).await?;
        match response.first_text() {
            Some(text) => Ok(text),
            None => {
                warn!("Model {} returned no usable content", model);
                Err(ChatError::EmptyResponse)
            }
        }
    }
}
