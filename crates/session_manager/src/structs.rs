//! Session data structures

use chat_client::MissingSetting;
use chat_core::Settings;
use serde::{Deserialize, Serialize};

/// Everything a session needs to talk to the model, passed in explicitly.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionConfig {
    pub api_key: Option<String>,
    pub settings: Settings,
}

impl SessionConfig {
    pub fn new(api_key: Option<String>, settings: Settings) -> Self {
        Self { api_key, settings }
    }

    /// First missing piece of configuration, if any.
    pub fn missing(&self) -> Option<MissingSetting> {
        if self.api_key.as_deref().map_or(true, |key| key.trim().is_empty()) {
            return Some(MissingSetting::ApiKey);
        }
        if self.settings.selected_model.trim().is_empty() {
            return Some(MissingSetting::Model);
        }
        None
    }

    pub fn is_configured(&self) -> bool {
        self.missing().is_none()
    }
}

/// Coarse lifecycle of a conversation session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    /// No token or no model; sends are rejected.
    Unconfigured,
    /// Configured, no turns yet.
    Empty,
    /// Configured with at least one turn.
    Ready,
}

impl SessionStatus {
    pub fn can_send(&self) -> bool {
        !matches!(self, SessionStatus::Unconfigured)
    }
}
