//! Panel message envelope. JSON objects tagged by `type`.

use chat_core::{ConversationTurn, SettingsUpdate};
use serde::{Deserialize, Serialize};

/// Messages sent by the panel to the core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum InboundMessage {
    SubmitQuery {
        value: String,
    },
    ClearConversation,
    /// Without a value the host is asked to prompt for one.
    ConfigureApiKey {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        value: Option<String>,
    },
    UpdateSettings {
        value: SettingsUpdate,
    },
    CopyToClipboard {
        value: String,
    },
    InsertToEditor {
        value: String,
    },
    GetModelInfo,
    LoadConversation,
}

/// Messages sent by the core to the panel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum OutboundMessage {
    UpdateResponse {
        value: String,
        #[serde(rename = "isError", default, skip_serializing_if = "Option::is_none")]
        is_error: Option<bool>,
    },
    ModelInfo {
        value: String,
    },
    LoadedConversation {
        value: Vec<ConversationTurn>,
    },
    ClearConversation,
}

impl OutboundMessage {
    pub fn response(text: impl Into<String>) -> Self {
        OutboundMessage::UpdateResponse {
            value: text.into(),
            is_error: None,
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        OutboundMessage::UpdateResponse {
            value: text.into(),
            is_error: Some(true),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(
            self,
            OutboundMessage::UpdateResponse {
                is_error: Some(true),
                ..
            }
        )
    }
}
