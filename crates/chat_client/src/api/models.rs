//! Wire models for the OpenAI-compatible `/chat/completions` endpoint.
//!
//! Only the fields this client reads or writes are modelled; everything else
//! in a response is ignored.

use chat_core::{ConversationTurn, Role};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl From<&ConversationTurn> for ChatMessage {
    fn from(turn: &ConversationTurn) -> Self {
        Self {
            role: turn.role,
            content: turn.content.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChatCompletionResponse {
    #[serde(default)]
    pub choices: Vec<Choice>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Choice {
    #[serde(default)]
    pub message: Option<ResponseMessage>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResponseMessage {
    #[serde(default)]
    pub content: Option<String>,
}

impl ChatCompletionResponse {
    /// Content of the first choice, trimmed. `None` when absent or blank.
    pub fn first_text(&self) -> Option<String> {
        let text = self.choices.first()?.message.as_ref()?.content.as_deref()?.trim();
        (!text.is_empty()).then(|| text.to_string())
    }
}

/// Error payloads seen from OpenAI-style gateways.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum ApiErrorBody {
    Detailed { error: ApiErrorDetail },
    Plain { error: String },
    Message { message: String },
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiErrorDetail {
    pub message: String,
}

impl ApiErrorBody {
    pub(crate) fn into_message(self) -> String {
        match self {
            ApiErrorBody::Detailed { error } => error.message,
            ApiErrorBody::Plain { error } => error,
            ApiErrorBody::Message { message } => message,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_shape() {
        let request = ChatCompletionRequest {
            model: "openai/o4-mini".into(),
            messages: vec![ChatMessage::from(&ConversationTurn::user("hi"))],
            temperature: 0.5,
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "model": "openai/o4-mini",
                "messages": [{"role": "user", "content": "hi"}],
                "temperature": 0.5
            })
        );
    }

    #[test]
    fn test_first_text_trims() {
        let response: ChatCompletionResponse = serde_json::from_value(serde_json::json!({
            "id": "chatcmpl-1",
            "choices": [{"index": 0, "message": {"role": "assistant", "content": "  hello \n"}}]
        }))
        .unwrap();
        assert_eq!(response.first_text().as_deref(), Some("hello"));
    }

    #[test]
    fn test_first_text_missing_or_blank() {
        let empty: ChatCompletionResponse = serde_json::from_str(r#"{"choices": []}"#).unwrap();
        assert_eq!(empty.first_text(), None);

        let blank: ChatCompletionResponse =
            serde_json::from_str(r#"{"choices": [{"message": {"content": "   "}}]}"#).unwrap();
        assert_eq!(blank.first_text(), None);

        let null: ChatCompletionResponse =
            serde_json::from_str(r#"{"choices": [{"message": {"content": null}}]}"#).unwrap();
        assert_eq!(null.first_text(), None);
    }

    #[test]
    fn test_error_body_variants() {
        let detailed: ApiErrorBody =
            serde_json::from_str(r#"{"error": {"message": "bad model", "code": "unknown_model"}}"#).unwrap();
        assert_eq!(detailed.into_message(), "bad model");

        let plain: ApiErrorBody = serde_json::from_str(r#"{"error": "Unauthorized"}"#).unwrap();
        assert_eq!(plain.into_message(), "Unauthorized");
    }
}
