use chat_core::{ConversationTurn, Role};

use crate::api::models::ChatMessage;

/// Turn a transcript into the outgoing message array.
///
/// `preamble` is prepended as a system message unless the transcript already
/// carries a system turn.
pub fn adapt_transcript(turns: &[ConversationTurn], preamble: &str) -> Vec<ChatMessage> {
    let has_system = turns.iter().any(|turn| turn.role == Role::System);

    let mut messages = Vec::with_capacity(turns.len() + 1);
    if !has_system {
        messages.push(ChatMessage {
            role: Role::System,
            content: preamble.to_string(),
        });
    }
    messages.extend(turns.iter().map(ChatMessage::from));
    messages
}

/// Two-message exchange used for one-off requests outside the conversation.
pub fn adapt_one_shot(instruction: &str, prompt: &str) -> Vec<ChatMessage> {
    vec![
        ChatMessage {
            role: Role::System,
            content: instruction.to_string(),
        },
        ChatMessage {
            role: Role::User,
            content: prompt.to_string(),
        },
    ]
}
