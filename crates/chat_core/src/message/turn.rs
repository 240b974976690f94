//! ConversationTurn - one message in the linear conversation
//!
//! Turns are append-only; a transcript is only ever cleared as a whole.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The author of a turn.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::System => "system",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single message in the conversation.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ConversationTurn {
    pub role: Role,
    pub content: String,
}

impl ConversationTurn {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }
}

/// Ordered list of turns. Insertion order is conversation order.
///
/// Serializes as a plain JSON array of `{role, content}` objects.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
#[serde(transparent)]
pub struct ConversationTranscript {
    turns: Vec<ConversationTurn>,
}

impl ConversationTranscript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, turn: ConversationTurn) {
        self.turns.push(turn);
    }

    pub fn turns(&self) -> &[ConversationTurn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn clear(&mut self) {
        self.turns.clear();
    }

}

impl From<Vec<ConversationTurn>> for ConversationTranscript {
    fn from(turns: Vec<ConversationTurn>) -> Self {
        Self { turns }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_serializes_lowercase() {
        let json = serde_json::to_string(&ConversationTurn::assistant("hi")).unwrap();
        assert_eq!(json, r#"{"role":"assistant","content":"hi"}"#);
    }

    #[test]
    fn test_unknown_role_is_rejected() {
        let parsed = serde_json::from_str::<ConversationTurn>(r#"{"role":"tool","content":"x"}"#);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_transcript_is_a_plain_array() {
        let mut transcript = ConversationTranscript::new();
        transcript.push(ConversationTurn::user("a"));
        transcript.push(ConversationTurn::assistant("b"));

        let json = serde_json::to_string(&transcript).unwrap();
        assert_eq!(
            json,
            r#"[{"role":"user","content":"a"},{"role":"assistant","content":"b"}]"#
        );

        let back: ConversationTranscript = serde_json::from_str(&json).unwrap();
        assert_eq!(back, transcript);
    }
}
