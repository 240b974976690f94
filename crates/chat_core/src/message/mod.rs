//! Message module - Conversation types
//!
//! Shared conversation types used across the system.

mod turn;

pub use turn::{ConversationTranscript, ConversationTurn, Role};
