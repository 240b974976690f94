//! chat_core - Core types for the FlowForge chat panel
//!
//! This crate provides the foundational types used across the workspace:
//! - `message` - Role, ConversationTurn, ConversationTranscript
//! - `config` - user Settings and how they are loaded
//! - `markdown` - fenced code block extraction and HTML escaping
//! - `encryption` - at-rest protection for the stored access token

pub mod config;
pub mod encryption;
pub mod markdown;
pub mod message;
pub mod paths;

// Re-export commonly used types
pub use config::{Settings, SettingsUpdate};
pub use markdown::{extract, CodeBlock, Extraction, Segment};
pub use message::{ConversationTranscript, ConversationTurn, Role};
