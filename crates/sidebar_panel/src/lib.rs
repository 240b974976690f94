//! # Sidebar Panel
//!
//! The chat panel talks to the core only through typed messages:
//! - `protocol` - the inbound/outbound message envelope
//! - `bridge` - the actor that applies inbound messages to a session
//! - `host` - editor-side collaborator (clipboard, insertion, prompts)
//! - `render` - HTML fragments for a transcript

pub mod bridge;
pub mod host;
pub mod protocol;
pub mod render;

pub use bridge::{PanelBridge, PanelError, PanelHandle};
pub use host::{EditorHost, HostError};
pub use protocol::{InboundMessage, OutboundMessage};
pub use render::{render_transcript, render_turn};
