pub mod adapters;
pub mod api;
pub mod client_trait;
pub mod error;
pub mod masking;

pub use api::client::{ChatClient, ENHANCE_INSTRUCTION, ENHANCE_TEMPERATURE, SYSTEM_PREAMBLE};
pub use api::transport::HttpTransport;
pub use client_trait::CompletionTransport;
pub use error::{ChatError, MissingSetting};
pub use masking::mask_secret;
