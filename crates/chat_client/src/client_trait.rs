use async_trait::async_trait;

use crate::api::models::{ChatCompletionRequest, ChatCompletionResponse};
use crate::error::Result;

/// The wire seam of the chat client: one request in, one parsed response out.
#[async_trait]
pub trait CompletionTransport: Send + Sync {
    async fn complete(
        &self,
        api_key: &str,
        request: &ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse>;
}
