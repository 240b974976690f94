use async_trait::async_trait;
use chat_core::Settings;
use log::{debug, error};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE, USER_AGENT};
use reqwest::{Client, Proxy};

use crate::api::models::{ApiErrorBody, ChatCompletionRequest, ChatCompletionResponse};
use crate::client_trait::CompletionTransport;
use crate::error::{ChatError, Result};

/// reqwest-backed transport. One attempt per call, transport default timeouts.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        Self::with_proxies(base_url, "", "")
    }

    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Self::with_proxies(&settings.api_base, &settings.http_proxy, &settings.https_proxy)
    }

    fn with_proxies(base_url: impl Into<String>, http_proxy: &str, https_proxy: &str) -> Result<Self> {
        let client = Self::build_http_client(http_proxy, https_proxy)?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn build_http_client(http_proxy: &str, https_proxy: &str) -> Result<Client> {
        let mut builder = Client::builder().default_headers(Self::default_headers());
        if !http_proxy.is_empty() {
            builder = builder.proxy(Proxy::http(http_proxy)?);
        }
        if !https_proxy.is_empty() {
            builder = builder.proxy(Proxy::https(https_proxy)?);
        }
        builder
            .build()
            .map_err(|e| ChatError::RequestFailed(format!("Failed to build HTTP client: {e}")))
    }

    pub fn default_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!("flowforge/", env!("CARGO_PKG_VERSION"))),
        );
        headers
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

#[async_trait]
impl CompletionTransport for HttpTransport {
    async fn complete(
        &self,
        api_key: &str,
        request: &ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse> {
        let url = self.completions_url();
        debug!(
            "POST {} model={} messages={}",
            url,
            request.model,
            request.messages.len()
        );

        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                error!("Failed to send chat completion request: {}", e);
                ChatError::RequestFailed(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let detail = serde_json::from_str::<ApiErrorBody>(&body)
                .map(ApiErrorBody::into_message)
                .unwrap_or_else(|_| format!("HTTP {status}: {body}"));
            error!("Chat completion failed with status {}: {}", status, detail);
            return Err(ChatError::RequestFailed(detail));
        }

        response.json::<ChatCompletionResponse>().await.map_err(|e| {
            error!("Failed to parse chat completion response: {}", e);
            ChatError::RequestFailed(format!("Invalid response body: {e}"))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trailing_slash_is_dropped() {
        let transport = HttpTransport::new("http://localhost:9/v1/").unwrap();
        assert_eq!(transport.base_url(), "http://localhost:9/v1");
        assert_eq!(transport.completions_url(), "http://localhost:9/v1/chat/completions");
    }

    #[test]
    fn test_invalid_proxy_is_reported() {
        let mut settings = Settings::default();
        settings.https_proxy = "not a url at all".into();
        assert!(matches!(
            HttpTransport::from_settings(&settings),
            Err(ChatError::RequestFailed(_))
        ));
    }
}
