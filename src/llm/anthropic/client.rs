//! Anthropic client implementation

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use tracing::debug;

use crate::llm::core::{
    config::GenerationConfig,
    error::LlmError,
    provider::{api_key_from_env, LlmProvider, TextStream},
    types::ProviderKind,
};
use crate::llm::{http, sse};

use super::types::{build_body, extract_delta, MessagesResponse};

/// Name used in error text
pub const PROVIDER_NAME: &str = "Anthropic";

/// Messages endpoint
pub const DEFAULT_URL: &str = "https://api.anthropic.com/v1/messages";

/// Value of the `anthropic-version` header
pub const API_VERSION: &str = "2023-06-01";

/// Client for the Anthropic Messages API
pub struct AnthropicClient {
    /// HTTP client for making requests
    http_client: Client,
    /// Sent as `x-api-key`
    api_key: String,
    /// Endpoint URL
    url: String,
    /// Generation parameters
    config: GenerationConfig,
}

impl AnthropicClient {
    /// Create a new Anthropic client with an explicit API key
    ///
    /// # Errors
    ///
    /// Returns [`LlmError::Configuration`] if the config is out of range.
    pub fn new(config: GenerationConfig, api_key: impl Into<String>) -> Result<Self, LlmError> {
        config.validate()?;
        Ok(Self {
            http_client: http::default_client()?,
            api_key: api_key.into(),
            url: DEFAULT_URL.to_string(),
            config,
        })
    }

    /// Create a new Anthropic client using `ANTHROPIC_API_KEY`
    pub fn from_env(config: GenerationConfig) -> Result<Self, LlmError> {
        let api_key = api_key_from_env(ProviderKind::Anthropic.api_key_var())?;
        Self::new(config, api_key)
    }

    /// Point the client at a different endpoint
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    /// Use a caller-configured HTTP client
    pub fn with_http_client(mut self, http_client: Client) -> Self {
        self.http_client = http_client;
        self
    }

    /// Endpoint URL requests are sent to
    pub fn url(&self) -> &str {
        &self.url
    }

    fn build_request(&self, prompt: &str, stream: bool) -> Result<RequestBuilder, LlmError> {
        let body = build_body(prompt, &self.config, stream)?;
        debug!(provider = PROVIDER_NAME, url = %self.url, stream, "sending request");

        Ok(self
            .http_client
            .post(&self.url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .header("Content-Type", "application/json")
            .json(&body))
    }
}

#[async_trait]
impl LlmProvider for AnthropicClient {
    fn name(&self) -> &'static str {
        PROVIDER_NAME
    }

    fn config(&self) -> &GenerationConfig {
        &self.config
    }

    async fn try_generate(&self, prompt: &str) -> Result<String, LlmError> {
        let request = self.build_request(prompt, false)?;
        let response: MessagesResponse = http::send_json(PROVIDER_NAME, request).await?;

        response
            .into_text()
            .map(|text| text.trim().to_string())
            .ok_or_else(|| LlmError::ResponseParse {
                provider: PROVIDER_NAME,
                message: "no text in first content block".to_string(),
            })
    }

    fn generate_stream(&self, prompt: &str) -> TextStream {
        match self.build_request(prompt, true) {
            Ok(request) => sse::text_stream(PROVIDER_NAME, request, extract_delta),
            Err(e) => sse::error_stream(e.into_stream_error(PROVIDER_NAME)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_invalid_top_p() {
        let result = AnthropicClient::new(GenerationConfig::default().with_top_p(-0.5), "key");
        assert!(matches!(result, Err(LlmError::Configuration(_))));
    }

    #[test]
    fn test_default_url() {
        let client = AnthropicClient::new(GenerationConfig::default(), "key").unwrap();
        assert_eq!(client.url(), DEFAULT_URL);
        assert_eq!(client.name(), "Anthropic");
    }
}
