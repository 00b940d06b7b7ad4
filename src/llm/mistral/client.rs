//! Mistral client implementation

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

use super::types::{build_body, extract_delta, MistralResponse};

/// Name used in error text
pub const PROVIDER_NAME: &str = "Mistral";

/// Chat completions endpoint
pub const DEFAULT_URL: &str = "https://api.mistral.ai/v1/chat/completions";

/// Client for the Mistral chat completions API
pub struct MistralClient {
    /// HTTP client for making requests
    http_client: Client,
    /// Bearer token
    api_key: String,
    /// Endpoint URL
    url: String,
    /// Generation parameters
    config: GenerationConfig,
}

impl MistralClient {
    /// Create a new Mistral client with an explicit API key
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

    /// Create a new Mistral client using `MISTRAL_API_KEY`
    pub fn from_env(config: GenerationConfig) -> Result<Self, LlmError> {
        let api_key = api_key_from_env(ProviderKind::Mistral.api_key_var())?;
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
            .bearer_auth(&self.api_key)
            .header("Content-Type", "application/json")
            .json(&body))
    }
}

#[async_trait]
impl LlmProvider for MistralClient {
    fn name(&self) -> &'static str {
        PROVIDER_NAME
    }

    fn config(&self) -> &GenerationConfig {
        &self.config
    }

    async fn try_generate(&self, prompt: &str) -> Result<String, LlmError> {
        let request = self.build_request(prompt, false)?;
        let response: MistralResponse = http::send_json(PROVIDER_NAME, request).await?;

        response
            .into_text()
            .map(|text| text.trim().to_string())
            .ok_or_else(|| LlmError::ResponseParse {
                provider: PROVIDER_NAME,
                message: "no message content in first choice".to_string(),
            })
    }

    fn generate_stream(&self, prompt: &str) -> TextStream {
        match self.build_request(prompt, true) {
            Ok(request) => sse::text_stream(PROVIDER_NAME, request, extract_delta),
            Err(e) => sse::error_stream(e.into_stream_error(PROVIDER_NAME)),
        }
    }
}
