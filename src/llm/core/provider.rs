//! Provider trait for LLM implementations

use async_trait::async_trait;
use futures::stream::Stream;
use std::pin::Pin;
use tracing::warn;

use super::{config::GenerationConfig, error::LlmError, types::ProviderKind};
use crate::llm::anthropic::AnthropicClient;
use crate::llm::cohere::CohereClient;
use crate::llm::mistral::MistralClient;
use crate::llm::openai::OpenAiClient;

/// Lazy, finite sequence of text chunks produced by a streaming call
pub type TextStream = Pin<Box<dyn Stream<Item = String> + Send>>;

/// Main interface that all LLM provider implementations must satisfy
///
/// Implementations translate a flat prompt into one vendor HTTP call. They
/// hold no conversation state.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Display name used in error text (e.g. "OpenAI")
    fn name(&self) -> &'static str;

    /// Generation parameters this provider was constructed with
    fn config(&self) -> &GenerationConfig;

    /// Generate a complete response
    ///
    /// Returns the vendor text trimmed of surrounding whitespace.
    ///
    /// # Errors
    ///
    /// [`LlmError::Adapter`] on transport failure or a non-2xx status,
    /// [`LlmError::ResponseParse`] when the body lacks the expected fields.
    async fn try_generate(&self, prompt: &str) -> Result<String, LlmError>;

    /// Stream the response as text deltas
    ///
    /// No request is sent until the stream is first polled. If the request
    /// fails, the stream yields a single error description and ends.
    fn generate_stream(&self, prompt: &str) -> TextStream;

    /// Generate a complete response, describing any failure as text
    async fn generate(&self, prompt: &str) -> String {
        match self.try_generate(prompt).await {
            Ok(text) => text,
            Err(err) => {
                warn!(provider = self.name(), error = %err, "generation failed");
                err.to_string()
            }
        }
    }
}

/// Create an LLM provider from a provider name
///
/// The name is matched case-insensitively against [`ProviderKind::ALL`].
/// The vendor credential is read from the environment.
///
/// # Example
///
/// ```rust,no_run
/// use chatbridge::llm::{create_provider, GenerationConfig, LlmProvider};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let provider = create_provider("OpenAI", GenerationConfig::default().with_model("gpt-4o-mini"))?;
/// assert_eq!(provider.name(), "OpenAI");
/// # Ok(())
/// # }
/// ```
///
/// # Errors
///
/// [`LlmError::UnsupportedProvider`] for an unknown name, or
/// [`LlmError::Configuration`] if the config is invalid or the credential
/// is missing.
pub fn create_provider(
    name: &str,
    config: GenerationConfig,
) -> Result<Box<dyn LlmProvider>, LlmError> {
    let kind: ProviderKind = name.parse()?;
    create_provider_for(kind, config)
}

/// Create an LLM provider for an already-selected vendor
pub fn create_provider_for(
    kind: ProviderKind,
    config: GenerationConfig,
) -> Result<Box<dyn LlmProvider>, LlmError> {
    match kind {
        ProviderKind::OpenAi => Ok(Box::new(OpenAiClient::from_env(config)?)),
        ProviderKind::Anthropic => Ok(Box::new(AnthropicClient::from_env(config)?)),
        ProviderKind::Mistral => Ok(Box::new(MistralClient::from_env(config)?)),
        ProviderKind::Cohere => Ok(Box::new(CohereClient::from_env(config)?)),
    }
}

/// Read a vendor credential from the process environment
pub(crate) fn api_key_from_env(var: &str) -> Result<String, LlmError> {
    match std::env::var(var) {
        Ok(key) if !key.trim().is_empty() => Ok(key),
        _ => Err(LlmError::Configuration(format!(
            "{} is missing from the environment",
            var
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_provider_is_rejected_before_credentials() {
        let err = create_provider("palm", GenerationConfig::default()).err().unwrap();
        match err {
            LlmError::UnsupportedProvider { name, valid } => {
                assert_eq!(name, "palm");
                assert_eq!(valid, vec!["openai", "anthropic", "mistral", "cohere"]);
            }
            other => panic!("Expected UnsupportedProvider, got {:?}", other),
        }
    }

    #[test]
    fn test_api_key_from_env_missing() {
        let err = api_key_from_env("CHATBRIDGE_TEST_KEY_THAT_IS_NEVER_SET").unwrap_err();
        assert!(matches!(err, LlmError::Configuration(_)));
        assert!(err
            .to_string()
            .contains("CHATBRIDGE_TEST_KEY_THAT_IS_NEVER_SET"));
    }
}
