//! Error types for the LLM layer

use thiserror::Error;

/// Errors that can occur when using LLM providers
///
/// `Configuration` and `UnsupportedProvider` are returned from constructors
/// and the factory. The remaining variants describe generation failures;
/// [`LlmProvider::generate`](super::provider::LlmProvider::generate) and
/// `generate_stream` turn them into their display text.
#[derive(Debug, Error)]
pub enum LlmError {
    /// Invalid parameters or missing credentials
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Unknown provider name passed to the factory
    #[error("Unsupported provider '{name}'. Valid options are: {}", .valid.join(", "))]
    UnsupportedProvider { name: String, valid: Vec<String> },

    /// Network failure or non-2xx response
    #[error("Error during {provider} request: {message}")]
    Adapter {
        provider: &'static str,
        message: String,
    },

    /// Response body did not have the expected shape
    #[error("Error parsing {provider} API response: {message}")]
    ResponseParse {
        provider: &'static str,
        message: String,
    },

    /// Streaming request could not be established or continued
    #[error("Error during {provider} streaming: {message}")]
    Stream {
        provider: &'static str,
        message: String,
    },

    /// Request body encoding failure
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl LlmError {
    /// Build an adapter error from a transport failure
    pub(crate) fn transport(provider: &'static str, err: reqwest::Error) -> Self {
        let message = match err.status() {
            Some(status) => format!("status {}: {}", status.as_u16(), err),
            None => err.to_string(),
        };
        LlmError::Adapter { provider, message }
    }

    /// Convert a generation-time error into the terminal stream error
    pub(crate) fn into_stream_error(self, provider: &'static str) -> Self {
        match self {
            LlmError::Adapter { message, .. } | LlmError::ResponseParse { message, .. } => {
                LlmError::Stream { provider, message }
            }
            LlmError::Stream { .. } => self,
            other => LlmError::Stream {
                provider,
                message: other.to_string(),
            },
        }
    }
}

impl From<serde_json::Error> for LlmError {
    fn from(err: serde_json::Error) -> Self {
        LlmError::Serialization(err.to_string())
    }
}
