//! Generation configuration parameters

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::error::LlmError;

/// Parameters for controlling text generation
///
/// Shared by every provider. Adapters validate the config when they are
/// constructed and never mutate it afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Model identifier; sent as `null` when unset
    pub model: Option<String>,
    /// Randomness (0.0-1.0, higher = more random)
    pub temperature: f32,
    /// Maximum number of tokens to generate
    pub max_tokens: u32,
    /// Nucleus sampling threshold (0.0-1.0)
    pub top_p: f32,
    /// Penalty for repeated tokens (OpenAI only)
    pub frequency_penalty: f32,
    /// Penalty for tokens already present (OpenAI only)
    pub presence_penalty: f32,
    /// Vendor-specific fields merged into every request body
    pub extra_options: Map<String, Value>,
}

impl GenerationConfig {
    /// Create a new configuration with the specified max tokens
    pub fn new(max_tokens: u32) -> Self {
        Self {
            max_tokens,
            ..Self::default()
        }
    }

    /// Set the model
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Set the temperature
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Set the top_p value
    pub fn with_top_p(mut self, top_p: f32) -> Self {
        self.top_p = top_p;
        self
    }

    /// Set the frequency penalty
    pub fn with_frequency_penalty(mut self, penalty: f32) -> Self {
        self.frequency_penalty = penalty;
        self
    }

    /// Set the presence penalty
    pub fn with_presence_penalty(mut self, penalty: f32) -> Self {
        self.presence_penalty = penalty;
        self
    }

    /// Add a vendor-specific option to every request body
    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra_options.insert(key.into(), value.into());
        self
    }

    /// Check parameter ranges
    ///
    /// # Errors
    ///
    /// Returns [`LlmError::Configuration`] if `temperature` or `top_p` lies
    /// outside `[0, 1]`, or if `max_tokens` is zero.
    pub fn validate(&self) -> Result<(), LlmError> {
        if !(0.0..=1.0).contains(&self.temperature) {
            return Err(LlmError::Configuration(format!(
                "temperature must be between 0 and 1, got {}",
                self.temperature
            )));
        }
        if !(0.0..=1.0).contains(&self.top_p) {
            return Err(LlmError::Configuration(format!(
                "top_p must be between 0 and 1, got {}",
                self.top_p
            )));
        }
        if self.max_tokens == 0 {
            return Err(LlmError::Configuration(
                "max_tokens must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Merge `extra_options` over a serialized request body
    ///
    /// Extra options win when a key collides with a standard field.
    pub(crate) fn merge_into(&self, body: &mut Value) {
        if let Value::Object(fields) = body {
            for (key, value) in &self.extra_options {
                fields.insert(key.clone(), value.clone());
            }
        }
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            model: None,
            temperature: 0.7,
            max_tokens: 1500,
            top_p: 0.9,
            frequency_penalty: 0.0,
            presence_penalty: 0.0,
            extra_options: Map::new(),
        }
    }
}
