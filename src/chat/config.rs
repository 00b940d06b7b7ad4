//! Conversation configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::llm::LlmError;

/// Default system prompt
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant.";

/// Default number of past exchanges rendered into the prompt
pub const DEFAULT_MAX_HISTORY: usize = 10;

/// Settings for a [`Conversation`](super::Conversation)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversationConfig {
    /// Instructions placed at the top of every prompt
    pub system_prompt: String,
    /// Free-form background placed after the system prompt
    pub context: Option<String>,
    /// Number of most recent exchanges rendered into the prompt
    pub max_history: usize,
    /// Entities document
    pub entities_file: PathBuf,
    /// History document
    pub history_file: PathBuf,
}

impl ConversationConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_system_prompt(mut self, system_prompt: impl Into<String>) -> Self {
        self.system_prompt = system_prompt.into();
        self
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn with_max_history(mut self, max_history: usize) -> Self {
        self.max_history = max_history;
        self
    }

    pub fn with_entities_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.entities_file = path.into();
        self
    }

    pub fn with_history_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.history_file = path.into();
        self
    }

    /// Keep both documents in `dir` under their default file names
    pub fn with_data_dir(self, dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        self.with_entities_file(dir.join("chatbot_entities.json"))
            .with_history_file(dir.join("chatbot_history.json"))
    }

    /// # Errors
    ///
    /// Returns [`LlmError::Configuration`] if `max_history` is zero.
    pub fn validate(&self) -> Result<(), LlmError> {
        if self.max_history == 0 {
            return Err(LlmError::Configuration(
                "max_history must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self {
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            context: None,
            max_history: DEFAULT_MAX_HISTORY,
            entities_file: PathBuf::from("chatbot_entities.json"),
            history_file: PathBuf::from("chatbot_history.json"),
        }
    }
}
