#![allow(dead_code)]

use async_trait::async_trait;
use chatbridge::chat::{Conversation, ConversationConfig};
use chatbridge::llm::{GenerationConfig, LlmError, LlmProvider, TextStream};
use std::sync::{Arc, Mutex};

/// Provider that returns canned text and records the prompts it receives
pub struct ScriptedProvider {
    config: GenerationConfig,
    reply: String,
    chunks: Vec<String>,
    prompts: Arc<Mutex<Vec<String>>>,
}

impl ScriptedProvider {
    pub fn new(reply: &str, chunks: &[&str]) -> Self {
        Self {
            config: GenerationConfig::default(),
            reply: reply.to_string(),
            chunks: chunks.iter().map(|c| c.to_string()).collect(),
            prompts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Shared handle to the prompts seen so far
    pub fn prompts(&self) -> Arc<Mutex<Vec<String>>> {
        Arc::clone(&self.prompts)
    }
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    fn name(&self) -> &'static str {
        "Scripted"
    }

    fn config(&self) -> &GenerationConfig {
        &self.config
    }

    async fn try_generate(&self, prompt: &str) -> Result<String, LlmError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        Ok(self.reply.clone())
    }

    fn generate_stream(&self, prompt: &str) -> TextStream {
        self.prompts.lock().unwrap().push(prompt.to_string());
        Box::pin(futures::stream::iter(self.chunks.clone()))
    }
}

/// Conversation config storing both documents inside `dir`
pub fn config_in(dir: &tempfile::TempDir) -> ConversationConfig {
    ConversationConfig::new().with_data_dir(dir.path())
}

/// Conversation over a [`ScriptedProvider`] with state in `dir`
pub fn scripted_conversation(
    dir: &tempfile::TempDir,
    reply: &str,
    chunks: &[&str],
) -> Conversation {
    Conversation::new(Box::new(ScriptedProvider::new(reply, chunks)), config_in(dir))
        .expect("valid conversation config")
}
