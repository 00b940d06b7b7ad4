//! Stateful conversation layer
//!
//! [`Conversation`] owns the system prompt, context, history and entity
//! store. It:
//! - Builds a contextual prompt from the last `max_history` exchanges
//! - Delegates generation to any [`LlmProvider`]
//! - Records each completed exchange and rewrites the history document
//! - Streams responses chunk by chunk, recording them only once drained

mod error;

pub mod config;
pub mod prompt;
pub mod store;
pub mod types;

pub use config::{ConversationConfig, DEFAULT_SYSTEM_PROMPT};
pub use error::StoreError;
pub use store::JsonStore;
pub use types::{Attributes, Entity, HistoryEntry};

use async_stream::stream;
use futures::stream::Stream;
use futures::StreamExt;
use std::collections::BTreeMap;
use std::pin::Pin;
use tracing::{debug, error};

use crate::llm::{create_provider, GenerationConfig, LlmError, LlmProvider};

/// Stream of response chunks borrowed from a [`Conversation`]
pub type ChatStream<'a> = Pin<Box<dyn Stream<Item = String> + Send + 'a>>;

/// Result of [`Conversation::chat`]
pub enum ChatReply<'a> {
    /// Complete response text (already recorded)
    Text(String),
    /// Live chunks; recorded once the stream is exhausted
    Stream(ChatStream<'a>),
}

impl std::fmt::Debug for ChatReply<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChatReply::Text(text) => f.debug_tuple("Text").field(text).finish(),
            ChatReply::Stream(_) => f.write_str("Stream(..)"),
        }
    }
}

/// A conversation with persistent history and entities
pub struct Conversation {
    /// LLM provider used for every exchange
    provider: Box<dyn LlmProvider>,
    system_prompt: String,
    context: Option<String>,
    max_history: usize,
    /// Exchanges in creation order
    history: Vec<HistoryEntry>,
    /// Entities keyed by name
    entities: BTreeMap<String, Entity>,
    history_store: JsonStore<Vec<HistoryEntry>>,
    entity_store: JsonStore<BTreeMap<String, Entity>>,
}

impl Conversation {
    /// Create a conversation and load any persisted state
    ///
    /// A blank system prompt is replaced by [`DEFAULT_SYSTEM_PROMPT`].
    ///
    /// # Errors
    ///
    /// Returns [`LlmError::Configuration`] if the config is invalid. Missing
    /// or malformed documents are not errors; they load as empty.
    pub fn new(provider: Box<dyn LlmProvider>, config: ConversationConfig) -> Result<Self, LlmError> {
        config.validate()?;

        let history_store = JsonStore::new(config.history_file);
        let entity_store = JsonStore::new(config.entities_file);
        let history: Vec<HistoryEntry> = history_store.load();
        let entities: BTreeMap<String, Entity> = entity_store.load();

        debug!(
            provider = provider.name(),
            history = history.len(),
            entities = entities.len(),
            "loaded conversation state"
        );

        let system_prompt = if config.system_prompt.trim().is_empty() {
            DEFAULT_SYSTEM_PROMPT.to_string()
        } else {
            config.system_prompt
        };

        Ok(Self {
            provider,
            system_prompt,
            context: config.context,
            max_history: config.max_history,
            history,
            entities,
            history_store,
            entity_store,
        })
    }

    /// Create a conversation backed by a provider selected by name
    ///
    /// # Errors
    ///
    /// Returns [`LlmError::UnsupportedProvider`] for an unknown name, or
    /// [`LlmError::Configuration`] for invalid settings or a missing key.
    pub fn from_provider_name(
        provider_name: &str,
        generation: GenerationConfig,
        config: ConversationConfig,
    ) -> Result<Self, LlmError> {
        let provider = create_provider(provider_name, generation)?;
        Self::new(provider, config)
    }

    /// Render the full prompt for `query` without sending it
    pub fn build_prompt(&self, query: &str) -> String {
        prompt::build_prompt(
            &self.system_prompt,
            self.context.as_deref(),
            &self.history,
            self.max_history,
            query,
        )
    }

    /// Send `query`, either waiting for the full text or streaming it
    pub async fn chat(&mut self, query: &str, streaming: bool) -> ChatReply<'_> {
        if streaming {
            ChatReply::Stream(Box::pin(self.send_stream(query)))
        } else {
            ChatReply::Text(self.send(query).await)
        }
    }

    /// Send `query` and return the complete response
    ///
    /// Provider failures come back as descriptive text and are recorded
    /// like any other response.
    pub async fn send(&mut self, query: &str) -> String {
        debug!(query, "processing query");
        let prompt = self.build_prompt(query);
        let response = self.provider.generate(&prompt).await;
        self.record_exchange(query, response.as_str(), Attributes::new());
        response
    }

    /// Send `query` and stream the response
    ///
    /// Each chunk is forwarded as soon as the provider yields it. The
    /// exchange is recorded only after the provider stream is exhausted;
    /// dropping the returned stream early records nothing.
    pub fn send_stream(&mut self, query: &str) -> impl Stream<Item = String> + Send + '_ {
        let query = query.to_string();
        stream! {
            debug!(query = %query, "processing streaming query");
            let prompt = self.build_prompt(&query);
            let mut chunks = self.provider.generate_stream(&prompt);
            let mut full_response = String::new();

            while let Some(chunk) = chunks.next().await {
                full_response.push_str(&chunk);
                yield chunk;
            }

            self.record_exchange(query, full_response, Attributes::new());
        }
    }

    /// Append an exchange to the history and persist it
    pub fn record_exchange(
        &mut self,
        query: impl Into<String>,
        response: impl Into<String>,
        metadata: Attributes,
    ) -> &HistoryEntry {
        let entry = HistoryEntry::new(query, response).with_metadata(metadata);
        self.history.push(entry);
        self.persist_history();
        &self.history[self.history.len() - 1]
    }

    /// Add or replace the entity called `name`
    pub fn add_entity(&mut self, name: impl Into<String>, attributes: Attributes) -> Entity {
        let entity = Entity::new(name, attributes);
        self.entities.insert(entity.name.clone(), entity.clone());
        if let Err(e) = self.entity_store.save(&self.entities) {
            error!(path = %self.entity_store.path().display(), error = %e, "failed to save entities");
        }
        entity
    }

    /// Look up an entity by name
    pub fn get_entity(&self, name: &str) -> Option<&Entity> {
        self.entities.get(name)
    }

    /// Remove every history entry and persist the empty history
    pub fn clear_history(&mut self) {
        self.history.clear();
        self.persist_history();
    }

    /// All recorded exchanges, oldest first
    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    /// All entities keyed by name
    pub fn entities(&self) -> &BTreeMap<String, Entity> {
        &self.entities
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    pub fn context(&self) -> Option<&str> {
        self.context.as_deref()
    }

    /// Replace the free-form context used in later prompts
    pub fn set_context(&mut self, context: Option<String>) {
        self.context = context;
    }

    pub fn max_history(&self) -> usize {
        self.max_history
    }

    pub fn provider(&self) -> &dyn LlmProvider {
        self.provider.as_ref()
    }

    fn persist_history(&self) {
        if let Err(e) = self.history_store.save(&self.history) {
            error!(path = %self.history_store.path().display(), error = %e, "failed to save history");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::TextStream;
    use async_trait::async_trait;
    use serde_json::json;

    struct EchoProvider {
        config: GenerationConfig,
    }

    #[async_trait]
    impl LlmProvider for EchoProvider {
        fn name(&self) -> &'static str {
            "Echo"
        }

        fn config(&self) -> &GenerationConfig {
            &self.config
        }

        async fn try_generate(&self, prompt: &str) -> Result<String, LlmError> {
            Ok(format!("echo:{}", prompt.lines().last().unwrap_or_default()))
        }

        fn generate_stream(&self, _prompt: &str) -> TextStream {
            Box::pin(futures::stream::iter(vec!["a".to_string(), "b".to_string()]))
        }
    }

    fn conversation(dir: &tempfile::TempDir) -> Conversation {
        let provider = Box::new(EchoProvider {
            config: GenerationConfig::default(),
        });
        Conversation::new(provider, ConversationConfig::new().with_data_dir(dir.path())).unwrap()
    }

    #[tokio::test]
    async fn test_chat_text_reply() {
        let dir = tempfile::tempdir().unwrap();
        let mut convo = conversation(&dir);

        match convo.chat("ping", false).await {
            ChatReply::Text(text) => assert_eq!(text, "echo:User: ping"),
            other => panic!("Expected text reply, got {:?}", other),
        }
        assert_eq!(convo.history().len(), 1);
    }

    #[tokio::test]
    async fn test_chat_stream_reply() {
        let dir = tempfile::tempdir().unwrap();
        let mut convo = conversation(&dir);

        let chunks: Vec<String> = match convo.chat("ping", true).await {
            ChatReply::Stream(stream) => stream.collect().await,
            other => panic!("Expected stream reply, got {:?}", other),
        };
        assert_eq!(chunks, vec!["a", "b"]);
        assert_eq!(convo.history()[0].response, "ab");
    }

    #[test]
    fn test_zero_max_history_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let provider = Box::new(EchoProvider {
            config: GenerationConfig::default(),
        });
        let result = Conversation::new(
            provider,
            ConversationConfig::new()
                .with_data_dir(dir.path())
                .with_max_history(0),
        );
        assert!(matches!(result, Err(LlmError::Configuration(_))));
    }

    #[test]
    fn test_record_exchange_with_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let mut convo = conversation(&dir);

        let mut metadata = Attributes::new();
        metadata.insert("source".to_string(), json!("import"));
        let entry = convo.record_exchange("q", "r", metadata).clone();

        assert_eq!(entry.metadata["source"], json!("import"));
        let reloaded = conversation(&dir);
        assert_eq!(reloaded.history(), &[entry]);
    }

    #[test]
    fn test_blank_system_prompt_falls_back_to_default() {
        let dir = tempfile::tempdir().unwrap();
        let provider = Box::new(EchoProvider {
            config: GenerationConfig::default(),
        });
        let convo = Conversation::new(
            provider,
            ConversationConfig::new()
                .with_data_dir(dir.path())
                .with_system_prompt("  "),
        )
        .unwrap();

        assert_eq!(convo.system_prompt(), DEFAULT_SYSTEM_PROMPT);
        assert!(convo
            .build_prompt("q")
            .starts_with("System: You are a helpful assistant.\n"));
    }

    #[test]
    fn test_set_context_changes_prompt() {
        let dir = tempfile::tempdir().unwrap();
        let mut convo = conversation(&dir);
        assert!(!convo.build_prompt("q").contains("Context:"));

        convo.set_context(Some("Planning a move".to_string()));
        assert!(convo.build_prompt("q").contains("Context: Planning a move\n"));
        assert_eq!(convo.context(), Some("Planning a move"));
    }
}
