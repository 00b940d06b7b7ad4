// LLM abstraction layer
pub mod llm;

// Conversation state, prompt assembly and persistence
pub mod chat;
