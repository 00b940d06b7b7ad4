//! LLM Abstraction Layer
//!
//! This module provides a unified interface for chat-completion calls to
//! OpenAI, Anthropic, Mistral and Cohere. Each vendor client implements
//! [`LlmProvider`]; [`create_provider`] picks one by name.

pub mod core;
mod http;
pub mod sse;
pub mod openai;
pub mod anthropic;
pub mod mistral;
pub mod cohere;

// Re-export commonly used types
pub use core::{
    config::GenerationConfig,
    error::LlmError,
    provider::{create_provider, create_provider_for, LlmProvider, TextStream},
    types::{Message, MessageRole, ProviderKind},
};

pub use anthropic::AnthropicClient;
pub use cohere::CohereClient;
pub use mistral::MistralClient;
pub use openai::OpenAiClient;
