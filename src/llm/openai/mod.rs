//! OpenAI provider implementation
//!
//! This module provides a client for OpenAI's chat completions API,
//! implementing the LlmProvider trait.

pub mod client;
pub mod types;

// Re-export main types for convenience
pub use client::OpenAiClient;
