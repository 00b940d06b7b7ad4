//! Anthropic provider implementation
//!
//! This module provides a client for Anthropic's Messages API,
//! implementing the LlmProvider trait.

pub mod client;
pub mod types;

// Re-export commonly used types
pub use client::AnthropicClient;
