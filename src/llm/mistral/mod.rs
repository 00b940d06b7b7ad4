//! Mistral provider implementation
//!
//! Mistral's chat completions API follows the OpenAI response shape but
//! has its own request schema.

pub mod client;
pub mod types;

pub use client::MistralClient;
