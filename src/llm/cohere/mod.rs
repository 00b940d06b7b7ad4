//! Cohere provider implementation (v2 chat API)

pub mod client;
pub mod types;

pub use client::CohereClient;
