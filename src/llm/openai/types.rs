//! OpenAI chat completions wire types

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::llm::core::{config::GenerationConfig, error::LlmError};
use crate::llm::sse::Delta;

/// Request body for `POST /v1/chat/completions`
#[derive(Debug, Serialize)]
pub struct ChatCompletionRequest<'a> {
    /// Model identifier (serialized as `null` when unset)
    pub model: Option<&'a str>,
    /// Single-turn conversation
    pub messages: Vec<ChatMessage<'a>>,
    pub temperature: f32,
    pub max_tokens: u32,
    pub top_p: f32,
    pub frequency_penalty: f32,
    pub presence_penalty: f32,
    /// Whether the response is streamed as SSE
    pub stream: bool,
}

/// A message in the OpenAI format
#[derive(Debug, Serialize)]
pub struct ChatMessage<'a> {
    pub role: &'static str,
    pub content: &'a str,
}

impl<'a> ChatCompletionRequest<'a> {
    /// Wrap a flat prompt as a single user turn
    pub fn new(prompt: &'a str, config: &'a GenerationConfig, stream: bool) -> Self {
        Self {
            model: config.model.as_deref(),
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            top_p: config.top_p,
            frequency_penalty: config.frequency_penalty,
            presence_penalty: config.presence_penalty,
            stream,
        }
    }
}

/// Build the JSON body, with `extra_options` merged over the standard fields
pub fn build_body(
    prompt: &str,
    config: &GenerationConfig,
    stream: bool,
) -> Result<Value, LlmError> {
    let mut body = serde_json::to_value(ChatCompletionRequest::new(prompt, config, stream))?;
    config.merge_into(&mut body);
    Ok(body)
}

/// Non-streaming response body
#[derive(Debug, Deserialize)]
pub struct ChatCompletionResponse {
    pub choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
pub struct Choice {
    pub message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
pub struct ResponseMessage {
    pub content: Option<String>,
}

impl ChatCompletionResponse {
    /// Text of the first choice
    pub fn into_text(self) -> Option<String> {
        self.choices.into_iter().next()?.message.content
    }
}

/// One streamed chunk (`data:` payload)
#[derive(Debug, Deserialize)]
pub struct ChatCompletionChunk {
    #[serde(default)]
    pub choices: Vec<ChunkChoice>,
}

#[derive(Debug, Deserialize)]
pub struct ChunkChoice {
    #[serde(default)]
    pub delta: ChunkDelta,
}

#[derive(Debug, Default, Deserialize)]
pub struct ChunkDelta {
    pub content: Option<String>,
}

/// Pull the text delta out of a streamed chunk
pub fn extract_delta(payload: &str) -> Delta {
    let Ok(chunk) = serde_json::from_str::<ChatCompletionChunk>(payload) else {
        return Delta::Skip;
    };
    match chunk
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.delta.content)
    {
        Some(text) if !text.is_empty() => Delta::Text(text),
        _ => Delta::Skip,
    }
}
