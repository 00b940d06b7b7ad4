//! Mistral chat completions wire types

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::llm::core::{config::GenerationConfig, error::LlmError};
use crate::llm::sse::Delta;

/// Request body for `POST /v1/chat/completions`
///
/// Mistral has no frequency/presence penalty fields.
#[derive(Debug, Serialize)]
pub struct MistralRequest<'a> {
    pub model: Option<&'a str>,
    pub messages: Vec<MistralMessage<'a>>,
    pub temperature: f32,
    pub max_tokens: u32,
    pub top_p: f32,
    pub stream: bool,
}

/// One chat message in the request
#[derive(Debug, Serialize)]
pub struct MistralMessage<'a> {
    pub role: &'static str,
    pub content: &'a str,
}

impl<'a> MistralRequest<'a> {
    pub fn new(prompt: &'a str, config: &'a GenerationConfig, stream: bool) -> Self {
        Self {
            model: config.model.as_deref(),
            messages: vec![MistralMessage {
                role: "user",
                content: prompt,
            }],
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            top_p: config.top_p,
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
    let mut body = serde_json::to_value(MistralRequest::new(prompt, config, stream))?;
    config.merge_into(&mut body);
    Ok(body)
}

/// Non-streaming response body
#[derive(Debug, Deserialize)]
pub struct MistralResponse {
    pub choices: Vec<MistralChoice>,
}

#[derive(Debug, Deserialize)]
pub struct MistralChoice {
    pub message: MistralResponseMessage,
}

#[derive(Debug, Deserialize)]
pub struct MistralResponseMessage {
    pub content: Option<String>,
}

impl MistralResponse {
    /// Text of the first choice
    pub fn into_text(self) -> Option<String> {
        self.choices.into_iter().next()?.message.content
    }
}

/// One streamed chunk (`data:` payload)
#[derive(Debug, Deserialize)]
pub struct MistralChunk {
    #[serde(default)]
    pub choices: Vec<MistralChunkChoice>,
}

#[derive(Debug, Deserialize)]
pub struct MistralChunkChoice {
    #[serde(default)]
    pub delta: MistralChunkDelta,
}

#[derive(Debug, Default, Deserialize)]
pub struct MistralChunkDelta {
    pub content: Option<String>,
}

/// Pull the text delta out of a streamed chunk
pub fn extract_delta(payload: &str) -> Delta {
    let Ok(chunk) = serde_json::from_str::<MistralChunk>(payload) else {
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

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_build_body() {
        let config = GenerationConfig::default()
            .with_model("mistral-small-latest")
            .with_option("safe_prompt", true);
        let body = build_body("Bonjour", &config, false).unwrap();

        assert_eq!(body["model"], json!("mistral-small-latest"));
        assert_eq!(body["messages"][0]["content"], json!("Bonjour"));
        assert_eq!(body["safe_prompt"], json!(true));
        assert!(body.get("frequency_penalty").is_none());
    }

    #[test]
    fn test_extract_delta() {
        assert_eq!(
            extract_delta(
                r#"{"id":"a","object":"chat.completion.chunk","choices":[{"index":0,"delta":{"content":"Salut"},"finish_reason":null}]}"#
            ),
            Delta::Text("Salut".to_string())
        );
        assert_eq!(extract_delta(r#"{"choices":[]}"#), Delta::Skip);
    }
}
