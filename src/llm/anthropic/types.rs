//! Anthropic Messages API wire types

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::llm::core::{config::GenerationConfig, error::LlmError};
use crate::llm::sse::Delta;

/// Request body for `POST /v1/messages`
#[derive(Debug, Serialize)]
pub struct MessagesRequest<'a> {
    pub model: Option<&'a str>,
    pub messages: Vec<AnthropicMessage<'a>>,
    pub max_tokens: u32,
    pub temperature: f32,
    pub top_p: f32,
    pub stream: bool,
}

/// A message in the Anthropic format
#[derive(Debug, Serialize)]
pub struct AnthropicMessage<'a> {
    pub role: &'static str,
    pub content: &'a str,
}

impl<'a> MessagesRequest<'a> {
    /// Wrap a flat prompt as a single user turn
    pub fn new(prompt: &'a str, config: &'a GenerationConfig, stream: bool) -> Self {
        Self {
            model: config.model.as_deref(),
            messages: vec![AnthropicMessage {
                role: "user",
                content: prompt,
            }],
            max_tokens: config.max_tokens,
            temperature: config.temperature,
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
    let mut body = serde_json::to_value(MessagesRequest::new(prompt, config, stream))?;
    config.merge_into(&mut body);
    Ok(body)
}

/// Non-streaming response body
#[derive(Debug, Deserialize)]
pub struct MessagesResponse {
    pub content: Vec<ResponseContentBlock>,
}

/// Content block in a response
#[derive(Debug, Deserialize)]
pub struct ResponseContentBlock {
    #[serde(rename = "type")]
    pub block_type: String,
    pub text: Option<String>,
}

impl MessagesResponse {
    /// Text of the first content block
    pub fn into_text(self) -> Option<String> {
        self.content.into_iter().next()?.text
    }
}

/// Streaming event payload
///
/// Only the fields needed to find text deltas are decoded:
/// ```text
/// data: {"type":"content_block_delta","index":0,"delta":{"type":"text_delta","text":"Hi"}}
/// data: {"type":"message_stop"}
/// ```
#[derive(Debug, Deserialize)]
pub struct StreamEventPayload {
    #[serde(rename = "type")]
    pub event_type: String,
    pub delta: Option<StreamDelta>,
}

#[derive(Debug, Deserialize)]
pub struct StreamDelta {
    pub text: Option<String>,
}

/// Pull the text delta out of a streamed event
pub fn extract_delta(payload: &str) -> Delta {
    let Ok(event) = serde_json::from_str::<StreamEventPayload>(payload) else {
        return Delta::Skip;
    };
    if event.event_type == "message_stop" {
        return Delta::End;
    }
    match event.delta.and_then(|delta| delta.text) {
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
        let config = GenerationConfig::new(512).with_model("claude-3-5-haiku-latest");
        let body = build_body("Hi", &config, true).unwrap();

        assert_eq!(body["model"], json!("claude-3-5-haiku-latest"));
        assert_eq!(body["messages"], json!([{"role": "user", "content": "Hi"}]));
        assert_eq!(body["max_tokens"], json!(512));
        assert_eq!(body["stream"], json!(true));
        // Anthropic does not accept OpenAI penalty fields
        assert!(body.get("frequency_penalty").is_none());
        assert!(body.get("presence_penalty").is_none());
    }

    #[test]
    fn test_response_into_text() {
        let response: MessagesResponse = serde_json::from_str(
            r#"{"id":"msg_1","type":"message","role":"assistant","content":[{"type":"text","text":"Hello"}],"stop_reason":"end_turn"}"#,
        )
        .unwrap();
        assert_eq!(response.into_text().as_deref(), Some("Hello"));
    }

    #[test]
    fn test_response_empty_content() {
        let response: MessagesResponse = serde_json::from_str(r#"{"content":[]}"#).unwrap();
        assert!(response.into_text().is_none());
    }

    #[test]
    fn test_extract_delta() {
        assert_eq!(
            extract_delta(
                r#"{"type":"content_block_delta","index":0,"delta":{"type":"text_delta","text":"Hi"}}"#
            ),
            Delta::Text("Hi".to_string())
        );
        assert_eq!(
            extract_delta(r#"{"type":"message_start","message":{"id":"msg_1"}}"#),
            Delta::Skip
        );
        assert_eq!(
            extract_delta(r#"{"type":"message_delta","delta":{"stop_reason":"end_turn"}}"#),
            Delta::Skip
        );
        assert_eq!(extract_delta(r#"{"type":"message_stop"}"#), Delta::End);
        assert_eq!(extract_delta(r#"{"type":"ping"}"#), Delta::Skip);
    }
}
