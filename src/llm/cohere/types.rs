//! Cohere v2 chat wire types

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::llm::core::{config::GenerationConfig, error::LlmError};
use crate::llm::sse::Delta;

/// Request body for `POST /v2/chat`
#[derive(Debug, Serialize)]
pub struct CohereChatRequest<'a> {
    pub model: Option<&'a str>,
    pub messages: Vec<CohereMessage<'a>>,
    pub temperature: f32,
    pub max_tokens: u32,
    /// Nucleus sampling; Cohere names it `p`
    pub p: f32,
    pub stream: bool,
}

/// A message whose content is a list of typed parts
#[derive(Debug, Serialize)]
pub struct CohereMessage<'a> {
    pub role: &'static str,
    pub content: Vec<CohereContent<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CohereContent<'a> {
    Text { text: &'a str },
}

impl<'a> CohereChatRequest<'a> {
    pub fn new(prompt: &'a str, config: &'a GenerationConfig, stream: bool) -> Self {
        Self {
            model: config.model.as_deref(),
            messages: vec![CohereMessage {
                role: "user",
                content: vec![CohereContent::Text { text: prompt }],
            }],
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            p: config.top_p,
            stream,
        }
    }
}

pub fn build_body(
    prompt: &str,
    config: &GenerationConfig,
    stream: bool,
) -> Result<Value, LlmError> {
    let mut body = serde_json::to_value(CohereChatRequest::new(prompt, config, stream))?;
    config.merge_into(&mut body);
    Ok(body)
}

/// Non-streaming response: `{"message": {"content": [{"type": "text", "text": ...}]}}`
#[derive(Debug, Deserialize)]
pub struct CohereChatResponse {
    pub message: CohereResponseMessage,
}

#[derive(Debug, Deserialize)]
pub struct CohereResponseMessage {
    #[serde(default)]
    pub content: Vec<CohereResponseContent>,
}

#[derive(Debug, Deserialize)]
pub struct CohereResponseContent {
    pub text: Option<String>,
}

impl CohereChatResponse {
    pub fn into_text(self) -> Option<String> {
        self.message.content.into_iter().next()?.text
    }
}

/// Streaming event payload
///
/// v2 events carry text at `delta.message.content.text` on `content-delta`
/// events and finish with `message-end`. A bare top-level `text` field
/// (older stream format) is also accepted.
#[derive(Debug, Deserialize)]
pub struct CohereStreamEvent {
    #[serde(rename = "type")]
    pub event_type: Option<String>,
    pub delta: Option<CohereStreamDelta>,
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CohereStreamDelta {
    pub message: Option<CohereStreamMessage>,
}

#[derive(Debug, Deserialize)]
pub struct CohereStreamMessage {
    pub content: Option<CohereStreamContent>,
}

#[derive(Debug, Deserialize)]
pub struct CohereStreamContent {
    pub text: Option<String>,
}

/// Pull the text delta out of a streamed event
pub fn extract_delta(payload: &str) -> Delta {
    let Ok(event) = serde_json::from_str::<CohereStreamEvent>(payload) else {
        return Delta::Skip;
    };
    if event.event_type.as_deref() == Some("message-end") {
        return Delta::End;
    }

    let text = event
        .delta
        .and_then(|delta| delta.message)
        .and_then(|message| message.content)
        .and_then(|content| content.text)
        .or(event.text);

    match text {
        Some(text) if !text.is_empty() => Delta::Text(text),
        _ => Delta::Skip,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_build_body_uses_p_and_content_parts() {
        let config = GenerationConfig::default()
            .with_model("command-r-plus")
            .with_top_p(0.75);
        let body = build_body("Hello", &config, false).unwrap();

        assert_eq!(body["model"], json!("command-r-plus"));
        assert_eq!(
            body["messages"],
            json!([{"role": "user", "content": [{"type": "text", "text": "Hello"}]}])
        );
        assert_eq!(body["p"], json!(0.75));
        assert!(body.get("top_p").is_none());
    }

    #[test]
    fn test_response_into_text() {
        let response: CohereChatResponse = serde_json::from_str(
            r#"{"id":"c1","finish_reason":"COMPLETE","message":{"role":"assistant","content":[{"type":"text","text":"Hi!"}]}}"#,
        )
        .unwrap();
        assert_eq!(response.into_text().as_deref(), Some("Hi!"));
    }

    #[test]
    fn test_response_missing_message_fails_to_parse() {
        assert!(serde_json::from_str::<CohereChatResponse>(r#"{"text":"v1 shape"}"#).is_err());
    }

    #[test]
    fn test_extract_delta_v2() {
        assert_eq!(
            extract_delta(
                r#"{"type":"content-delta","index":0,"delta":{"message":{"content":{"text":"Hey"}}}}"#
            ),
            Delta::Text("Hey".to_string())
        );
        assert_eq!(
            extract_delta(
                r#"{"type":"content-start","index":0,"delta":{"message":{"content":{"type":"text","text":""}}}}"#
            ),
            Delta::Skip
        );
        assert_eq!(
            extract_delta(r#"{"type":"message-start","id":"c1","delta":{"message":{"role":"assistant"}}}"#),
            Delta::Skip
        );
        assert_eq!(
            extract_delta(r#"{"type":"message-end","delta":{"finish_reason":"COMPLETE"}}"#),
            Delta::End
        );
    }

    #[test]
    fn test_extract_delta_top_level_text() {
        assert_eq!(
            extract_delta(r#"{"event_type":"text-generation","text":"legacy"}"#),
            Delta::Text("legacy".to_string())
        );
    }
}
