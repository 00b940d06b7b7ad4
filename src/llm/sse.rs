//! Server-Sent Events (SSE) decoding shared by all providers
//!
//! Every supported vendor frames streaming responses as lines of the form
//! `data: <json>`. This module:
//! 1. Buffers incoming bytes and splits them into lines
//! 2. Keeps only `data:` lines
//! 3. Stops at the `[DONE]` sentinel
//! 4. Hands the payload to a vendor-specific extractor
//! 5. Yields the extracted text deltas in arrival order

use async_stream::stream;
use bytes::Bytes;
use futures::stream::Stream;
use futures::StreamExt;
use pin_utils::pin_mut;
use reqwest::RequestBuilder;
use std::fmt::Display;
use tracing::{debug, warn};

use crate::llm::core::{error::LlmError, provider::TextStream};
use crate::llm::http;

/// Sentinel payload marking the end of an OpenAI-style stream
pub const DONE_MARKER: &str = "[DONE]";

/// Classification of one `data:` payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delta {
    /// Incremental text to forward to the caller
    Text(String),
    /// Vendor end-of-message event; no further chunks
    End,
    /// Anything else, including payloads that are not valid JSON
    Skip,
}

/// Vendor-specific payload classifier
pub type DeltaExtractor = fn(&str) -> Delta;

/// Send a streaming request and yield its text deltas lazily
///
/// Nothing is sent until the returned stream is first polled. If the request
/// cannot be established, or the body fails mid-read, exactly one chunk
/// describing the failure is yielded and the stream ends.
pub(crate) fn text_stream(
    provider: &'static str,
    request: RequestBuilder,
    extract: DeltaExtractor,
) -> TextStream {
    Box::pin(stream! {
        debug!(provider, "opening stream");
        let response = match http::send(provider, request).await {
            Ok(response) => response,
            Err(e) => {
                let err = e.into_stream_error(provider);
                warn!(provider, error = %err, "stream request failed");
                yield err.to_string();
                return;
            }
        };

        let deltas = text_deltas(provider, response.bytes_stream(), extract);
        pin_mut!(deltas);
        while let Some(text) = deltas.next().await {
            yield text;
        }
    })
}

/// A stream that yields one error description and ends
///
/// Used when a streaming request cannot even be built.
pub(crate) fn error_stream(err: LlmError) -> TextStream {
    Box::pin(futures::stream::once(async move { err.to_string() }))
}

/// Decode a byte stream of SSE lines into text deltas
///
/// Lines may be split across chunks; bytes are buffered until a newline
/// arrives so multi-byte characters are never cut. A trailing line without
/// a newline is still processed when the body ends.
pub(crate) fn text_deltas<S, E>(
    provider: &'static str,
    byte_stream: S,
    extract: DeltaExtractor,
) -> impl Stream<Item = String> + Send
where
    S: Stream<Item = Result<Bytes, E>> + Send,
    E: Display + Send,
{
    stream! {
        pin_mut!(byte_stream);
        let mut buffer: Vec<u8> = Vec::new();

        while let Some(chunk) = byte_stream.next().await {
            let chunk = match chunk {
                Ok(bytes) => bytes,
                Err(e) => {
                    let err = LlmError::Stream { provider, message: e.to_string() };
                    warn!(provider, error = %err, "stream interrupted");
                    yield err.to_string();
                    return;
                }
            };
            buffer.extend_from_slice(&chunk);

            while let Some(newline_pos) = buffer.iter().position(|b| *b == b'\n') {
                let line: Vec<u8> = buffer.drain(..=newline_pos).collect();
                match classify_line(&line, extract) {
                    Delta::Text(text) => yield text,
                    Delta::End => return,
                    Delta::Skip => {}
                }
            }
        }

        if let Delta::Text(text) = classify_line(&buffer, extract) {
            yield text;
        }
    }
}

/// Classify a single raw line
fn classify_line(line: &[u8], extract: DeltaExtractor) -> Delta {
    let Ok(line) = std::str::from_utf8(line) else {
        return Delta::Skip;
    };
    let Some(payload) = data_payload(line.trim()) else {
        return Delta::Skip;
    };
    if payload == DONE_MARKER {
        return Delta::End;
    }
    extract(payload)
}

/// Extract the payload of a `data:` line
///
/// Other SSE fields (`event:`, `id:`, comments) return `None`.
pub fn data_payload(line: &str) -> Option<&str> {
    line.strip_prefix("data:").map(str::trim)
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;
    use serde_json::Value;

    fn extract_text(payload: &str) -> Delta {
        match serde_json::from_str::<Value>(payload) {
            Ok(value) => match value.get("text").and_then(Value::as_str) {
                Some(text) => Delta::Text(text.to_string()),
                None if value.get("stop").is_some() => Delta::End,
                None => Delta::Skip,
            },
            Err(_) => Delta::Skip,
        }
    }

    async fn collect(chunks: Vec<&'static str>) -> Vec<String> {
        let byte_stream = stream::iter(
            chunks
                .into_iter()
                .map(|c| Ok::<_, std::io::Error>(Bytes::from_static(c.as_bytes()))),
        );
        text_deltas("Test", byte_stream, extract_text).collect().await
    }

    #[test]
    fn test_data_payload() {
        assert_eq!(data_payload("data: {\"a\":1}"), Some("{\"a\":1}"));
        assert_eq!(data_payload("data:[DONE]"), Some("[DONE]"));
        assert_eq!(data_payload("event: message_start"), None);
        assert_eq!(data_payload(": keep-alive"), None);
    }

    #[tokio::test]
    async fn test_yields_deltas_in_order() {
        let chunks = collect(vec![
            "data: {\"text\":\"Hel\"}\n\ndata: {\"text\":\"lo\"}\n\n",
        ])
        .await;
        assert_eq!(chunks, vec!["Hel", "lo"]);
    }

    #[tokio::test]
    async fn test_stops_at_done_marker() {
        let chunks = collect(vec![
            "data: {\"text\":\"a\"}\n",
            "data: [DONE]\n",
            "data: {\"text\":\"never\"}\n",
        ])
        .await;
        assert_eq!(chunks, vec!["a"]);
    }

    #[tokio::test]
    async fn test_stops_at_vendor_end_event() {
        let chunks = collect(vec![
            "data: {\"text\":\"a\"}\ndata: {\"stop\":true}\ndata: {\"text\":\"b\"}\n",
        ])
        .await;
        assert_eq!(chunks, vec!["a"]);
    }

    #[tokio::test]
    async fn test_skips_malformed_and_non_data_lines() {
        let chunks = collect(vec![
            "event: delta\ndata: {not json}\n: comment\ndata: {\"other\":1}\ndata: {\"text\":\"ok\"}\n",
        ])
        .await;
        assert_eq!(chunks, vec!["ok"]);
    }

    #[tokio::test]
    async fn test_handles_lines_split_across_chunks() {
        let chunks = collect(vec!["data: {\"te", "xt\":\"joined\"}", "\n"]).await;
        assert_eq!(chunks, vec!["joined"]);
    }

    #[tokio::test]
    async fn test_handles_multibyte_split_across_chunks() {
        // "é" is 0xC3 0xA9
        let byte_stream = stream::iter(vec![
            Ok::<_, std::io::Error>(Bytes::from_static(b"data: {\"text\":\"caf\xC3")),
            Ok(Bytes::from_static(b"\xA9\"}\n")),
        ]);
        let chunks: Vec<String> = text_deltas("Test", byte_stream, extract_text).collect().await;
        assert_eq!(chunks, vec!["café"]);
    }

    #[tokio::test]
    async fn test_processes_trailing_line_without_newline() {
        let chunks = collect(vec!["data: {\"text\":\"tail\"}"]).await;
        assert_eq!(chunks, vec!["tail"]);
    }

    #[tokio::test]
    async fn test_transport_error_yields_single_error_chunk() {
        let byte_stream = stream::iter(vec![
            Ok(Bytes::from_static(b"data: {\"text\":\"partial\"}\n")),
            Err("connection reset".to_string()),
            Ok(Bytes::from_static(b"data: {\"text\":\"unreachable\"}\n")),
        ]);
        let chunks: Vec<String> = text_deltas("Test", byte_stream, extract_text).collect().await;
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0], "partial");
        assert_eq!(chunks[1], "Error during Test streaming: connection reset");
    }
}
