//! Shared HTTP plumbing for provider clients

use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

use crate::llm::core::error::LlmError;

/// Build the default HTTP client used by provider clients
///
/// Only a connect timeout is set. Callers that need an overall request
/// timeout pass their own client via `with_http_client`.
pub(crate) fn default_client() -> Result<Client, LlmError> {
    Client::builder()
        .connect_timeout(Duration::from_secs(5))
        .build()
        .map_err(|e| LlmError::Configuration(format!("Failed to create HTTP client: {}", e)))
}

/// Send a request and reject non-2xx responses
///
/// The error message carries the status code and the response body.
pub(crate) async fn send(
    provider: &'static str,
    request: RequestBuilder,
) -> Result<Response, LlmError> {
    let response = request
        .send()
        .await
        .map_err(|e| LlmError::transport(provider, e))?;

    let status = response.status();
    debug!(provider, status = status.as_u16(), "received response");
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(LlmError::Adapter {
            provider,
            message: format!("status {}: {}", status.as_u16(), body.trim()),
        });
    }

    Ok(response)
}

/// Send a request and decode the JSON response body
///
/// A body that does not match `T` is reported as
/// [`LlmError::ResponseParse`] rather than a transport failure.
pub(crate) async fn send_json<T: DeserializeOwned>(
    provider: &'static str,
    request: RequestBuilder,
) -> Result<T, LlmError> {
    let response = send(provider, request).await?;
    let body = response
        .text()
        .await
        .map_err(|e| LlmError::transport(provider, e))?;

    serde_json::from_str(&body).map_err(|e| LlmError::ResponseParse {
        provider,
        message: e.to_string(),
    })
}
