//! LLM provider implementations.

pub mod mock;
pub mod ollama;
pub mod openai;

pub use mock::MockClient;
pub use ollama::OllamaClient;
pub use openai::OpenAiClient;

use cotrag_core::AppError;
use std::time::Duration;

/// Build a reqwest client with a per-request timeout.
pub(crate) fn http_client(timeout: Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .unwrap_or_else(|e| {
            tracing::warn!("Falling back to default HTTP client: {}", e);
            reqwest::Client::new()
        })
}

/// Map a failed send to the transport error class.
///
/// Timeouts and connection failures mean the backend is unreachable;
/// anything else reqwest reports on send is treated the same way since no
/// response was received.
pub(crate) fn send_error(provider: &str, err: reqwest::Error) -> AppError {
    let reason = if err.is_timeout() {
        "timed out"
    } else if err.is_connect() {
        "connection failed"
    } else {
        "request failed"
    };
    AppError::LlmUnavailable(format!("{} {}: {}", provider, reason, err))
}

/// Turn a non-success HTTP status into a backend error.
pub(crate) async fn check_status(
    provider: &str,
    response: reqwest::Response,
) -> Result<reqwest::Response, AppError> {
    if response.status().is_success() {
        return Ok(response);
    }

    let status = response.status();
    let error_text = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());
    Err(AppError::LlmBackend(format!(
        "{} API error ({}): {}",
        provider, status, error_text
    )))
}
