//! In-process mock provider.
//!
//! Replays scripted completions in order (cycling when exhausted), or fails
//! every call with a chosen transport error. Used as the model stub in tests.

use crate::client::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
use cotrag_core::{AppError, AppResult};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

#[derive(Debug, Clone)]
enum Behavior {
    Reply(Vec<String>),
    Unavailable(String),
    BackendError(String),
}

/// Mock client for testing.
#[derive(Debug)]
pub struct MockClient {
    behavior: Behavior,
    delay: Option<Duration>,
    calls: AtomicUsize,
    prompts: Mutex<Vec<String>>,
}

impl MockClient {
    /// Reply with `responses` in order, cycling when exhausted.
    pub fn with_responses<I, S>(responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::from_behavior(Behavior::Reply(
            responses.into_iter().map(Into::into).collect(),
        ))
    }

    /// Always reply with the same text.
    pub fn constant(response: impl Into<String>) -> Self {
        Self::with_responses([response.into()])
    }

    /// Fail every call as if the backend were unreachable.
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::from_behavior(Behavior::Unavailable(reason.into()))
    }

    /// Fail every call as if the backend returned an error status.
    pub fn backend_error(reason: impl Into<String>) -> Self {
        Self::from_behavior(Behavior::BackendError(reason.into()))
    }

    /// Sleep before answering each call.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Number of completed or attempted calls.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Prompts received so far, in arrival order.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts
            .lock()
            .map(|p| p.clone())
            .unwrap_or_default()
    }

    fn from_behavior(behavior: Behavior) -> Self {
        Self {
            behavior,
            delay: None,
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait::async_trait]
impl LlmClient for MockClient {
    fn provider_name(&self) -> &str {
        "mock"
    }

    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(request.prompt.clone());
        }

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let content = match &self.behavior {
            Behavior::Reply(responses) if responses.is_empty() => String::new(),
            Behavior::Reply(responses) => responses[call % responses.len()].clone(),
            Behavior::Unavailable(reason) => {
                return Err(AppError::LlmUnavailable(reason.clone()))
            }
            Behavior::BackendError(reason) => return Err(AppError::LlmBackend(reason.clone())),
        };

        Ok(LlmResponse {
            content,
            model: request.model.clone(),
            usage: LlmUsage::default(),
        })
    }
}
