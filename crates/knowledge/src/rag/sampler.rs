//! Chain-of-thought sampling with bounded parallelism.

use crate::rag::parse::parse_sample;
use crate::rag::types::Sample;
use cotrag_core::{AppError, AppResult};
use cotrag_llm::{LlmClient, LlmRequest};
use cotrag_prompt::{build_prompt, cot_prompt, PromptDefinition};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// Default number of sample calls in flight.
pub const DEFAULT_CONCURRENCY: usize = 4;

/// Default completion budget per sample.
pub const DEFAULT_MAX_TOKENS: u32 = 700;

/// Draws independent chain-of-thought samples from a model client.
#[derive(Clone)]
pub struct ReasoningSampler {
    client: Arc<dyn LlmClient>,
    model: String,
    max_tokens: u32,
    concurrency: usize,
    prompt: PromptDefinition,
}

impl ReasoningSampler {
    /// Create a sampler using the built-in chain-of-thought prompt.
    pub fn new(client: Arc<dyn LlmClient>, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
            max_tokens: DEFAULT_MAX_TOKENS,
            concurrency: DEFAULT_CONCURRENCY,
            prompt: cot_prompt(),
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Cap the number of concurrent calls. Zero is treated as one.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Replace the prompt definition (e.g. a workspace override).
    pub fn with_prompt(mut self, prompt: PromptDefinition) -> Self {
        self.prompt = prompt;
        self
    }

    /// Provider name of the underlying client.
    pub fn backend(&self) -> &str {
        self.client.provider_name()
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Issue `n` generation calls and parse each completion.
    ///
    /// Samples come back in issue order. The first failing call aborts the
    /// calls still in flight and its error is returned. Malformed output is
    /// never an error.
    pub async fn sample(
        &self,
        query: &str,
        context: &str,
        n: usize,
        temperature: f32,
    ) -> AppResult<Vec<Sample>> {
        if n == 0 {
            return Ok(Vec::new());
        }

        let mut variables = HashMap::new();
        variables.insert("question".to_string(), query.to_string());
        variables.insert("context".to_string(), context.to_string());
        let built = build_prompt(&self.prompt, variables)?;

        let mut request = LlmRequest::new(built.user, self.model.clone())
            .with_temperature(temperature)
            .with_max_tokens(self.max_tokens);
        if let Some(system) = built.system {
            request = request.with_system(system);
        }
        let request = Arc::new(request);

        tracing::debug!(
            n,
            concurrency = self.concurrency,
            backend = self.backend(),
            "Dispatching sample calls"
        );

        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut tasks = JoinSet::new();

        for index in 0..n {
            let client = Arc::clone(&self.client);
            let request = Arc::clone(&request);
            let semaphore = Arc::clone(&semaphore);

            tasks.spawn(async move {
                let _permit = semaphore
                    .acquire_owned()
                    .await
                    .map_err(|e| AppError::Other(format!("Sampler semaphore closed: {}", e)))?;
                let response = client.complete(&request).await?;
                Ok::<_, AppError>((index, parse_sample(&response.content)))
            });
        }

        let mut slots: Vec<Option<Sample>> = vec![None; n];
        while let Some(joined) = tasks.join_next().await {
            let (index, sample) = joined
                .map_err(|e| AppError::Other(format!("Sample task failed: {}", e)))??;
            tracing::trace!(index, kind = ?sample.kind, "Sample resolved");
            slots[index] = Some(sample);
        }

        slots
            .into_iter()
            .collect::<Option<Vec<_>>>()
            .ok_or_else(|| AppError::Other("Sample task ended without a result".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rag::types::SampleKind;
    use cotrag_llm::MockClient;
    use std::time::Duration;

    const STRUCTURED: &str = r#"{"reasoning":"Step 1","final_answer":"architecture"}"#;

    #[tokio::test]
    async fn test_sample_returns_n_in_issue_order() {
        let client = Arc::new(MockClient::with_responses([
            r#"{"reasoning":"r0","final_answer":"a0"}"#,
            r#"{"reasoning":"r1","final_answer":"a1"}"#,
            "plain text",
        ]));
        // One call at a time makes the mock's reply order match issue order
        let sampler = ReasoningSampler::new(client.clone(), "llama3").with_concurrency(1);

        let samples = sampler.sample("q", "ctx", 3, 0.7).await.unwrap();

        assert_eq!(samples.len(), 3);
        assert_eq!(samples[0].final_answer, "a0");
        assert_eq!(samples[1].final_answer, "a1");
        assert_eq!(samples[2].kind, SampleKind::Unstructured);
        assert_eq!(client.calls(), 3);
    }

    #[tokio::test]
    async fn test_prompt_embeds_question_and_context() {
        let client = Arc::new(MockClient::constant(STRUCTURED));
        let sampler = ReasoningSampler::new(client.clone(), "llama3");

        sampler
            .sample("What is Chicago known for?", "[Source: a | score=1.000]\nChicago", 1, 0.7)
            .await
            .unwrap();

        let prompts = client.prompts();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("Question: What is Chicago known for?"));
        assert!(prompts[0].contains("[Source: a | score=1.000]\nChicago"));
    }

    #[tokio::test]
    async fn test_zero_samples_makes_no_calls() {
        let client = Arc::new(MockClient::constant(STRUCTURED));
        let sampler = ReasoningSampler::new(client.clone(), "llama3");

        let samples = sampler.sample("q", "", 0, 0.7).await.unwrap();
        assert!(samples.is_empty());
        assert_eq!(client.calls(), 0);
    }

    #[tokio::test]
    async fn test_backend_failure_propagates() {
        let client = Arc::new(MockClient::unavailable("connection refused"));
        let sampler = ReasoningSampler::new(client, "llama3");

        match sampler.sample("q", "", 3, 0.7).await {
            Err(AppError::LlmUnavailable(msg)) => assert!(msg.contains("connection refused")),
            other => panic!("Expected LlmUnavailable, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_backend_error_is_distinct_from_parse_failure() {
        let client = Arc::new(MockClient::backend_error("500"));
        let sampler = ReasoningSampler::new(client, "llama3");
        assert!(matches!(
            sampler.sample("q", "", 1, 0.7).await,
            Err(AppError::LlmBackend(_))
        ));

        let client = Arc::new(MockClient::constant("not json at all"));
        let sampler = ReasoningSampler::new(client, "llama3");
        let samples = sampler.sample("q", "", 1, 0.7).await.unwrap();
        assert_eq!(samples[0].kind, SampleKind::Unstructured);
    }

    #[tokio::test]
    async fn test_calls_run_concurrently() {
        let client = Arc::new(
            MockClient::constant(STRUCTURED).with_delay(Duration::from_millis(200)),
        );
        let sampler = ReasoningSampler::new(client, "llama3").with_concurrency(4);

        let start = std::time::Instant::now();
        let samples = sampler.sample("q", "", 4, 0.7).await.unwrap();

        assert_eq!(samples.len(), 4);
        assert!(start.elapsed() < Duration::from_millis(700));
    }

    #[test]
    fn test_zero_concurrency_is_clamped() {
        let client = Arc::new(MockClient::constant(STRUCTURED));
        let sampler = ReasoningSampler::new(client, "llama3").with_concurrency(0);
        assert_eq!(sampler.concurrency, 1);
        assert_eq!(sampler.backend(), "mock");
    }
}
