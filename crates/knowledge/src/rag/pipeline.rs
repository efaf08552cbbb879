//! Run orchestration: retrieve, sample, vote, record.

use crate::corpus::{check_docs_dir, load_corpus};
use crate::index::{IndexOptions, LexicalIndex};
use crate::rag::consensus::tally;
use crate::rag::context::build_context;
use crate::rag::runlog::RunLog;
use crate::rag::sampler::ReasoningSampler;
use crate::rag::types::{ConsensusResult, RunMeta};
use chrono::{SecondsFormat, Utc};
use cotrag_core::{AppConfig, AppError, AppResult};
use cotrag_llm::{create_client_from_config, LlmClient};
use cotrag_prompt::{resolve_prompt, COT_PROMPT_ID};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Answers queries end to end and records every completed run.
pub struct Pipeline {
    index: Arc<LexicalIndex>,
    sampler: ReasoningSampler,
    run_log: RunLog,
    query_timeout: Option<Duration>,
}

impl Pipeline {
    /// Assemble a pipeline from ready-made parts.
    pub fn new(index: Arc<LexicalIndex>, sampler: ReasoningSampler, run_log: RunLog) -> Self {
        Self {
            index,
            sampler,
            run_log,
            query_timeout: None,
        }
    }

    /// Abort a run, and log nothing, once this much time has passed.
    pub fn with_query_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.query_timeout = timeout;
        self
    }

    /// Build a pipeline for the configured provider.
    pub fn from_config(config: &AppConfig) -> AppResult<Self> {
        let client = create_client_from_config(config)?;
        Self::with_client(config, client)
    }

    /// Build a pipeline from configuration with an injected model client.
    ///
    /// Loads the corpus, builds the index once, and resolves the prompt
    /// (workspace override or built-in).
    pub fn with_client(config: &AppConfig, client: Arc<dyn LlmClient>) -> AppResult<Self> {
        let docs_dir = config.docs_dir();
        check_docs_dir(&docs_dir)?;
        let documents = load_corpus(&docs_dir);
        let options = IndexOptions {
            snippet_chars: config.retrieval.snippet_chars,
            ..IndexOptions::default()
        };
        let index = LexicalIndex::build_with(documents, &options);

        tracing::info!(
            "Indexed {} documents ({} terms) from {:?}",
            index.len(),
            index.vocabulary_size(),
            docs_dir
        );

        let prompt = resolve_prompt(&config.workspace, COT_PROMPT_ID)?;
        let sampler = ReasoningSampler::new(client, config.model.clone())
            .with_max_tokens(config.sampling.max_tokens)
            .with_concurrency(config.sampling.concurrency)
            .with_prompt(prompt);

        let run_log = RunLog::new(&config.results_dir());

        Ok(Self::new(Arc::new(index), sampler, run_log).with_query_timeout(
            config.sampling.query_timeout_secs.map(Duration::from_secs),
        ))
    }

    /// The shared read-only index.
    pub fn index(&self) -> &Arc<LexicalIndex> {
        &self.index
    }

    pub fn run_log(&self) -> &RunLog {
        &self.run_log
    }

    /// Answer one query.
    ///
    /// The result is appended to the run log only when every step succeeded.
    /// Model failures propagate unchanged; a missed deadline returns
    /// [`AppError::Cancelled`].
    pub async fn run(
        &self,
        query: &str,
        k: usize,
        n: usize,
        temperature: f32,
    ) -> AppResult<ConsensusResult> {
        let start = Instant::now();
        let timestamp = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
        let run_id = uuid::Uuid::new_v4().to_string();

        tracing::info!(run_id = %run_id, k, n, temperature, "Running query: {}", query);

        let retrieval = self.index.search(query, k);
        if let Some(top) = retrieval.first() {
            tracing::debug!(
                "Retrieved {} passages (top: {} score={:.3})",
                retrieval.len(),
                top.id,
                top.score
            );
        } else {
            tracing::warn!("No passages retrieved, sampling with an empty context");
        }

        let context = build_context(&retrieval);
        let sampling = self.sampler.sample(query, &context, n, temperature);
        let samples = match self.query_timeout {
            Some(limit) => tokio::time::timeout(limit, sampling).await.map_err(|_| {
                tracing::warn!(run_id = %run_id, "Query deadline of {:?} elapsed", limit);
                AppError::Cancelled(format!("query exceeded {:?}", limit))
            })??,
            None => sampling.await?,
        };

        let votes = tally(&samples);
        let final_answer = votes.first().map(|vote| vote.answer.clone());
        if final_answer.is_none() {
            tracing::warn!(run_id = %run_id, "No samples drawn, no answer");
        }

        let result = ConsensusResult {
            query: query.to_string(),
            retrieval,
            samples,
            votes,
            final_answer,
            meta: RunMeta {
                run_id,
                timestamp,
                k,
                n_samples: n,
                temperature,
                backend: self.sampler.backend().to_string(),
                model: self.sampler.model().to_string(),
                duration_ms: start.elapsed().as_millis() as u64,
            },
        };

        self.run_log.append(&result)?;

        tracing::info!(
            run_id = %result.meta.run_id,
            duration_ms = result.meta.duration_ms,
            "Consensus: {:?}",
            result.final_answer
        );

        Ok(result)
    }
}
