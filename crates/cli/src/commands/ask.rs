//! Ask command handler.
//!
//! Runs the full pipeline: retrieve, sample, vote, and record the run.

use clap::Args;
use cotrag_core::{config::AppConfig, AppError, AppResult};
use cotrag_knowledge::{ConsensusResult, Pipeline};

/// Answer a question over the workspace documents
#[derive(Args, Debug)]
pub struct AskCommand {
    /// The question to answer
    pub question: String,

    /// Number of passages to retrieve (default: retrieval.topK)
    #[arg(short = 'k', long)]
    pub top_k: Option<usize>,

    /// Number of chain-of-thought samples (default: sampling.samples)
    #[arg(short = 'n', long)]
    pub samples: Option<usize>,

    /// Sampling temperature (default: sampling.temperature)
    #[arg(short = 't', long)]
    pub temperature: Option<f32>,

    /// Print the full result as JSON
    #[arg(long)]
    pub json: bool,
}

impl AskCommand {
    /// Execute the ask command.
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing ask command");
        tracing::debug!("Ask command options: {:?}", self);

        if self.question.trim().is_empty() {
            return Err(AppError::Config("No question provided".to_string()));
        }

        config.validate()?;

        let k = self.top_k.unwrap_or(config.retrieval.top_k);
        let n = self.samples.unwrap_or(config.sampling.samples);
        let temperature = self.temperature.unwrap_or(config.sampling.temperature);

        let pipeline = Pipeline::from_config(config)?;
        let result = pipeline.run(&self.question, k, n, temperature).await?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&result)?);
        } else {
            print_result(&result);
        }

        tracing::debug!("Run recorded in {:?}", pipeline.run_log().path());
        Ok(())
    }
}

fn print_result(result: &ConsensusResult) {
    match &result.final_answer {
        Some(answer) => println!("Answer: {}", answer),
        None => println!("No answer: no samples were drawn."),
    }

    if !result.votes.is_empty() {
        println!();
        println!("Votes:");
        for vote in &result.votes {
            println!("  {:>3}  {}", vote.count, vote.answer);
        }
    }

    if !result.retrieval.is_empty() {
        println!();
        println!("Sources:");
        for hit in &result.retrieval {
            println!("  {:.3}  {}", hit.score, hit.id);
        }
    }
}
