//! Eval command handler.

use clap::Args;
use cotrag_core::{AppError, AppResult};
use std::path::PathBuf;

/// Score predictions against gold references (ROUGE-L, BLEU-1/2)
#[derive(Args, Debug)]
pub struct EvalCommand {
    /// JSONL with {"query", "final_answer"} lines, e.g. a run log
    #[arg(long)]
    pub pred: PathBuf,

    /// JSONL with {"query", "reference"} lines
    #[arg(long)]
    pub gold: PathBuf,
}

impl EvalCommand {
    /// Execute the eval command.
    pub fn execute(&self) -> AppResult<()> {
        tracing::info!("Executing eval command");

        let report = cotrag_eval::evaluate(&self.pred, &self.gold)
            .map_err(|e| AppError::Other(format!("{:#}", e)))?;

        if report.n == 0 {
            println!("No matching queries between pred and gold.");
            return Ok(());
        }

        println!("{}", serde_json::to_string_pretty(&report)?);
        Ok(())
    }
}
