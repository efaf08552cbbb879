//! Search command handler.
//!
//! Retrieval only: no model calls and nothing written to the run log.

use clap::Args;
use cotrag_core::{config::AppConfig, AppResult};
use cotrag_knowledge::{check_docs_dir, load_corpus, IndexOptions, LexicalIndex};

/// Show the passages a question would retrieve
#[derive(Args, Debug)]
pub struct SearchCommand {
    /// Query text
    pub query: String,

    /// Number of passages to return (default: retrieval.topK)
    #[arg(short = 'k', long)]
    pub top_k: Option<usize>,

    /// Print hits as JSON
    #[arg(long)]
    pub json: bool,
}

impl SearchCommand {
    /// Execute the search command.
    pub fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing search command");

        let docs_dir = config.docs_dir();
        check_docs_dir(&docs_dir)?;

        let options = IndexOptions {
            snippet_chars: config.retrieval.snippet_chars,
            ..IndexOptions::default()
        };
        let index = LexicalIndex::build_with(load_corpus(&docs_dir), &options);
        let hits = index.search(&self.query, self.top_k.unwrap_or(config.retrieval.top_k));

        if self.json {
            println!("{}", serde_json::to_string_pretty(&hits)?);
            return Ok(());
        }

        if hits.is_empty() {
            println!("No documents indexed under {:?}", docs_dir);
            return Ok(());
        }

        for (rank, hit) in hits.iter().enumerate() {
            println!("{}. {} (score={:.3})", rank + 1, hit.id, hit.score);
            let preview: String = hit.snippet.chars().take(200).collect();
            println!("   {}", preview.replace('\n', " "));
        }

        Ok(())
    }
}
