//! Prompts command handler.

use clap::Args;
use cotrag_core::{config::AppConfig, AppResult};
use cotrag_prompt::{list_prompts, loader::prompts_dir, COT_PROMPT_ID};

/// List prompt overrides present in the workspace
#[derive(Args, Debug)]
pub struct PromptsCommand {}

impl PromptsCommand {
    /// Execute the prompts command.
    pub fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing prompts command");

        let ids = list_prompts(&config.workspace)?;
        if ids.is_empty() {
            println!(
                "No prompt overrides in {:?} (using built-in {})",
                prompts_dir(&config.workspace),
                COT_PROMPT_ID
            );
            return Ok(());
        }

        for id in ids {
            let marker = if id == COT_PROMPT_ID { " (active)" } else { "" };
            println!("{}{}", id, marker);
        }
        Ok(())
    }
}
