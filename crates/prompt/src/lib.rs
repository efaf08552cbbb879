//! Prompt system for cotrag.
//!
//! This crate provides structured prompt management with:
//! - A built-in chain-of-thought answering prompt
//! - YAML-based workspace overrides
//! - Handlebars template rendering

pub mod builder;
pub mod defaults;
pub mod loader;
pub mod types;

// Re-export main types
pub use builder::build_prompt;
pub use defaults::{cot_prompt, COT_PROMPT_ID};
pub use loader::{list_prompts, load_prompt, resolve_prompt};
pub use types::{BuiltPrompt, BuiltPromptMetadata, PromptDefinition, PromptOutputSpec};
