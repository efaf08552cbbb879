//! Command handlers for the cotrag CLI.
//!
//! This module organizes all CLI commands into separate submodules.

pub mod ask;
pub mod eval;
pub mod prompts;
pub mod search;

// Re-export command types for convenience
pub use ask::AskCommand;
pub use eval::EvalCommand;
pub use prompts::PromptsCommand;
pub use search::SearchCommand;
