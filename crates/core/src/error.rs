//! Error types for cotrag.
//!
//! This module defines a unified error enum that covers every failure class
//! of the retrieval-and-consensus pipeline: configuration, I/O, model
//! backends, corpus handling, prompts, and query cancellation.

use thiserror::Error;

/// Unified error type for cotrag.
///
/// All fallible library functions return `Result<T, AppError>`.
/// Recoverable conditions (an unreadable document, a malformed model
/// completion) never surface here; they are absorbed where they occur.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The model backend could not be reached (connection refused, timeout)
    #[error("LLM backend unreachable: {0}")]
    LlmUnavailable(String),

    /// The model backend answered, but with an error status or an unreadable body
    #[error("LLM backend error: {0}")]
    LlmBackend(String),

    /// Corpus and index errors
    #[error("Knowledge error: {0}")]
    Knowledge(String),

    /// Prompt system errors
    #[error("Prompt error: {0}")]
    Prompt(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// The query was cancelled or ran past its deadline
    #[error("Query cancelled: {0}")]
    Cancelled(String),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

impl AppError {
    /// Whether this error came from the model transport layer.
    pub fn is_llm(&self) -> bool {
        matches!(self, AppError::LlmUnavailable(_) | AppError::LlmBackend(_))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;
