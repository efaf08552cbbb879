//! Corpus and retrieval type definitions.

use serde::{Deserialize, Serialize};

/// A source document read from the corpus directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    /// Document identifier (the path as walked)
    pub id: String,

    /// Full document text
    pub text: String,
}

impl Document {
    /// Create a new document.
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
        }
    }
}

/// One ranked retrieval result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hit {
    /// Document identifier
    #[serde(rename = "path")]
    pub id: String,

    /// Cosine similarity in [0, 1]
    pub score: f32,

    /// Bounded-length prefix of the document text
    pub snippet: String,
}

/// Take at most `max_chars` characters from the start of `text`.
pub fn snippet(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((end, _)) => text[..end].to_string(),
        None => text.to_string(),
    }
}
