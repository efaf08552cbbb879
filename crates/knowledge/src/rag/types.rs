//! Sample, vote, and run result types.

use crate::types::Hit;
use serde::{Deserialize, Serialize};

/// How a sample's fields were obtained from the raw completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SampleKind {
    /// Parsed from a JSON object in the completion
    Structured,

    /// Raw completion text used for both fields
    Unstructured,
}

/// One chain-of-thought generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sample {
    /// Step-by-step reasoning
    pub reasoning: String,

    /// Short answer that takes part in the vote
    pub final_answer: String,

    /// Parse path that produced this sample
    pub kind: SampleKind,
}

impl Sample {
    /// Create a sample parsed from structured output.
    pub fn structured(reasoning: impl Into<String>, final_answer: impl Into<String>) -> Self {
        Self {
            reasoning: reasoning.into(),
            final_answer: final_answer.into(),
            kind: SampleKind::Structured,
        }
    }

    /// Create a fallback sample from raw text.
    pub fn unstructured(text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            reasoning: text.clone(),
            final_answer: text,
            kind: SampleKind::Unstructured,
        }
    }
}

/// A distinct answer and the number of samples that gave it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vote {
    pub answer: String,
    pub count: usize,
}

/// Parameters and timing of one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunMeta {
    /// Unique run identifier (UUID v4)
    pub run_id: String,

    /// RFC 3339 UTC timestamp of the run start
    pub timestamp: String,

    pub k: usize,
    pub n_samples: usize,
    pub temperature: f32,

    /// Provider name of the model client
    pub backend: String,

    pub model: String,

    /// Wall-clock duration of the run
    pub duration_ms: u64,
}

/// Everything a run produced. One JSON line in the run log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsensusResult {
    pub query: String,

    /// Ranked retrieval hits
    pub retrieval: Vec<Hit>,

    /// Samples in issue order
    pub samples: Vec<Sample>,

    /// Vote table in ranking order
    pub votes: Vec<Vote>,

    /// Winning answer, `None` when there were no samples
    pub final_answer: Option<String>,

    pub meta: RunMeta,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unstructured_sample_duplicates_text() {
        let sample = Sample::unstructured("blah blah");
        assert_eq!(sample.reasoning, "blah blah");
        assert_eq!(sample.final_answer, "blah blah");
        assert_eq!(sample.kind, SampleKind::Unstructured);
    }

    #[test]
    fn test_sample_kind_serialization() {
        let json = serde_json::to_string(&Sample::structured("r", "a")).unwrap();
        assert!(json.contains("\"kind\":\"structured\""));
    }

    #[test]
    fn test_no_answer_serializes_as_null() {
        let result = ConsensusResult {
            query: "q".to_string(),
            retrieval: Vec::new(),
            samples: Vec::new(),
            votes: Vec::new(),
            final_answer: None,
            meta: RunMeta {
                run_id: "id".to_string(),
                timestamp: "2024-01-01T00:00:00Z".to_string(),
                k: 6,
                n_samples: 0,
                temperature: 0.7,
                backend: "mock".to_string(),
                model: "llama3".to_string(),
                duration_ms: 0,
            },
        };

        let value = serde_json::to_value(&result).unwrap();
        assert!(value["final_answer"].is_null());
        assert_eq!(value["meta"]["n_samples"], 0);
    }
}
