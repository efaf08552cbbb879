//! Retrieval and consensus answering for cotrag.
//!
//! Documents are indexed with TF-IDF, the best passages become the context
//! for several chain-of-thought samples, and a majority vote picks the
//! answer. Each completed run is appended to a JSONL run log.

pub mod analyzer;
pub mod corpus;
pub mod index;
pub mod rag;
pub mod types;

#[cfg(test)]
mod tests;

// Re-export commonly used types
pub use corpus::{check_docs_dir, load_corpus};
pub use index::{IndexOptions, LexicalIndex};
pub use rag::{
    aggregate, build_context, parse_sample, tally, ConsensusResult, Pipeline, ReasoningSampler,
    RunLog, RunMeta, Sample, SampleKind, Vote,
};
pub use types::{Document, Hit};
