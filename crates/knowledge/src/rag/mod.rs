//! Chain-of-thought answering over retrieved context.
//!
//! A run retrieves passages, draws several independent reasoning samples,
//! and settles on the answer most samples agree on.

pub mod consensus;
pub mod context;
pub mod parse;
pub mod pipeline;
pub mod runlog;
pub mod sampler;
pub mod types;

pub use consensus::{aggregate, tally};
pub use context::build_context;
pub use parse::parse_sample;
pub use pipeline::Pipeline;
pub use runlog::RunLog;
pub use sampler::ReasoningSampler;
pub use types::{ConsensusResult, RunMeta, Sample, SampleKind, Vote};
