//! Context block serialization.

use crate::types::Hit;

/// Separator placed between passages.
pub const PASSAGE_SEPARATOR: &str = "\n\n---\n\n";

/// Render one hit as a labelled passage.
pub fn format_passage(hit: &Hit) -> String {
    format!("[Source: {} | score={:.3}]\n{}", hit.id, hit.score, hit.snippet)
}

/// Serialize ranked hits into the context block given to the model.
///
/// No hits gives an empty block.
pub fn build_context(hits: &[Hit]) -> String {
    hits.iter()
        .map(format_passage)
        .collect::<Vec<_>>()
        .join(PASSAGE_SEPARATOR)
}
