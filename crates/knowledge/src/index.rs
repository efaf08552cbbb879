//! TF-IDF lexical index.
//!
//! The vocabulary and per-document weight vectors are computed once from the
//! full corpus. Queries are projected into that vocabulary and scored by
//! cosine similarity against every document.

use crate::analyzer::analyze;
use crate::types::{snippet, Document, Hit};
use std::collections::HashMap;

/// Default maximum snippet length in characters.
pub const DEFAULT_SNIPPET_CHARS: usize = 800;

/// Terms in more than this fraction of documents are dropped.
pub const DEFAULT_MAX_DF: f32 = 0.9;

/// Sparse L2-normalized weight vector, sorted by term id.
type SparseVector = Vec<(u32, f32)>;

/// Index build options.
#[derive(Debug, Clone)]
pub struct IndexOptions {
    /// Maximum document-frequency ratio for a term to stay in the vocabulary
    pub max_df: f32,

    /// Snippet length for returned hits
    pub snippet_chars: usize,
}

impl Default for IndexOptions {
    fn default() -> Self {
        Self {
            max_df: DEFAULT_MAX_DF,
            snippet_chars: DEFAULT_SNIPPET_CHARS,
        }
    }
}

/// Read-only TF-IDF index over a fixed corpus.
#[derive(Debug, Clone)]
pub struct LexicalIndex {
    documents: Vec<Document>,
    vocabulary: HashMap<String, u32>,
    idf: Vec<f32>,
    vectors: Vec<SparseVector>,
    snippet_chars: usize,
}

impl LexicalIndex {
    /// Build an index with default options.
    pub fn build(documents: Vec<Document>) -> Self {
        Self::build_with(documents, &IndexOptions::default())
    }

    /// Build an index from the full corpus.
    ///
    /// An empty corpus produces an empty index whose searches return nothing.
    pub fn build_with(documents: Vec<Document>, options: &IndexOptions) -> Self {
        let n_docs = documents.len();
        let analyzed: Vec<Vec<String>> = documents.iter().map(|d| analyze(&d.text)).collect();

        // Document frequency, with terms numbered in first-seen order
        let mut candidate_ids: HashMap<&str, usize> = HashMap::new();
        let mut candidates: Vec<(&str, usize)> = Vec::new();
        for terms in &analyzed {
            let mut seen_here = std::collections::HashSet::new();
            for term in terms {
                if !seen_here.insert(term.as_str()) {
                    continue;
                }
                match candidate_ids.get(term.as_str()) {
                    Some(&i) => candidates[i].1 += 1,
                    None => {
                        candidate_ids.insert(term.as_str(), candidates.len());
                        candidates.push((term.as_str(), 1));
                    }
                }
            }
        }

        let max_doc_count = ((options.max_df * n_docs as f32).floor() as usize).max(1);

        let mut vocabulary = HashMap::new();
        let mut idf = Vec::new();
        for (term, df) in candidates {
            if df > max_doc_count {
                continue;
            }
            vocabulary.insert(term.to_string(), idf.len() as u32);
            idf.push(((1.0 + n_docs as f32) / (1.0 + df as f32)).ln() + 1.0);
        }

        let vectors = analyzed
            .iter()
            .map(|terms| weigh(terms, &vocabulary, &idf))
            .collect();

        tracing::debug!(
            "Built lexical index: {} documents, {} terms (max document count {})",
            n_docs,
            vocabulary.len(),
            max_doc_count
        );

        Self {
            documents,
            vocabulary,
            idf,
            vectors,
            snippet_chars: options.snippet_chars,
        }
    }

    /// Number of indexed documents.
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// Whether the index holds no documents.
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Number of vocabulary terms.
    pub fn vocabulary_size(&self) -> usize {
        self.vocabulary.len()
    }

    /// Return the `k` best documents for `query`.
    ///
    /// Hits are sorted by descending score; equal scores keep corpus order.
    pub fn search(&self, query: &str, k: usize) -> Vec<Hit> {
        if self.documents.is_empty() || k == 0 {
            return Vec::new();
        }

        let query_vector: HashMap<u32, f32> = weigh(&analyze(query), &self.vocabulary, &self.idf)
            .into_iter()
            .collect();

        let mut scored: Vec<(usize, f32)> = self
            .vectors
            .iter()
            .enumerate()
            .map(|(i, vector)| (i, cosine(vector, &query_vector)))
            .collect();

        // sort_by is stable, so ties stay in corpus order
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(k);

        scored
            .into_iter()
            .map(|(i, score)| {
                let doc = &self.documents[i];
                Hit {
                    id: doc.id.clone(),
                    score,
                    snippet: snippet(&doc.text, self.snippet_chars),
                }
            })
            .collect()
    }
}

/// Raw term frequency times IDF, L2-normalized. Out-of-vocabulary terms are ignored.
fn weigh(terms: &[String], vocabulary: &HashMap<String, u32>, idf: &[f32]) -> SparseVector {
    let mut counts: HashMap<u32, u32> = HashMap::new();
    for term in terms {
        if let Some(&id) = vocabulary.get(term) {
            *counts.entry(id).or_insert(0) += 1;
        }
    }

    let mut vector: SparseVector = counts
        .into_iter()
        .map(|(id, tf)| (id, tf as f32 * idf[id as usize]))
        .collect();
    vector.sort_by_key(|(id, _)| *id);

    let norm: f32 = vector.iter().map(|(_, w)| w * w).sum::<f32>().sqrt();
    if norm > 0.0 {
        for (_, w) in &mut vector {
            *w /= norm;
        }
    }

    vector
}

/// Dot product of two normalized vectors, clamped to [0, 1].
fn cosine(doc: &SparseVector, query: &HashMap<u32, f32>) -> f32 {
    if query.is_empty() {
        return 0.0;
    }
    let dot: f32 = doc
        .iter()
        .filter_map(|(id, w)| query.get(id).map(|q| w * q))
        .sum();
    dot.clamp(0.0, 1.0)
}
