//! Self-consistency voting over sample answers.

use crate::rag::types::{Sample, Vote};
use std::collections::HashMap;

/// Count each trimmed final answer, ranked.
///
/// Higher count first, then the shorter answer (in characters), then the
/// answer seen first. Matching is exact after trimming.
pub fn tally(samples: &[Sample]) -> Vec<Vote> {
    let mut votes: Vec<Vote> = Vec::new();
    let mut positions: HashMap<&str, usize> = HashMap::new();

    for sample in samples {
        let answer = sample.final_answer.trim();
        match positions.get(answer) {
            Some(&pos) => votes[pos].count += 1,
            None => {
                positions.insert(answer, votes.len());
                votes.push(Vote {
                    answer: answer.to_string(),
                    count: 1,
                });
            }
        }
    }

    // Stable sort keeps first-seen order among full ties
    votes.sort_by(|a, b| {
        b.count
            .cmp(&a.count)
            .then_with(|| a.answer.chars().count().cmp(&b.answer.chars().count()))
    });
    votes
}

/// Pick the consensus answer. `None` when there are no samples.
pub fn aggregate(samples: &[Sample]) -> Option<String> {
    tally(samples).into_iter().next().map(|vote| vote.answer)
}
