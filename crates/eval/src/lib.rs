//! Offline answer-quality metrics for recorded runs.
//!
//! Predictions (`query`, `final_answer`) are joined with gold references
//! (`query`, `reference`) on the trimmed query text and scored with
//! token-level ROUGE-L and smoothed BLEU-1/BLEU-2.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// ROUGE-L recall weight.
pub const ROUGE_BETA: f64 = 1.2;

/// Mean scores over the matched queries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvalReport {
    /// Number of predictions that had a gold reference
    pub n: usize,
    #[serde(rename = "rougeL")]
    pub rouge_l: f64,
    pub bleu1: f64,
    pub bleu2: f64,
}

#[derive(Debug, Deserialize)]
struct Prediction {
    #[serde(default)]
    query: String,
    #[serde(default)]
    final_answer: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Gold {
    query: String,
    reference: String,
}

/// Lowercase whitespace tokenization.
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

/// Length of the longest common subsequence of two token lists.
pub fn lcs(a: &[String], b: &[String]) -> usize {
    let mut prev = vec![0usize; b.len() + 1];
    let mut curr = vec![0usize; b.len() + 1];
    for x in a {
        for (j, y) in b.iter().enumerate() {
            curr[j + 1] = if x == y {
                prev[j] + 1
            } else {
                prev[j + 1].max(curr[j])
            };
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

/// ROUGE-L F-score with recall weighted by [`ROUGE_BETA`].
pub fn rouge_l(prediction: &str, reference: &str) -> f64 {
    let p = tokenize(prediction);
    let r = tokenize(reference);
    if p.is_empty() || r.is_empty() {
        return 0.0;
    }

    let l = lcs(&p, &r) as f64;
    let precision = l / p.len() as f64;
    let recall = l / r.len() as f64;
    if precision + recall == 0.0 {
        return 0.0;
    }

    let beta2 = ROUGE_BETA * ROUGE_BETA;
    (1.0 + beta2) * precision * recall / (recall + beta2 * precision)
}

fn ngrams(tokens: &[String], n: usize) -> HashMap<&[String], usize> {
    let mut counts = HashMap::new();
    for gram in tokens.windows(n) {
        *counts.entry(gram).or_insert(0) += 1;
    }
    counts
}

/// Add-one smoothed unigram and bigram precision.
pub fn bleu_1_2(prediction: &str, reference: &str) -> (f64, f64) {
    let p = tokenize(prediction);
    let r = tokenize(reference);
    if p.is_empty() {
        return (0.0, 0.0);
    }

    let score = |n: usize| {
        if p.len() < n || r.len() < n {
            return 0.0;
        }
        let pred = ngrams(&p, n);
        let refs = ngrams(&r, n);
        let overlap: usize = pred
            .iter()
            .map(|(gram, count)| (*count).min(refs.get(gram).copied().unwrap_or(0)))
            .sum();
        let total = p.len() + 1 - n;
        (overlap + 1) as f64 / (total + 1) as f64
    };

    (score(1), score(2))
}

/// Read a JSONL file, skipping blank lines.
pub fn load_jsonl<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<Vec<T>> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;

    contents
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| {
            serde_json::from_str(line)
                .with_context(|| format!("{}:{}: invalid JSON line", path.display(), i + 1))
        })
        .collect()
}

fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

/// Score a predictions file against a gold file.
///
/// Predictions without a gold reference are skipped. A `null` final answer
/// scores as the empty answer. With no matches every mean is zero.
pub fn evaluate(pred_path: &Path, gold_path: &Path) -> Result<EvalReport> {
    let predictions: Vec<Prediction> = load_jsonl(pred_path)?;
    let gold: Vec<Gold> = load_jsonl(gold_path)?;

    let references: HashMap<String, String> = gold
        .into_iter()
        .map(|g| (g.query.trim().to_string(), g.reference))
        .collect();

    let mut n = 0usize;
    let (mut rouge_sum, mut bleu1_sum, mut bleu2_sum) = (0.0, 0.0, 0.0);

    for prediction in &predictions {
        let Some(reference) = references.get(prediction.query.trim()) else {
            tracing::debug!("No gold reference for query: {}", prediction.query);
            continue;
        };
        let answer = prediction.final_answer.as_deref().unwrap_or("");

        rouge_sum += rouge_l(answer, reference);
        let (b1, b2) = bleu_1_2(answer, reference);
        bleu1_sum += b1;
        bleu2_sum += b2;
        n += 1;
    }

    tracing::info!(
        "Matched {} of {} predictions against {} references",
        n,
        predictions.len(),
        references.len()
    );

    if n == 0 {
        return Ok(EvalReport {
            n: 0,
            rouge_l: 0.0,
            bleu1: 0.0,
            bleu2: 0.0,
        });
    }

    let mean = |sum: f64| round4(sum / n as f64);
    Ok(EvalReport {
        n,
        rouge_l: mean(rouge_sum),
        bleu1: mean(bleu1_sum),
        bleu2: mean(bleu2_sum),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn toks(s: &str) -> Vec<String> {
        tokenize(s)
    }

    #[test]
    fn test_tokenize_lowercases_and_splits() {
        assert_eq!(toks("  The Cat\tsat\n"), vec!["the", "cat", "sat"]);
        assert!(toks("   ").is_empty());
    }

    #[test]
    fn test_lcs() {
        assert_eq!(lcs(&toks("a b c d"), &toks("a c d")), 3);
        assert_eq!(lcs(&toks("a b"), &toks("c d")), 0);
        assert_eq!(lcs(&toks(""), &toks("a")), 0);
    }

    #[test]
    fn test_identical_strings_score_high() {
        let text = "chicago is known for architecture";
        assert!((rouge_l(text, text) - 1.0).abs() < 1e-9);
        let (b1, b2) = bleu_1_2(text, text);
        assert!(b1 > 0.9);
        assert!(b2 > 0.9);
    }

    #[test]
    fn test_rouge_l_partial_match() {
        // lcs = 2, precision = 2/2, recall = 2/4
        let score = rouge_l("known architecture", "chicago known for architecture");
        let beta2 = 1.44;
        let expected = (1.0 + beta2) * 1.0 * 0.5 / (0.5 + beta2 * 1.0);
        assert!((score - expected).abs() < 1e-9);
    }

    #[test]
    fn test_empty_inputs_score_zero() {
        assert_eq!(rouge_l("", "reference"), 0.0);
        assert_eq!(rouge_l("prediction", ""), 0.0);
        assert_eq!(bleu_1_2("", "reference"), (0.0, 0.0));
    }

    #[test]
    fn test_bleu_smoothing() {
        // no overlap: (0 + 1) / (2 + 1)
        let (b1, b2) = bleu_1_2("x y", "a b");
        assert!((b1 - 1.0 / 3.0).abs() < 1e-9);
        assert!((b2 - 1.0 / 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_bleu_clips_repeated_tokens() {
        // "the" appears 3 times in prediction but once in reference
        let (b1, _) = bleu_1_2("the the the", "the cat");
        assert!((b1 - 2.0 / 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_single_token_has_no_bigram_score() {
        assert_eq!(bleu_1_2("paris", "paris").1, 0.0);
    }

    fn write(dir: &TempDir, name: &str, contents: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_evaluate_joins_on_trimmed_query() {
        let temp = TempDir::new().unwrap();
        let pred = write(
            &temp,
            "pred.jsonl",
            concat!(
                "{\"query\":\" What is Chicago known for? \",\"final_answer\":\"architecture\",\"meta\":{}}\n",
                "\n",
                "{\"query\":\"Unmatched\",\"final_answer\":\"x\"}\n",
                "{\"query\":\"Capital of France?\",\"final_answer\":null}\n",
            ),
        );
        let gold = write(
            &temp,
            "gold.jsonl",
            concat!(
                "{\"query\":\"What is Chicago known for?\",\"reference\":\"architecture\"}\n",
                "{\"query\":\"Capital of France?\",\"reference\":\"Paris\"}\n",
            ),
        );

        let report = evaluate(&pred, &gold).unwrap();
        assert_eq!(report.n, 2);
        // (1.0 + 0.0) / 2
        assert_eq!(report.rouge_l, 0.5);
        assert_eq!(report.bleu1, 0.5);
        assert_eq!(report.bleu2, 0.0);
    }

    #[test]
    fn test_evaluate_without_matches() {
        let temp = TempDir::new().unwrap();
        let pred = write(&temp, "pred.jsonl", "{\"query\":\"a\",\"final_answer\":\"b\"}\n");
        let gold = write(&temp, "gold.jsonl", "{\"query\":\"c\",\"reference\":\"d\"}\n");

        let report = evaluate(&pred, &gold).unwrap();
        assert_eq!(report.n, 0);
        assert_eq!(report.rouge_l, 0.0);
    }

    #[test]
    fn test_evaluate_reports_bad_line() {
        let temp = TempDir::new().unwrap();
        let pred = write(&temp, "pred.jsonl", "{\"query\":\"a\"}\nnot json\n");
        let gold = write(&temp, "gold.jsonl", "");

        let err = evaluate(&pred, &gold).unwrap_err();
        assert!(format!("{:#}", err).contains(":2: invalid JSON line"));
    }

    #[test]
    fn test_report_field_names() {
        let report = EvalReport {
            n: 1,
            rouge_l: 0.5,
            bleu1: 0.25,
            bleu2: 0.125,
        };
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["rougeL"], 0.5);
        assert_eq!(value["n"], 1);
    }
}
