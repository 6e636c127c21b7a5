//! Pairwise comparison orchestration.
//!
//! Every unordered pair of documents is scored, classified against the
//! threshold, and (when flagged) given reconstructed excerpts. Pairs are
//! enumerated as `(i, j)` with `i < j` over the input order, and results
//! always come back in that order, even when pairs run in parallel.

use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;

use crate::merge::reconstruct_with_index;
use crate::models::{ComparisonResult, DetectionParams, Document, DocumentRef, MORE_EXCERPTS_MARKER};
use crate::similarity::{common_shingles, jaccard_sequences};

/// Compare every unordered pair of documents.
///
/// Returns `k * (k - 1) / 2` results for `k` documents, ascending by first
/// index then second index.
pub fn compare_all(documents: &[Document], params: &DetectionParams) -> Vec<ComparisonResult> {
    compare_all_with_progress(documents, params, false)
}

/// Compare every unordered pair, optionally showing a progress bar.
pub fn compare_all_with_progress(
    documents: &[Document],
    params: &DetectionParams,
    show_progress: bool,
) -> Vec<ComparisonResult> {
    let pairs = generate_pairs(documents.len());

    if pairs.is_empty() {
        return Vec::new();
    }

    log::info!(
        "Comparing {} documents ({} pairs)...",
        documents.len(),
        pairs.len()
    );

    let progress = if show_progress {
        let pb = ProgressBar::new(pairs.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template(
                    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({per_sec}) {msg}",
                )
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        Some(pb)
    } else {
        None
    };

    // par_iter + collect keeps the pair order
    let results: Vec<ComparisonResult> = pairs
        .par_iter()
        .map(|&(i, j)| {
            let result = compare_pair(&documents[i], &documents[j], params);
            if let Some(ref pb) = progress {
                pb.inc(1);
            }
            result
        })
        .collect();

    if let Some(pb) = progress {
        pb.finish_with_message("Done");
    }

    let flagged = results.iter().filter(|r| r.has_overlap).count();
    log::info!("  Flagged pairs: {} of {}", flagged, results.len());

    results
}

/// Compare a single pair of documents.
///
/// Excerpts are reconstructed against `doc_a`'s shingle order.
pub fn compare_pair(doc_a: &Document, doc_b: &Document, params: &DetectionParams) -> ComparisonResult {
    let similarity = jaccard_sequences(doc_a.shingles(), doc_b.shingles());
    let has_overlap = similarity >= params.threshold;

    let all_excerpts = if has_overlap {
        let common = common_shingles(doc_a.shingles(), doc_b.shingles());
        reconstruct_with_index(&common, doc_a.shingles().index())
    } else {
        Vec::new()
    };

    log::debug!(
        "{} <-> {}: {:.4} ({} excerpts)",
        doc_a.name(),
        doc_b.name(),
        similarity,
        all_excerpts.len()
    );

    ComparisonResult {
        document_a: DocumentRef::from(doc_a),
        document_b: DocumentRef::from(doc_b),
        similarity,
        has_overlap,
        excerpts: cap_excerpts(all_excerpts.clone(), params.max_excerpts),
        total_excerpts: all_excerpts.len(),
        all_excerpts,
    }
}

/// Limit excerpts to `max` entries, appending the "more" marker when any
/// were dropped. `max == 0` keeps everything.
pub fn cap_excerpts(mut excerpts: Vec<String>, max: usize) -> Vec<String> {
    if max == 0 || excerpts.len() <= max {
        return excerpts;
    }

    excerpts.truncate(max);
    excerpts.push(MORE_EXCERPTS_MARKER.to_string());
    excerpts
}

/// Enumerate all unordered index pairs `(i, j)` with `i < j`.
fn generate_pairs(count: usize) -> Vec<(usize, usize)> {
    let mut pairs = Vec::with_capacity(count * count.saturating_sub(1) / 2);
    for i in 0..count {
        for j in (i + 1)..count {
            pairs.push((i, j));
        }
    }
    pairs
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbered_text(prefix: &str, count: usize) -> String {
        (0..count)
            .map(|i| format!("{}{}", prefix, i))
            .collect::<Vec<_>>()
            .join(" ")
    }

    #[test]
    fn test_generate_pairs() {
        assert!(generate_pairs(0).is_empty());
        assert!(generate_pairs(1).is_empty());
        assert_eq!(generate_pairs(3), vec![(0, 1), (0, 2), (1, 2)]);
    }

    #[test]
    fn test_compare_all_pair_count_and_order() {
        let docs: Vec<Document> = (0..5)
            .map(|i| Document::from_text(format!("doc{}", i), &numbered_text("w", 10 + i)))
            .collect();

        let results = compare_all(&docs, &DetectionParams::default());
        assert_eq!(results.len(), 10);

        let mut expected = Vec::new();
        for i in 0..5 {
            for j in (i + 1)..5 {
                expected.push((format!("doc{}", i), format!("doc{}", j)));
            }
        }
        let actual: Vec<(String, String)> = results
            .iter()
            .map(|r| (r.document_a.name.clone(), r.document_b.name.clone()))
            .collect();
        assert_eq!(actual, expected);
    }

    #[test]
    fn test_progress_run_matches_plain_run() {
        let docs: Vec<Document> = (0..4)
            .map(|i| Document::from_text(format!("doc{}", i), &numbered_text("w", 12 + i)))
            .collect();
        let params = DetectionParams::default();

        let plain = compare_all(&docs, &params);
        let with_bar = compare_all_with_progress(&docs, &params, true);
        let scores = |rs: &[ComparisonResult]| rs.iter().map(|r| r.similarity).collect::<Vec<_>>();
        assert_eq!(scores(&plain), scores(&with_bar));
    }

    #[test]
    fn test_compare_all_empty_and_single() {
        let params = DetectionParams::default();
        assert!(compare_all(&[], &params).is_empty());
        assert!(compare_all(&[Document::from_text("solo", "a b c d e f")], &params).is_empty());
    }

    #[test]
    fn test_identical_documents() {
        let text = numbered_text("t", 30);
        let docs = vec![Document::from_text("a", &text), Document::from_text("b", &text)];
        let results = compare_all(&docs, &DetectionParams::default());

        assert_eq!(results.len(), 1);
        let r = &results[0];
        assert_eq!(r.similarity, 1.0);
        assert!(r.has_overlap);
        assert_eq!(r.excerpts, vec![text]);
        assert_eq!(r.total_excerpts, 1);
    }

    #[test]
    fn test_disjoint_documents() {
        let docs = vec![
            Document::from_text("a", &numbered_text("x", 20)),
            Document::from_text("b", &numbered_text("y", 20)),
        ];
        let r = compare_pair(&docs[0], &docs[1], &DetectionParams::default());

        assert_eq!(r.similarity, 0.0);
        assert!(!r.has_overlap);
        assert!(r.excerpts.is_empty());
        assert_eq!(r.total_excerpts, 0);
    }

    #[test]
    fn test_appended_word() {
        let a = Document::from_text("a", "the quick brown fox jumps over the lazy dog");
        let b = Document::from_text("b", "the quick brown fox jumps over the lazy dog today");
        let r = compare_pair(&a, &b, &DetectionParams::default());

        // 5 shared shingles out of 6 distinct
        assert!(r.similarity > 0.0 && r.similarity < 1.0);
        assert!((r.similarity - 5.0 / 6.0).abs() < 1e-9);
        assert!(r.has_overlap);
        assert_eq!(r.excerpts, vec!["the quick brown fox jumps over the lazy dog"]);
    }

    #[test]
    fn test_symmetric_similarity() {
        let a = Document::from_text("a", &numbered_text("w", 40));
        let b = Document::from_text("b", &format!("{} {}", numbered_text("w", 20), numbered_text("z", 20)));
        let params = DetectionParams::default();

        let ab = compare_pair(&a, &b, &params);
        let ba = compare_pair(&b, &a, &params);
        assert_eq!(ab.similarity, ba.similarity);
    }

    #[test]
    fn test_below_threshold_has_no_excerpts() {
        let a = Document::from_text("a", &numbered_text("w", 40));
        let b = Document::from_text("b", &format!("{} {}", numbered_text("w", 6), numbered_text("z", 40)));
        let params = DetectionParams {
            threshold: 0.9,
            ..Default::default()
        };

        let r = compare_pair(&a, &b, &params);
        assert!(r.similarity > 0.0);
        assert!(!r.has_overlap);
        assert!(r.excerpts.is_empty());
    }

    #[test]
    fn test_short_documents_score_zero() {
        let a = Document::from_text("a", "too short");
        let b = Document::from_text("b", "too short");
        let params = DetectionParams {
            threshold: 0.5,
            ..Default::default()
        };

        let r = compare_pair(&a, &b, &params);
        assert_eq!(r.similarity, 0.0);
        assert!(!r.has_overlap);
    }

    #[test]
    fn test_excerpts_capped_with_marker() {
        // Four separate shared runs separated by unique filler
        let shared: Vec<String> = (0..4).map(|k| numbered_text(&format!("s{}x", k), 6)).collect();
        let text_a = shared
            .iter()
            .enumerate()
            .map(|(k, s)| format!("{} {}", s, numbered_text(&format!("a{}x", k), 6)))
            .collect::<Vec<_>>()
            .join(" ");
        let text_b = shared
            .iter()
            .enumerate()
            .map(|(k, s)| format!("{} {}", s, numbered_text(&format!("b{}x", k), 6)))
            .collect::<Vec<_>>()
            .join(" ");

        let a = Document::from_text("a", &text_a);
        let b = Document::from_text("b", &text_b);

        let capped = compare_pair(&a, &b, &DetectionParams::default());
        assert!(capped.has_overlap);
        assert_eq!(capped.total_excerpts, 4);
        assert_eq!(capped.excerpts.len(), 4);
        assert_eq!(capped.excerpts[0], shared[0]);
        assert_eq!(capped.excerpts[3], MORE_EXCERPTS_MARKER);
        assert!(capped.is_truncated());

        let unbounded = compare_pair(
            &a,
            &b,
            &DetectionParams {
                max_excerpts: 0,
                ..Default::default()
            },
        );
        assert_eq!(unbounded.excerpts, shared);
        assert!(!unbounded.is_truncated());
        assert_eq!(capped.all_excerpts, shared);
    }

    #[test]
    fn test_cap_excerpts() {
        let ex = |n: usize| (0..n).map(|i| i.to_string()).collect::<Vec<_>>();
        assert_eq!(cap_excerpts(ex(3), 3), ex(3));
        assert_eq!(cap_excerpts(ex(2), 0), ex(2));
        let capped = cap_excerpts(ex(5), 2);
        assert_eq!(capped, vec!["0", "1", MORE_EXCERPTS_MARKER]);
    }

    #[test]
    fn test_zero_threshold_flags_everything() {
        let a = Document::from_text("a", &numbered_text("x", 10));
        let b = Document::from_text("b", &numbered_text("y", 10));
        let params = DetectionParams {
            threshold: 0.0,
            ..Default::default()
        };

        let r = compare_pair(&a, &b, &params);
        assert!(r.has_overlap);
        assert!(r.excerpts.is_empty());
    }
}
