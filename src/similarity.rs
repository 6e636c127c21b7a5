//! Set similarity between shingle collections.

use crate::shingle::ShingleSequence;
use std::collections::HashSet;
use std::hash::Hash;

/// Calculate the Jaccard similarity of two shingle sequences.
///
/// Both inputs are treated as sets, so repeated shingles collapse. Two empty
/// inputs score 0.0.
pub fn jaccard(shingles_a: &[String], shingles_b: &[String]) -> f64 {
    let set_a: HashSet<&str> = shingles_a.iter().map(String::as_str).collect();
    let set_b: HashSet<&str> = shingles_b.iter().map(String::as_str).collect();
    jaccard_sets(&set_a, &set_b)
}

/// Calculate the Jaccard similarity between two sets.
pub fn jaccard_sets<T: Eq + Hash>(set_a: &HashSet<T>, set_b: &HashSet<T>) -> f64 {
    // Iterate the smaller set
    let (small, large) = if set_a.len() <= set_b.len() {
        (set_a, set_b)
    } else {
        (set_b, set_a)
    };
    let intersection = small.iter().filter(|s| large.contains(*s)).count();
    ratio(intersection, set_a.len() + set_b.len() - intersection)
}

/// Jaccard similarity of two documents' shingle sets, using their
/// precomputed first-occurrence indexes.
pub fn jaccard_sequences(a: &ShingleSequence, b: &ShingleSequence) -> f64 {
    let (small, large) = if a.distinct_len() <= b.distinct_len() {
        (a, b)
    } else {
        (b, a)
    };
    let intersection = small.distinct().filter(|s| large.contains(s)).count();
    ratio(intersection, a.distinct_len() + b.distinct_len() - intersection)
}

/// Distinct shingles present in both sequences.
pub fn common_shingles(a: &ShingleSequence, b: &ShingleSequence) -> HashSet<String> {
    a.distinct()
        .filter(|s| b.contains(s))
        .map(str::to_string)
        .collect()
}

#[inline]
fn ratio(intersection: usize, union: usize) -> f64 {
    if union == 0 {
        0.0
    } else {
        intersection as f64 / union as f64
    }
}
