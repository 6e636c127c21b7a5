//! Merge matched shingles back into contiguous excerpts.
//!
//! Overlapping text is almost always longer than one shingle. Adjacent
//! matching shingles share `n - 1` tokens, so each one after the first only
//! contributes its last token to the running excerpt. A gap in positions
//! closes the excerpt and starts a new one.
//!
//! Positions come from each shingle's *first* occurrence in the reference
//! sequence. A shingle repeated later in the document is only ever placed at
//! its first position, so repeated passages may be under-reported.

use crate::shingle::FirstPositionIndex;
use std::collections::HashSet;

/// Reconstruct contiguous excerpts from common shingles.
///
/// `original` is the reference document's shingle sequence, in scan order.
/// Returns one string per maximal run of adjacent matched shingles, ordered
/// by position. Shingles absent from `original` are ignored.
pub fn reconstruct_excerpts(common: &HashSet<String>, original: &[String]) -> Vec<String> {
    if common.is_empty() {
        return Vec::new();
    }

    reconstruct_with_index(common, &FirstPositionIndex::new(original))
}

/// Reconstruct excerpts using a precomputed first-occurrence index.
pub fn reconstruct_with_index(common: &HashSet<String>, index: &FirstPositionIndex) -> Vec<String> {
    let mut positioned: Vec<(usize, &str)> = common
        .iter()
        .filter_map(|s| index.get(s).map(|pos| (pos, s.as_str())))
        .collect();

    if positioned.is_empty() {
        return Vec::new();
    }

    // Distinct texts have distinct first positions
    positioned.sort_unstable_by_key(|&(pos, _)| pos);

    merge_adjacent_shingles(&positioned)
}

/// Fuse position-sorted shingles into excerpts.
fn merge_adjacent_shingles(sorted: &[(usize, &str)]) -> Vec<String> {
    let mut excerpts = Vec::new();
    let Some(&(first_pos, first_text)) = sorted.first() else {
        return excerpts;
    };

    let mut current = String::from(first_text);
    let mut last_pos = first_pos;

    for &(pos, text) in &sorted[1..] {
        if pos == last_pos + 1 {
            current.push(' ');
            current.push_str(last_token(text));
        } else {
            excerpts.push(std::mem::replace(&mut current, String::from(text)));
        }
        last_pos = pos;
    }

    excerpts.push(current);
    excerpts
}

/// Final whitespace-delimited word of a shingle.
#[inline]
fn last_token(shingle: &str) -> &str {
    shingle.rsplit(' ').next().unwrap_or(shingle)
}
