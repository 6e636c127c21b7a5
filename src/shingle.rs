//! N-gram shingling over token sequences.
//!
//! A shingle is `n` consecutive tokens joined by single spaces. Shingles keep
//! their scan order because excerpt reconstruction relies on positions.

use std::collections::HashMap;

/// Default shingle width in tokens.
pub const DEFAULT_NGRAM_SIZE: usize = 5;

/// Generate shingles from a token sequence.
///
/// Returns one shingle per starting index `0..=len - n`, in increasing order.
/// Sequences shorter than `n` (or `n == 0`) yield no shingles.
pub fn generate_shingles(tokens: &[String], n: usize) -> Vec<String> {
    if tokens.len() < n || n == 0 {
        return Vec::new();
    }

    tokens.windows(n).map(|w| w.join(" ")).collect()
}

/// Maps each distinct shingle text to the position where it first appears.
#[derive(Debug, Clone, Default)]
pub struct FirstPositionIndex {
    positions: HashMap<String, usize>,
}

impl FirstPositionIndex {
    /// Index a shingle list in scan order; later repeats are ignored.
    pub fn new(shingles: &[String]) -> Self {
        let mut positions = HashMap::with_capacity(shingles.len());
        for (pos, shingle) in shingles.iter().enumerate() {
            if !positions.contains_key(shingle) {
                positions.insert(shingle.clone(), pos);
            }
        }
        Self { positions }
    }

    /// Position of the first occurrence of `shingle`, if present.
    pub fn get(&self, shingle: &str) -> Option<usize> {
        self.positions.get(shingle).copied()
    }

    pub fn contains(&self, shingle: &str) -> bool {
        self.positions.contains_key(shingle)
    }

    /// Number of distinct shingle texts.
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Distinct shingle texts (unordered).
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.positions.keys().map(String::as_str)
    }
}

/// Ordered shingles of one document plus their first-occurrence index.
///
/// The index's key set doubles as the document's shingle set. Fields are
/// private so the two can never drift apart.
#[derive(Debug, Clone, Default)]
pub struct ShingleSequence {
    ngram_size: usize,
    shingles: Vec<String>,
    index: FirstPositionIndex,
}

impl ShingleSequence {
    /// Shingle `tokens` with width `n` and index first occurrences.
    pub fn new(tokens: &[String], n: usize) -> Self {
        let shingles = generate_shingles(tokens, n);
        let index = FirstPositionIndex::new(&shingles);

        Self {
            ngram_size: n,
            shingles,
            index,
        }
    }

    pub fn ngram_size(&self) -> usize {
        self.ngram_size
    }

    pub fn len(&self) -> usize {
        self.shingles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shingles.is_empty()
    }

    /// Number of distinct shingle texts.
    pub fn distinct_len(&self) -> usize {
        self.index.len()
    }

    /// Position of the first occurrence of `shingle`, if present.
    pub fn first_position(&self, shingle: &str) -> Option<usize> {
        self.index.get(shingle)
    }

    pub fn contains(&self, shingle: &str) -> bool {
        self.index.contains(shingle)
    }

    /// Iterate the distinct shingle texts (unordered).
    pub fn distinct(&self) -> impl Iterator<Item = &str> {
        self.index.keys()
    }

    pub fn index(&self) -> &FirstPositionIndex {
        &self.index
    }

    pub fn as_slice(&self) -> &[String] {
        &self.shingles
    }
}
