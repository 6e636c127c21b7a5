//! Data structures for the copyscan overlap detection pipeline.

use crate::shingle::{ShingleSequence, DEFAULT_NGRAM_SIZE};
use crate::tokenize::{normalized_text, tokenize};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Author recorded when a document carries none.
pub const UNKNOWN_AUTHOR: &str = "Unknown";
/// Title recorded when a document carries none.
pub const UNKNOWN_TITLE: &str = "Untitled";
/// Appended to a capped excerpt list when more excerpts exist.
pub const MORE_EXCERPTS_MARKER: &str = "(... more identical excerpts found)";

/// One analyzed source document.
///
/// Immutable once built; the shingle sequence is derived from the
/// normalized text at construction time.
#[derive(Debug, Clone)]
pub struct Document {
    name: String,
    path: PathBuf,
    author: String,
    title: String,
    /// Normalized tokens joined by single spaces
    text: String,
    token_count: usize,
    shingles: ShingleSequence,
}

impl Document {
    /// Build a document from raw extracted text.
    ///
    /// Missing author/title fall back to [`UNKNOWN_AUTHOR`]/[`UNKNOWN_TITLE`].
    pub fn new(
        name: impl Into<String>,
        path: impl Into<PathBuf>,
        author: Option<String>,
        title: Option<String>,
        raw_text: &str,
        ngram_size: usize,
    ) -> Self {
        let tokens = tokenize(raw_text);
        let shingles = ShingleSequence::new(&tokens, ngram_size);

        Document {
            name: name.into(),
            path: path.into(),
            author: author.unwrap_or_else(|| UNKNOWN_AUTHOR.to_string()),
            title: title.unwrap_or_else(|| UNKNOWN_TITLE.to_string()),
            text: normalized_text(&tokens),
            token_count: tokens.len(),
            shingles,
        }
    }

    /// Build a document with default shingle width and no metadata.
    pub fn from_text(name: impl Into<String>, raw_text: &str) -> Self {
        let name = name.into();
        let path = PathBuf::from(&name);
        Self::new(name, path, None, None, raw_text, DEFAULT_NGRAM_SIZE)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn author(&self) -> &str {
        &self.author
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// Normalized text (tokens joined by single spaces).
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn token_count(&self) -> usize {
        self.token_count
    }

    pub fn shingles(&self) -> &ShingleSequence {
        &self.shingles
    }

    pub fn shingle_count(&self) -> usize {
        self.shingles.len()
    }
}

/// Pass-through identity of a document as shown in reports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentRef {
    pub name: String,
    pub path: PathBuf,
    pub author: String,
    pub title: String,
}

impl From<&Document> for DocumentRef {
    fn from(doc: &Document) -> Self {
        DocumentRef {
            name: doc.name.clone(),
            path: doc.path.clone(),
            author: doc.author.clone(),
            title: doc.title.clone(),
        }
    }
}

/// Processed document with size statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentInfo {
    #[serde(flatten)]
    pub document: DocumentRef,
    pub token_count: usize,
    pub shingle_count: usize,
}

impl From<&Document> for DocumentInfo {
    fn from(doc: &Document) -> Self {
        DocumentInfo {
            document: DocumentRef::from(doc),
            token_count: doc.token_count,
            shingle_count: doc.shingle_count(),
        }
    }
}

/// Author/title overrides for one file, e.g. from a metadata sheet.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub author: Option<String>,
    pub title: Option<String>,
}

impl DocumentMetadata {
    /// Fill fields from `other` wherever it has a value.
    pub fn overlay(mut self, other: &DocumentMetadata) -> Self {
        if other.author.is_some() {
            self.author = other.author.clone();
        }
        if other.title.is_some() {
            self.title = other.title.clone();
        }
        self
    }
}

/// A file that could not be turned into a document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionFailure {
    pub path: PathBuf,
    pub error: String,
}

/// Detection parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionParams {
    pub ngram_size: usize,
    /// Minimum Jaccard similarity (fraction) for a pair to be flagged
    pub threshold: f64,
    /// Excerpts shown per flagged pair (0 = all)
    pub max_excerpts: usize,
}

impl Default for DetectionParams {
    fn default() -> Self {
        Self {
            ngram_size: DEFAULT_NGRAM_SIZE,
            threshold: 0.04,
            max_excerpts: 3,
        }
    }
}

impl DetectionParams {
    /// Load parameters from a JSON file; missing fields keep their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let params = serde_json::from_str(&content)?;
        Ok(params)
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid parameters file: {0}")]
    Json(#[from] serde_json::Error),
}

/// Outcome for one unordered pair of documents
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonResult {
    pub document_a: DocumentRef,
    pub document_b: DocumentRef,
    pub similarity: f64,
    pub has_overlap: bool,
    /// Excerpts for display, capped, with [`MORE_EXCERPTS_MARKER`] appended
    /// when truncated
    pub excerpts: Vec<String>,
    /// Number of reconstructed excerpts before capping
    pub total_excerpts: usize,
    /// Every reconstructed excerpt, uncapped and without the marker
    pub all_excerpts: Vec<String>,
}

impl ComparisonResult {
    pub fn is_truncated(&self) -> bool {
        self.excerpts.last().map(String::as_str) == Some(MORE_EXCERPTS_MARKER)
    }

    /// Similarity as a percentage.
    pub fn similarity_percent(&self) -> f64 {
        self.similarity * 100.0
    }
}

/// Aggregate numbers for one analysis run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisSummary {
    pub document_count: usize,
    pub failed_count: usize,
    pub pair_count: usize,
    pub flagged_count: usize,
    pub max_similarity: f64,
    pub avg_similarity: f64,
}

impl AnalysisSummary {
    pub fn from_results(
        document_count: usize,
        failed_count: usize,
        results: &[ComparisonResult],
    ) -> Self {
        let pair_count = results.len();
        let flagged_count = results.iter().filter(|r| r.has_overlap).count();
        let max_similarity = results.iter().map(|r| r.similarity).fold(0.0, f64::max);
        let avg_similarity = if pair_count == 0 {
            0.0
        } else {
            results.iter().map(|r| r.similarity).sum::<f64>() / pair_count as f64
        };

        AnalysisSummary {
            document_count,
            failed_count,
            pair_count,
            flagged_count,
            max_similarity,
            avg_similarity,
        }
    }
}

/// Full report for one analysis run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub version: String,
    pub generated_at: String,
    pub parameters: DetectionParams,
    pub documents: Vec<DocumentInfo>,
    pub failures: Vec<ExtractionFailure>,
    pub summary: AnalysisSummary,
    pub results: Vec<ComparisonResult>,
}

impl AnalysisReport {
    pub fn new(
        parameters: DetectionParams,
        documents: &[Document],
        failures: Vec<ExtractionFailure>,
        results: Vec<ComparisonResult>,
    ) -> Self {
        let summary = AnalysisSummary::from_results(documents.len(), failures.len(), &results);

        AnalysisReport {
            version: env!("CARGO_PKG_VERSION").to_string(),
            generated_at: chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
            parameters,
            documents: documents.iter().map(DocumentInfo::from).collect(),
            failures,
            summary,
            results,
        }
    }

    pub fn flagged(&self) -> impl Iterator<Item = &ComparisonResult> {
        self.results.iter().filter(|r| r.has_overlap)
    }
}
