//! Copyscan Text Overlap Detection Library
//!
//! Detects likely copied passages across a collection of documents by
//! comparing 5-token word shingles. Each pair of documents gets a Jaccard
//! similarity, a thresholded verdict, and the overlapping excerpts
//! reconstructed back into readable text.
//!
//! # Example
//!
//! ```
//! use copyscan::prelude::*;
//!
//! let docs = vec![
//!     Document::from_text("a.txt", "the quick brown fox jumps over the lazy dog"),
//!     Document::from_text("b.txt", "the quick brown fox jumps over the lazy dog today"),
//! ];
//!
//! let results = compare_all(&docs, &DetectionParams::default());
//!
//! assert_eq!(results.len(), 1);
//! assert!(results[0].has_overlap);
//! assert_eq!(results[0].excerpts, vec!["the quick brown fox jumps over the lazy dog"]);
//! ```
//!
//! # Scanning a Directory
//!
//! ```no_run
//! use copyscan::prelude::*;
//! use std::collections::HashMap;
//! use std::path::Path;
//!
//! let params = DetectionParams::default();
//! let paths = discover_documents(Path::new("submissions")).unwrap();
//! let (docs, failures) = extract_documents(&paths, &params, &HashMap::new(), true);
//!
//! let results = compare_all_with_progress(&docs, &params, true);
//! let report = AnalysisReport::new(params, &docs, failures, results);
//! write_text_report_file(&report, Path::new("PlagiarismReport.txt")).unwrap();
//! ```

pub mod compare;
pub mod db;
pub mod extract;
pub mod merge;
pub mod models;
pub mod output;
pub mod shingle;
pub mod similarity;
pub mod tokenize;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::compare::{cap_excerpts, compare_all, compare_all_with_progress, compare_pair};
    pub use crate::db::{
        list_runs, load_metadata_from_excel, load_run_comparisons, save_report, DbError,
        RunRecord, StoredComparison,
    };
    pub use crate::extract::{
        discover_documents, extract_contents, extract_document, extract_documents, extract_text,
        DocumentKind, ExtractError, ExtractedText,
    };
    pub use crate::merge::{reconstruct_excerpts, reconstruct_with_index};
    pub use crate::models::{
        AnalysisReport, AnalysisSummary, ComparisonResult, ConfigError, DetectionParams,
        Document, DocumentInfo, DocumentMetadata, DocumentRef, ExtractionFailure,
        MORE_EXCERPTS_MARKER, UNKNOWN_AUTHOR, UNKNOWN_TITLE,
    };
    pub use crate::output::{
        format_result, open_report, print_flagged, print_result, print_summary, write_csv,
        write_csv_file, write_json, write_json_file, write_report_file, write_text_report,
        write_text_report_file, OutputError, OutputFormat,
    };
    pub use crate::shingle::{
        generate_shingles, FirstPositionIndex, ShingleSequence, DEFAULT_NGRAM_SIZE,
    };
    pub use crate::similarity::{common_shingles, jaccard, jaccard_sequences, jaccard_sets};
    pub use crate::tokenize::tokenize;
}

// Re-export commonly used types at the crate root
pub use models::{ComparisonResult, DetectionParams, Document};
