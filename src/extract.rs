//! Document discovery and text extraction.
//!
//! Walks a directory tree for supported files and turns each one into a
//! [`Document`]. Files that fail to extract are reported separately and never
//! reach the comparator.

use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

use crate::models::{DetectionParams, Document, DocumentMetadata, ExtractionFailure};

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("PDF extraction error: {0}")]
    Pdf(String),
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),
    #[error("Unsupported file type: {0}")]
    UnsupportedFormat(PathBuf),
}

/// Supported input formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    Text,
}

impl DocumentKind {
    /// Classify a path by its (case-insensitive) extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        match ext.as_str() {
            "pdf" => Some(DocumentKind::Pdf),
            "txt" => Some(DocumentKind::Text),
            _ => None,
        }
    }
}

/// Recursively collect supported files under `root`, sorted by path.
pub fn discover_documents(root: &Path) -> Result<Vec<PathBuf>, ExtractError> {
    if !root.is_dir() {
        return Err(ExtractError::NotADirectory(root.to_path_buf()));
    }

    let mut paths: Vec<PathBuf> = WalkDir::new(root)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                log::warn!("Skipping unreadable entry: {}", e);
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| DocumentKind::from_path(entry.path()).is_some())
        .map(|entry| entry.into_path())
        .collect();

    paths.sort();
    Ok(paths)
}

/// Raw text of a file plus any author/title the file itself records.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractedText {
    pub text: String,
    pub metadata: DocumentMetadata,
}

/// Read the raw text and embedded metadata of one file.
///
/// PDFs contribute `/Author` and `/Title` from their document information
/// dictionary; plain text files carry no metadata.
pub fn extract_contents(path: &Path) -> Result<ExtractedText, ExtractError> {
    match DocumentKind::from_path(path) {
        Some(DocumentKind::Pdf) => extract_pdf(path),
        Some(DocumentKind::Text) => {
            let bytes = std::fs::read(path)?;
            Ok(ExtractedText {
                text: String::from_utf8_lossy(&bytes).into_owned(),
                metadata: DocumentMetadata::default(),
            })
        }
        None => Err(ExtractError::UnsupportedFormat(path.to_path_buf())),
    }
}

/// Read the raw text of one file.
pub fn extract_text(path: &Path) -> Result<String, ExtractError> {
    Ok(extract_contents(path)?.text)
}

/// PDF text via pdf-extract and info dictionary via lopdf, both of which
/// can panic on malformed files.
fn extract_pdf(path: &Path) -> Result<ExtractedText, ExtractError> {
    let bytes = std::fs::read(path)?;
    let head = &bytes[..bytes.len().min(1024)];
    if !head.windows(5).any(|w| w == b"%PDF-") {
        return Err(ExtractError::Pdf(format!("missing PDF header in {}", path.display())));
    }

    let text = match std::panic::catch_unwind(|| pdf_extract::extract_text_from_mem(&bytes)) {
        Ok(result) => result.map_err(|e| ExtractError::Pdf(e.to_string()))?,
        Err(_) => {
            return Err(ExtractError::Pdf(format!(
                "parser panicked on {}",
                path.display()
            )))
        }
    };

    let metadata = std::panic::catch_unwind(|| read_pdf_info(&bytes))
        .ok()
        .flatten()
        .unwrap_or_else(|| {
            log::debug!("No document info in {}", path.display());
            DocumentMetadata::default()
        });

    Ok(ExtractedText { text, metadata })
}

/// Author and title from the trailer's `/Info` dictionary.
fn read_pdf_info(bytes: &[u8]) -> Option<DocumentMetadata> {
    let doc = lopdf::Document::load_mem(bytes).ok()?;
    let info = match doc.trailer.get(b"Info").ok()? {
        lopdf::Object::Reference(id) => doc.get_dictionary(*id).ok()?,
        lopdf::Object::Dictionary(dict) => dict,
        _ => return None,
    };

    let field = |key: &[u8]| -> Option<String> {
        match info.get(key).ok()? {
            lopdf::Object::String(raw, _) => {
                let value = decode_pdf_string(raw);
                let value = value.trim();
                (!value.is_empty()).then(|| value.to_string())
            }
            _ => None,
        }
    };

    Some(DocumentMetadata {
        author: field(b"Author"),
        title: field(b"Title"),
    })
}

/// Decode a PDF text string: UTF-16BE when it starts with a byte order
/// mark, otherwise one byte per character.
fn decode_pdf_string(raw: &[u8]) -> String {
    match raw {
        [0xFE, 0xFF, rest @ ..] => {
            let units: Vec<u16> = rest
                .chunks_exact(2)
                .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
                .collect();
            String::from_utf16_lossy(&units)
        }
        _ => raw.iter().map(|&b| char::from(b)).collect(),
    }
}

/// Extract a single document.
///
/// The display name is the file name; the stored path is absolute when it
/// can be resolved. Author and title come from the file itself, and
/// `metadata` overrides them wherever it has a value.
pub fn extract_document(
    path: &Path,
    ngram_size: usize,
    metadata: Option<&DocumentMetadata>,
) -> Result<Document, ExtractError> {
    let contents = extract_contents(path)?;

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    let full_path = std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());

    let meta = match metadata {
        Some(sheet) => contents.metadata.overlay(sheet),
        None => contents.metadata,
    };

    Ok(Document::new(
        name,
        full_path,
        meta.author,
        meta.title,
        &contents.text,
        ngram_size,
    ))
}

/// Extract many documents in parallel, keeping input order.
///
/// Returns the documents that extracted successfully and one failure entry
/// per file that did not. `metadata` is keyed by file name.
pub fn extract_documents(
    paths: &[PathBuf],
    params: &DetectionParams,
    metadata: &HashMap<String, DocumentMetadata>,
    show_progress: bool,
) -> (Vec<Document>, Vec<ExtractionFailure>) {
    let progress = if show_progress {
        let pb = ProgressBar::new(paths.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        Some(pb)
    } else {
        None
    };

    let outcomes: Vec<Result<Document, ExtractionFailure>> = paths
        .par_iter()
        .map(|path| {
            let meta = path
                .file_name()
                .and_then(|n| n.to_str())
                .and_then(|n| metadata.get(n));
            let outcome = extract_document(path, params.ngram_size, meta).map_err(|e| {
                log::warn!("Error processing {}: {}", path.display(), e);
                ExtractionFailure {
                    path: path.clone(),
                    error: e.to_string(),
                }
            });
            if let Some(ref pb) = progress {
                pb.inc(1);
            }
            outcome
        })
        .collect();

    if let Some(pb) = progress {
        pb.finish_and_clear();
    }

    let mut documents = Vec::with_capacity(outcomes.len());
    let mut failures = Vec::new();
    for outcome in outcomes {
        match outcome {
            Ok(doc) => documents.push(doc),
            Err(failure) => failures.push(failure),
        }
    }

    log::info!(
        "Extracted {} documents ({} failed)",
        documents.len(),
        failures.len()
    );

    (documents, failures)
}
