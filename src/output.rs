//! Output formatting for analysis reports (text, JSON, CSV, console).

use crate::models::{AnalysisReport, ComparisonResult, DocumentRef};
use std::io::{self, Write};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum OutputError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Report file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
    Csv,
}

impl OutputFormat {
    /// Pick a format from a file extension, defaulting to text.
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .as_deref()
        {
            Some("json") => OutputFormat::Json,
            Some("csv") => OutputFormat::Csv,
            _ => OutputFormat::Text,
        }
    }
}

const SEPARATOR: &str = "----------------------------------------";

/// Write the human-readable overlap report.
pub fn write_text_report<W: Write>(report: &AnalysisReport, writer: &mut W) -> Result<(), OutputError> {
    writeln!(writer, "Plagiarism Report")?;
    writeln!(writer, "=================")?;
    writeln!(writer)?;

    writeln!(writer, "Processed files:")?;
    for info in &report.documents {
        writeln!(
            writer,
            "- {} (Path: {})",
            info.document.name,
            info.document.path.display()
        )?;
    }
    writeln!(writer)?;

    if !report.failures.is_empty() {
        writeln!(writer, "Files that could not be processed:")?;
        for failure in &report.failures {
            writeln!(writer, "- {}: {}", failure.path.display(), failure.error)?;
        }
        writeln!(writer)?;
    }

    writeln!(writer, "Comparison results:")?;
    for result in &report.results {
        if result.has_overlap {
            write_flagged_block(result, writer)?;
        } else {
            writeln!(
                writer,
                "No overlap detected between {} and {} ({:.2}% similarity)",
                result.document_a.name,
                result.document_b.name,
                result.similarity_percent()
            )?;
            writeln!(writer, "{}", SEPARATOR)?;
            writeln!(writer)?;
        }
    }

    if report.summary.flagged_count == 0 {
        writeln!(writer, "No overlap cases were detected.")?;
    }

    Ok(())
}

fn write_flagged_block<W: Write>(result: &ComparisonResult, writer: &mut W) -> Result<(), OutputError> {
    writeln!(
        writer,
        "Possible plagiarism detected ({:.2}% similarity):",
        result.similarity_percent()
    )?;
    write_document_lines(1, &result.document_a, writer)?;
    write_document_lines(2, &result.document_b, writer)?;

    writeln!(writer, "Copied excerpts:")?;
    let marker_index = if result.is_truncated() {
        result.excerpts.len().checked_sub(1)
    } else {
        None
    };
    for (i, excerpt) in result.excerpts.iter().enumerate() {
        if Some(i) == marker_index {
            // Marker line is not a bullet
            writeln!(writer, "{}", excerpt)?;
        } else {
            writeln!(writer, "- {}", excerpt)?;
        }
    }
    writeln!(writer, "{}", SEPARATOR)?;
    writeln!(writer)?;
    Ok(())
}

fn write_document_lines<W: Write>(index: usize, doc: &DocumentRef, writer: &mut W) -> io::Result<()> {
    writeln!(writer, "File {}: {} (Path: {})", index, doc.name, doc.path.display())?;
    writeln!(writer, "Author: {}, Title: {}", doc.author, doc.title)
}

/// Write the text report to a file, creating parent directories.
pub fn write_text_report_file(report: &AnalysisReport, path: &Path) -> Result<(), OutputError> {
    let mut file = create_file(path)?;
    write_text_report(report, &mut file)
}

/// Write the full report as JSON.
pub fn write_json<W: Write>(report: &AnalysisReport, writer: &mut W) -> Result<(), OutputError> {
    let json = serde_json::to_string_pretty(report)?;
    writer.write_all(json.as_bytes())?;
    Ok(())
}

/// Write the full report as JSON to a file.
pub fn write_json_file(report: &AnalysisReport, path: &Path) -> Result<(), OutputError> {
    let mut file = create_file(path)?;
    write_json(report, &mut file)
}

/// Write one CSV row per compared pair.
pub fn write_csv<W: Write>(results: &[ComparisonResult], writer: &mut W) -> Result<(), OutputError> {
    writeln!(
        writer,
        "document_a,path_a,document_b,path_b,similarity,has_overlap,total_excerpts,excerpts"
    )?;

    for result in results {
        writeln!(
            writer,
            "{},{},{},{},{:.6},{},{},{}",
            csv_field(&result.document_a.name),
            csv_field(&result.document_a.path.to_string_lossy()),
            csv_field(&result.document_b.name),
            csv_field(&result.document_b.path.to_string_lossy()),
            result.similarity,
            result.has_overlap,
            result.total_excerpts,
            csv_field(&result.excerpts.join(" | ")),
        )?;
    }

    Ok(())
}

/// Write CSV rows to a file.
pub fn write_csv_file(results: &[ComparisonResult], path: &Path) -> Result<(), OutputError> {
    let mut file = create_file(path)?;
    write_csv(results, &mut file)
}

/// Write a report in the given format.
pub fn write_report_file(
    report: &AnalysisReport,
    path: &Path,
    format: OutputFormat,
) -> Result<(), OutputError> {
    match format {
        OutputFormat::Text => write_text_report_file(report, path),
        OutputFormat::Json => write_json_file(report, path),
        OutputFormat::Csv => write_csv_file(&report.results, path),
    }
}

/// Quote a CSV field, doubling embedded quotes.
fn csv_field(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}

fn create_file(path: &Path) -> io::Result<std::fs::File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::File::create(path)
}

/// Open a written report with the system default application.
pub fn open_report(path: &Path) -> Result<(), OutputError> {
    open::that(path)?;
    Ok(())
}

/// Write a summary report to stdout.
pub fn print_summary(report: &AnalysisReport) {
    println!("\n=== Analysis Summary ===");
    println!("Version: {}", report.version);
    println!("Generated: {}", report.generated_at);
    println!();
    println!("Parameters:");
    println!("  N-gram size: {}", report.parameters.ngram_size);
    println!("  Threshold: {:.2}%", report.parameters.threshold * 100.0);
    println!("  Max excerpts: {}", report.parameters.max_excerpts);
    println!();
    println!("Results:");
    println!("  Documents: {}", report.summary.document_count);
    println!("  Failed: {}", report.summary.failed_count);
    println!("  Pairs compared: {}", report.summary.pair_count);
    println!("  Pairs flagged: {}", report.summary.flagged_count);
    println!("  Max similarity: {:.2}%", report.summary.max_similarity * 100.0);
    println!("  Average similarity: {:.2}%", report.summary.avg_similarity * 100.0);
}

/// Format one flagged pair as a single console line.
pub fn format_result(result: &ComparisonResult) -> String {
    format!(
        "Overlap detected ({:.2}%): {} and {}",
        result.similarity_percent(),
        result.document_a.name,
        result.document_b.name
    )
}

/// Print flagged pairs, or a notice when there are none.
pub fn print_flagged(report: &AnalysisReport, limit: Option<usize>) {
    let flagged: Vec<&ComparisonResult> = report.flagged().collect();
    if flagged.is_empty() {
        println!("No overlap cases were detected.");
        return;
    }

    let to_print = match limit {
        Some(n) => &flagged[..n.min(flagged.len())],
        None => &flagged[..],
    };
    for result in to_print {
        println!("{}", format_result(result));
    }

    if let Some(n) = limit {
        if flagged.len() > n {
            println!("... and {} more flagged pairs", flagged.len() - n);
        }
    }
}

/// Print one pair with its excerpts.
pub fn print_result(result: &ComparisonResult) {
    println!(
        "{} <-> {}: {:.2}% similarity ({})",
        result.document_a.name,
        result.document_b.name,
        result.similarity_percent(),
        if result.has_overlap { "flagged" } else { "below threshold" }
    );
    for excerpt in &result.excerpts {
        println!("  - {}", truncate_text(excerpt, 200));
    }
}

/// Truncate text to a maximum length, adding ellipsis if needed.
fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() <= max_len {
        text.to_string()
    } else {
        let truncated: String = text.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", truncated)
    }
}
