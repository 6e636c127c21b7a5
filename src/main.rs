//! Copyscan Text Overlap Detection CLI
//!
//! Scans a folder of PDF and text documents, compares every pair by shingle
//! similarity, and writes a report of likely copied passages.

use clap::{Args, Parser, Subcommand, ValueEnum};
use log::LevelFilter;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use copyscan::compare::{compare_all_with_progress, compare_pair};
use copyscan::db::{list_runs, load_metadata_from_excel, load_run_comparisons, save_report};
use copyscan::extract::{discover_documents, extract_document, extract_documents};
use copyscan::models::{AnalysisReport, DetectionParams};
use copyscan::output::{
    open_report, print_flagged, print_result, print_summary, write_report_file, OutputFormat,
};

const DEFAULT_REPORT_FILE: &str = "PlagiarismReport.txt";

#[derive(Parser)]
#[command(name = "copyscan")]
#[command(about = "Shingle-based text overlap detection for document collections")]
#[command(version)]
struct Cli {
    /// Only print warnings and errors
    #[arg(long, global = true)]
    quiet: bool,

    /// Print per-pair debug output
    #[arg(long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Report format (CLI version, mirrors output::OutputFormat)
#[derive(Clone, Copy, Debug, ValueEnum)]
enum CliFormat {
    /// Plain-text report
    Text,
    /// JSON report with every pair
    Json,
    /// One CSV row per pair
    Csv,
}

impl From<CliFormat> for OutputFormat {
    fn from(format: CliFormat) -> Self {
        match format {
            CliFormat::Text => OutputFormat::Text,
            CliFormat::Json => OutputFormat::Json,
            CliFormat::Csv => OutputFormat::Csv,
        }
    }
}

/// Detection parameters shared by `scan` and `compare`.
///
/// All use Option<T> so unset flags fall back to the params file or to
/// DetectionParams::default().
#[derive(Args)]
struct ParamArgs {
    /// Similarity threshold in percent, 0-100 [default: 4]
    #[arg(long)]
    threshold: Option<String>,

    /// Shingle width in tokens [default: 5]
    #[arg(long)]
    ngram_size: Option<usize>,

    /// Excerpts shown per flagged pair, 0 for all [default: 3]
    #[arg(long)]
    max_excerpts: Option<usize>,

    /// JSON file with detection parameters
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Compare every pair of documents under a directory
    Scan {
        /// Directory to scan recursively for .pdf and .txt files
        #[arg(long)]
        dir: PathBuf,

        /// Report file path (extension determines format, or use --format)
        #[arg(long, default_value = DEFAULT_REPORT_FILE)]
        output: PathBuf,

        /// Report format
        #[arg(long, value_enum)]
        format: Option<CliFormat>,

        #[command(flatten)]
        params: ParamArgs,

        /// Spreadsheet (.xlsx) with file, author and title columns
        #[arg(long)]
        metadata: Option<PathBuf>,

        /// Also store the run in this SQLite database
        #[arg(long)]
        db: Option<PathBuf>,

        /// Open the report with the default application when done
        #[arg(long)]
        open: bool,

        /// Print first N flagged pairs to console
        #[arg(long)]
        show_flagged: Option<usize>,
    },

    /// Compare two documents
    Compare {
        /// First document
        #[arg(long)]
        a: PathBuf,

        /// Second document
        #[arg(long)]
        b: PathBuf,

        #[command(flatten)]
        params: ParamArgs,
    },

    /// List runs stored in a results database
    Runs {
        /// Path to the results database
        #[arg(long)]
        db: PathBuf,

        /// Show the comparisons of one run
        #[arg(long)]
        run: Option<i64>,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.quiet, cli.verbose);
    let show_progress = !cli.quiet;

    match cli.command {
        Commands::Scan {
            dir,
            output,
            format,
            params,
            metadata,
            db,
            open,
            show_flagged,
        } => {
            let params = resolve_params(&params)?;

            let paths = discover_documents(&dir)?;
            if paths.is_empty() {
                println!(
                    "No PDF or text files found in folder or subfolders: {}",
                    dir.display()
                );
                return Ok(());
            }
            log::info!("Found {} files in {}", paths.len(), dir.display());

            let metadata = match metadata {
                Some(path) => load_metadata_from_excel(&path)?,
                None => HashMap::new(),
            };

            let (documents, failures) = extract_documents(&paths, &params, &metadata, show_progress);
            let results = compare_all_with_progress(&documents, &params, show_progress);
            let report = AnalysisReport::new(params, &documents, failures, results);

            let format = format
                .map(OutputFormat::from)
                .unwrap_or_else(|| OutputFormat::from_path(&output));
            write_report_file(&report, &output, format)?;

            if let Some(db_path) = db {
                let run_id = save_report(&db_path, &report)?;
                log::info!("Stored run {} in {}", run_id, db_path.display());
            }

            if !cli.quiet {
                print_summary(&report);
                println!();
                print_flagged(&report, show_flagged);
            }
            println!("Analysis complete. Report saved to: {}", output.display());

            if open {
                if let Err(e) = open_report(&output) {
                    log::error!("Error opening report: {}", e);
                }
            }
        }

        Commands::Compare { a, b, params } => {
            let params = resolve_params(&params)?;
            let doc_a = extract_document(&a, params.ngram_size, None)?;
            let doc_b = extract_document(&b, params.ngram_size, None)?;

            let result = compare_pair(&doc_a, &doc_b, &params);
            print_result(&result);
            if result.total_excerpts > result.excerpts.len() {
                println!("  ({} excerpts in total)", result.total_excerpts);
            }
        }

        Commands::Runs { db, run } => match run {
            Some(run_id) => {
                let comparisons = load_run_comparisons(&db, run_id)?;
                println!("=== Run {} ===", run_id);
                for cmp in &comparisons {
                    println!(
                        "{} <-> {}: {:.2}%{} ({} excerpts)",
                        cmp.document_a,
                        cmp.document_b,
                        cmp.similarity * 100.0,
                        if cmp.has_overlap { " [flagged]" } else { "" },
                        cmp.total_excerpts
                    );
                    for excerpt in &cmp.excerpts {
                        println!("  - {}", excerpt);
                    }
                }
            }
            None => {
                let runs = list_runs(&db)?;
                if runs.is_empty() {
                    println!("No runs stored in {}", db.display());
                }
                for r in &runs {
                    println!(
                        "Run {} ({}): {} documents, {} pairs, {} flagged, threshold {:.2}%",
                        r.id,
                        r.generated_at,
                        r.document_count,
                        r.pair_count,
                        r.flagged_count,
                        r.threshold * 100.0
                    );
                }
            }
        },
    }

    Ok(())
}

fn init_logging(quiet: bool, verbose: bool) {
    let level = if quiet {
        LevelFilter::Warn
    } else if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    // RUST_LOG overrides the flag-derived level
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format_timestamp(None)
        .init();
}

/// Overlay CLI flags onto the params file (or the defaults).
fn resolve_params(args: &ParamArgs) -> Result<DetectionParams, Box<dyn std::error::Error>> {
    let base = match &args.config {
        Some(path) => load_params_file(path)?,
        None => DetectionParams::default(),
    };

    Ok(DetectionParams {
        ngram_size: args.ngram_size.unwrap_or(base.ngram_size),
        threshold: match &args.threshold {
            Some(raw) => parse_threshold_percent(raw),
            None => base.threshold,
        },
        max_excerpts: args.max_excerpts.unwrap_or(base.max_excerpts),
    })
}

fn load_params_file(path: &Path) -> Result<DetectionParams, Box<dyn std::error::Error>> {
    let params = DetectionParams::from_json_file(path)?;
    log::debug!("Loaded parameters from {}", path.display());
    Ok(params)
}

/// Parse a percentage (0-100) into a fraction, falling back to the default.
fn parse_threshold_percent(raw: &str) -> f64 {
    let default = DetectionParams::default().threshold;
    match raw.trim().parse::<f64>() {
        Ok(percent) if (0.0..=100.0).contains(&percent) => percent / 100.0,
        _ => {
            log::warn!(
                "Invalid threshold '{}' (expected 0-100%). Using the default: {}%.",
                raw,
                default * 100.0
            );
            default
        }
    }
}
