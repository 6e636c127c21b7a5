//! SQLite results store and spreadsheet metadata loading.

use crate::models::{AnalysisReport, DocumentMetadata};
use calamine::{open_workbook, Reader, Xlsx};
use rusqlite::{params, Connection};
use serde::Serialize;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Excel error: {0}")]
    Excel(#[from] calamine::Error),
    #[error("Excel XLSX error: {0}")]
    ExcelXlsx(#[from] calamine::XlsxError),
    #[error("Run not found: {0}")]
    RunNotFound(i64),
}

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS runs (
    id             INTEGER PRIMARY KEY AUTOINCREMENT,
    version        TEXT NOT NULL,
    generated_at   TEXT NOT NULL,
    ngram_size     INTEGER NOT NULL,
    threshold      REAL NOT NULL,
    max_excerpts   INTEGER NOT NULL,
    document_count INTEGER NOT NULL,
    failed_count   INTEGER NOT NULL,
    pair_count     INTEGER NOT NULL,
    flagged_count  INTEGER NOT NULL
);
CREATE TABLE IF NOT EXISTS documents (
    run_id        INTEGER NOT NULL REFERENCES runs(id),
    name          TEXT NOT NULL,
    path          TEXT NOT NULL,
    author        TEXT NOT NULL,
    title         TEXT NOT NULL,
    token_count   INTEGER NOT NULL,
    shingle_count INTEGER NOT NULL
);
CREATE TABLE IF NOT EXISTS comparisons (
    id             INTEGER PRIMARY KEY AUTOINCREMENT,
    run_id         INTEGER NOT NULL REFERENCES runs(id),
    pair_index     INTEGER NOT NULL,
    document_a     TEXT NOT NULL,
    document_b     TEXT NOT NULL,
    similarity     REAL NOT NULL,
    has_overlap    INTEGER NOT NULL,
    total_excerpts INTEGER NOT NULL
);
CREATE TABLE IF NOT EXISTS excerpts (
    comparison_id INTEGER NOT NULL REFERENCES comparisons(id),
    position      INTEGER NOT NULL,
    text          TEXT NOT NULL
);
";

/// A stored analysis run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunRecord {
    pub id: i64,
    pub generated_at: String,
    pub threshold: f64,
    pub document_count: i64,
    pub pair_count: i64,
    pub flagged_count: i64,
}

/// A stored flagged or unflagged pair
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredComparison {
    pub document_a: String,
    pub document_b: String,
    pub similarity: f64,
    pub has_overlap: bool,
    pub total_excerpts: i64,
    /// Every reconstructed excerpt, uncapped
    pub excerpts: Vec<String>,
}

/// Open (creating if needed) a results database.
pub fn open_store(db_path: &Path) -> Result<Connection, DbError> {
    if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let conn = Connection::open(db_path)?;
    conn.execute_batch(SCHEMA)?;
    Ok(conn)
}

/// Save a full report as one run. Returns the new run id.
///
/// Excerpts are stored uncapped; display capping is not persisted.
pub fn save_report(db_path: &Path, report: &AnalysisReport) -> Result<i64, DbError> {
    let mut conn = open_store(db_path)?;
    let tx = conn.transaction()?;

    tx.execute(
        "INSERT INTO runs (version, generated_at, ngram_size, threshold, max_excerpts,
                           document_count, failed_count, pair_count, flagged_count)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            report.version,
            report.generated_at,
            report.parameters.ngram_size as i64,
            report.parameters.threshold,
            report.parameters.max_excerpts as i64,
            report.summary.document_count as i64,
            report.summary.failed_count as i64,
            report.summary.pair_count as i64,
            report.summary.flagged_count as i64,
        ],
    )?;
    let run_id = tx.last_insert_rowid();

    {
        let mut stmt = tx.prepare(
            "INSERT INTO documents (run_id, name, path, author, title, token_count, shingle_count)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )?;
        for info in &report.documents {
            stmt.execute(params![
                run_id,
                info.document.name,
                info.document.path.to_string_lossy().into_owned(),
                info.document.author,
                info.document.title,
                info.token_count as i64,
                info.shingle_count as i64,
            ])?;
        }

        let mut cmp_stmt = tx.prepare(
            "INSERT INTO comparisons (run_id, pair_index, document_a, document_b,
                                      similarity, has_overlap, total_excerpts)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )?;
        let mut excerpt_stmt = tx.prepare(
            "INSERT INTO excerpts (comparison_id, position, text) VALUES (?1, ?2, ?3)",
        )?;

        for (pair_index, result) in report.results.iter().enumerate() {
            cmp_stmt.execute(params![
                run_id,
                pair_index as i64,
                result.document_a.name,
                result.document_b.name,
                result.similarity,
                result.has_overlap,
                result.total_excerpts as i64,
            ])?;
            let comparison_id = tx.last_insert_rowid();

            for (position, excerpt) in result.all_excerpts.iter().enumerate() {
                excerpt_stmt.execute(params![comparison_id, position as i64, excerpt])?;
            }
        }
    }

    tx.commit()?;
    Ok(run_id)
}

/// List stored runs, newest first.
pub fn list_runs(db_path: &Path) -> Result<Vec<RunRecord>, DbError> {
    let conn = open_store(db_path)?;
    let mut stmt = conn.prepare(
        "SELECT id, generated_at, threshold, document_count, pair_count, flagged_count
         FROM runs ORDER BY id DESC",
    )?;

    let runs = stmt
        .query_map([], |row| {
            Ok(RunRecord {
                id: row.get(0)?,
                generated_at: row.get(1)?,
                threshold: row.get(2)?,
                document_count: row.get(3)?,
                pair_count: row.get(4)?,
                flagged_count: row.get(5)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(runs)
}

/// Load the comparisons of one run in pair order.
pub fn load_run_comparisons(db_path: &Path, run_id: i64) -> Result<Vec<StoredComparison>, DbError> {
    let conn = open_store(db_path)?;

    let exists: i64 = conn.query_row("SELECT COUNT(*) FROM runs WHERE id = ?", [run_id], |row| {
        row.get(0)
    })?;
    if exists == 0 {
        return Err(DbError::RunNotFound(run_id));
    }

    let mut stmt = conn.prepare(
        "SELECT id, document_a, document_b, similarity, has_overlap, total_excerpts
         FROM comparisons WHERE run_id = ? ORDER BY pair_index",
    )?;
    let mut excerpt_stmt =
        conn.prepare("SELECT text FROM excerpts WHERE comparison_id = ? ORDER BY position")?;

    let mut comparisons = Vec::new();
    let mut rows = stmt.query([run_id])?;

    while let Some(row) = rows.next()? {
        let comparison_id: i64 = row.get(0)?;
        let excerpts = excerpt_stmt
            .query_map([comparison_id], |r| r.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;

        comparisons.push(StoredComparison {
            document_a: row.get(1)?,
            document_b: row.get(2)?,
            similarity: row.get(3)?,
            has_overlap: row.get(4)?,
            total_excerpts: row.get(5)?,
            excerpts,
        });
    }

    Ok(comparisons)
}

/// Load per-file author/title overrides from the first sheet of an `.xlsx`.
///
/// The header row must name a file column (`file`, `file_name` or `name`);
/// `author` and `title` columns are optional. Blank cells leave the value
/// unset. Keys are file names.
pub fn load_metadata_from_excel(
    excel_path: &Path,
) -> Result<HashMap<String, DocumentMetadata>, DbError> {
    let mut workbook: Xlsx<_> = open_workbook(excel_path)?;
    let mut metadata = HashMap::new();

    // Try to find the first sheet
    if let Some(sheet_name) = workbook.sheet_names().first().cloned() {
        if let Ok(range) = workbook.worksheet_range(&sheet_name) {
            let mut rows = range.rows();

            let col_indices = match rows.next() {
                Some(header_row) => find_column_indices(header_row),
                None => return Ok(metadata),
            };

            for row in rows {
                if let Some(file) = get_string_cell(row, col_indices.file) {
                    let entry = DocumentMetadata {
                        author: get_string_cell(row, col_indices.author),
                        title: get_string_cell(row, col_indices.title),
                    };
                    metadata.insert(file, entry);
                }
            }
        }
    }

    log::debug!("Loaded metadata for {} files", metadata.len());
    Ok(metadata)
}

/// Column indices for the metadata sheet
struct ColumnIndices {
    file: Option<usize>,
    author: Option<usize>,
    title: Option<usize>,
}

fn find_column_indices(header: &[calamine::Data]) -> ColumnIndices {
    let mut indices = ColumnIndices {
        file: None,
        author: None,
        title: None,
    };

    for (i, cell) in header.iter().enumerate() {
        if let calamine::Data::String(s) = cell {
            match s.trim().to_lowercase().as_str() {
                "file" | "file_name" | "name" => indices.file = Some(i),
                "author" => indices.author = Some(i),
                "title" => indices.title = Some(i),
                _ => {}
            }
        }
    }

    indices
}

fn get_string_cell(row: &[calamine::Data], col: Option<usize>) -> Option<String> {
    col.and_then(|i| row.get(i))
        .and_then(|cell| match cell {
            calamine::Data::String(s) => Some(s.trim().to_string()),
            calamine::Data::Int(n) => Some(n.to_string()),
            calamine::Data::Float(n) => Some(n.to_string()),
            _ => None,
        })
        .filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compare::compare_all;
    use crate::models::{DetectionParams, Document};
    use tempfile::TempDir;

    fn sample_report() -> AnalysisReport {
        let shared = "one two three four five six seven eight nine ten";
        let docs = vec![
            Document::from_text("a.txt", shared),
            Document::from_text("b.txt", &format!("{} eleven twelve", shared)),
            Document::from_text("c.txt", "completely different words appear in this file"),
        ];
        let params = DetectionParams::default();
        let results = compare_all(&docs, &params);
        AnalysisReport::new(params, &docs, Vec::new(), results)
    }

    #[test]
    fn test_save_and_load_run() {
        let dir = TempDir::new().unwrap();
        let db_path = dir.path().join("results/runs.db");
        let report = sample_report();

        let run_id = save_report(&db_path, &report).unwrap();

        let runs = list_runs(&db_path).unwrap();
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].id, run_id);
        assert_eq!(runs[0].document_count, 3);
        assert_eq!(runs[0].pair_count, 3);
        assert_eq!(runs[0].flagged_count, 1);

        let comparisons = load_run_comparisons(&db_path, run_id).unwrap();
        assert_eq!(comparisons.len(), 3);
        assert_eq!(comparisons[0].document_a, "a.txt");
        assert_eq!(comparisons[0].document_b, "b.txt");
        assert!(comparisons[0].has_overlap);
        assert_eq!(comparisons[0].total_excerpts, 1);
        assert_eq!(
            comparisons[0].excerpts,
            vec!["one two three four five six seven eight nine ten"]
        );
        assert!(!comparisons[2].has_overlap);
        assert!(comparisons[2].excerpts.is_empty());
    }

    #[test]
    fn test_capped_excerpts_stored_in_full() {
        let passages: Vec<String> = (0..5)
            .map(|k| {
                (0..7)
                    .map(|i| format!("r{}x{}", k, i))
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .collect();
        let text_a = passages
            .iter()
            .enumerate()
            .map(|(k, p)| format!("{} left{} filler{} words{} here{} now{}", p, k, k, k, k, k))
            .collect::<Vec<_>>()
            .join(" ");
        let text_b = passages
            .iter()
            .enumerate()
            .map(|(k, p)| format!("{} right{} other{} tokens{} go{} on{}", p, k, k, k, k, k))
            .collect::<Vec<_>>()
            .join(" ");
        let docs = vec![Document::from_text("a.txt", &text_a), Document::from_text("b.txt", &text_b)];
        let params = DetectionParams {
            max_excerpts: 2,
            ..Default::default()
        };
        let results = compare_all(&docs, &params);
        assert!(results[0].is_truncated());
        let report = AnalysisReport::new(params, &docs, Vec::new(), results);

        let dir = TempDir::new().unwrap();
        let db_path = dir.path().join("runs.db");
        let run_id = save_report(&db_path, &report).unwrap();

        let stored = load_run_comparisons(&db_path, run_id).unwrap();
        assert_eq!(stored[0].total_excerpts, 5);
        assert_eq!(stored[0].excerpts, passages);
        assert!(!stored[0]
            .excerpts
            .iter()
            .any(|e| e == crate::models::MORE_EXCERPTS_MARKER));
    }

    #[test]
    fn test_runs_accumulate() {
        let dir = TempDir::new().unwrap();
        let db_path = dir.path().join("runs.db");
        let first = save_report(&db_path, &sample_report()).unwrap();
        let second = save_report(&db_path, &sample_report()).unwrap();

        let runs = list_runs(&db_path).unwrap();
        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0].id, second);
        assert_eq!(runs[1].id, first);
    }

    #[test]
    fn test_missing_run() {
        let dir = TempDir::new().unwrap();
        let db_path = dir.path().join("runs.db");
        assert!(matches!(
            load_run_comparisons(&db_path, 42),
            Err(DbError::RunNotFound(42))
        ));
    }

    #[test]
    fn test_find_column_indices() {
        let header = vec![
            calamine::Data::String("Title".to_string()),
            calamine::Data::String(" File_Name ".to_string()),
            calamine::Data::Empty,
            calamine::Data::String("AUTHOR".to_string()),
        ];
        let idx = find_column_indices(&header);
        assert_eq!(idx.file, Some(1));
        assert_eq!(idx.author, Some(3));
        assert_eq!(idx.title, Some(0));
    }

    #[test]
    fn test_get_string_cell_blank_is_none() {
        let row = vec![
            calamine::Data::String("  ".to_string()),
            calamine::Data::Int(7),
        ];
        assert_eq!(get_string_cell(&row, Some(0)), None);
        assert_eq!(get_string_cell(&row, Some(1)), Some("7".to_string()));
        assert_eq!(get_string_cell(&row, Some(5)), None);
        assert_eq!(get_string_cell(&row, None), None);
    }
}
