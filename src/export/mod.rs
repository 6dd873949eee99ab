//! Export of crawled papers.
//!
//! CSV output is flat: one row per (paper, author) pair with a header row and no
//! index column, so a paper without authors does not appear at all. JSON output
//! keeps the nested paper/author structure.

use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::models::{ExportRow, PaperEntry};

/// Export file format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Csv,
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Csv => write!(f, "csv"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

/// Errors that can occur while writing an export
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Project papers onto export rows in traversal order
pub fn flatten(papers: &[PaperEntry]) -> Vec<ExportRow> {
    papers
        .iter()
        .flat_map(|paper| {
            paper
                .authors
                .iter()
                .map(move |author| ExportRow::new(paper, author))
        })
        .collect()
}

/// Write rows as CSV with a header row
pub fn write_csv<W: Write>(writer: W, rows: &[ExportRow]) -> Result<(), ExportError> {
    let mut csv_writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);

    // Written explicitly so an empty export still carries the header
    csv_writer.write_record(ExportRow::HEADERS)?;
    for row in rows {
        csv_writer.serialize(row)?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// Write papers as pretty-printed JSON
pub fn write_json<W: Write>(writer: W, papers: &[PaperEntry]) -> Result<(), ExportError> {
    let mut writer = BufWriter::new(writer);
    serde_json::to_writer_pretty(&mut writer, papers)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}

/// Export papers to `path` in the given format, returning the number of records written
pub fn export_to_file(
    papers: &[PaperEntry],
    path: &Path,
    format: OutputFormat,
) -> Result<usize, ExportError> {
    let file = File::create(path)?;

    let written = match format {
        OutputFormat::Csv => {
            let rows = flatten(papers);
            write_csv(file, &rows)?;
            rows.len()
        }
        OutputFormat::Json => {
            write_json(file, papers)?;
            papers.len()
        }
    };

    tracing::info!(
        path = %path.display(),
        format = %format,
        records = written,
        "Export written"
    );
    Ok(written)
}
