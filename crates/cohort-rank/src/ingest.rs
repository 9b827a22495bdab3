//! Loading raw score sheets and rosters from disk.

use crate::pipeline::{records_from_json, FieldValue, PipelineError, Record};
use serde_json::Value;
use std::io::Read;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("failed to read input: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid JSON input: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid CSV input: {0}")]
    Csv(#[from] csv::Error),
    #[error("expected a JSON array of records, found {0}")]
    NotAList(&'static str),
    #[error(transparent)]
    Record(#[from] PipelineError),
    #[error("unsupported input format for {}: expected .json or .csv", .0.display())]
    UnsupportedFormat(PathBuf),
}

/// Reads a JSON array of flat objects.
pub fn read_json<R: Read>(reader: R) -> Result<Vec<Record>, IngestError> {
    let document: Value = serde_json::from_reader(reader)?;
    let rows = match document {
        Value::Array(rows) => rows,
        Value::Object(_) => return Err(IngestError::NotAList("an object")),
        Value::String(_) => return Err(IngestError::NotAList("a string")),
        Value::Number(_) => return Err(IngestError::NotAList("a number")),
        Value::Bool(_) => return Err(IngestError::NotAList("a boolean")),
        Value::Null => return Err(IngestError::NotAList("null")),
    };
    Ok(records_from_json(&rows)?)
}

/// Reads a headed CSV sheet. Blank cells are empty, every other cell is text.
pub fn read_csv<R: Read>(reader: R) -> Result<Vec<Record>, IngestError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    let headers: Vec<String> = csv_reader
        .headers()?
        .iter()
        .map(|header| header.trim_start_matches('\u{feff}').to_string())
        .collect();

    let mut records = Vec::new();
    for row in csv_reader.records() {
        let row = row?;
        let record: Record = headers
            .iter()
            .enumerate()
            .map(|(column, header)| {
                let cell = row.get(column).unwrap_or_default();
                (header.clone(), FieldValue::from_cell(cell))
            })
            .collect();
        records.push(record);
    }

    Ok(records)
}

/// Loads records from `path`, choosing the reader from the file extension.
pub fn load_path<P: AsRef<Path>>(path: P) -> Result<Vec<Record>, IngestError> {
    let path = path.as_ref();
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);

    let records = match extension.as_deref() {
        Some("json") => read_json(std::fs::File::open(path)?)?,
        Some("csv") => read_csv(std::fs::File::open(path)?)?,
        _ => return Err(IngestError::UnsupportedFormat(path.to_path_buf())),
    };

    debug!(path = %path.display(), records = records.len(), "loaded records");
    Ok(records)
}
