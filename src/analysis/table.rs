//! Positional access to the headered CSV tables the analysis tools emit.

use crate::error::{PipelineError, Result};
use csv::StringRecord;
use std::fs::File;
use std::io::Read;
use std::path::Path;

pub fn reader<R: Read>(input: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(input)
}

pub fn open(path: &Path) -> Result<csv::Reader<File>> {
    let file = File::open(path).map_err(|e| PipelineError::io(e, path))?;
    Ok(reader(file))
}

/// Iterate data rows, attaching `path` to any decoding error.
pub fn rows<'a, R: Read + 'a>(
    reader: &'a mut csv::Reader<R>,
    path: &'a Path,
) -> impl Iterator<Item = Result<StringRecord>> + 'a {
    reader
        .records()
        .map(move |record| record.map_err(|e| PipelineError::csv(e, path)))
}

pub fn field<'r>(record: &'r StringRecord, index: usize, path: &Path) -> Result<&'r str> {
    record
        .get(index)
        .map(str::trim)
        .ok_or_else(|| malformed(record, path, format!("missing column {index}")))
}

pub fn number(record: &StringRecord, index: usize, path: &Path) -> Result<u64> {
    let raw = field(record, index, path)?;
    raw.parse::<u64>()
        .map_err(|e| malformed(record, path, format!("column {index} value \"{raw}\": {e}")))
}

fn malformed(record: &StringRecord, path: &Path, reason: String) -> PipelineError {
    PipelineError::MalformedRow {
        path: path.to_path_buf(),
        row: record.position().map_or(0, |p| p.line()),
        reason,
    }
}
