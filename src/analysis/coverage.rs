use crate::analysis::table;
use crate::error::Result;
use crate::models::metrics::{CoverageRow, CoverageTable};
use std::io::Read;
use std::path::{Path, PathBuf};

const PACKAGE_COLUMN: usize = 1;
const CLASS_COLUMN: usize = 2;
const MISSED_COLUMN: usize = 3;
const COVERED_COLUMN: usize = 4;

/// Per-module coverage tables inside `dir`, sorted by file name.
///
/// A missing directory means no module ran tests and yields no tables.
pub fn module_tables(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let pattern = format!("{}/*.csv", glob::Pattern::escape(&dir.to_string_lossy()));
    let entries = glob::glob(&pattern)?;

    let mut tables = Vec::new();
    for entry in entries {
        match entry {
            Ok(path) => tables.push(path),
            Err(e) => log::warn!("Skipping unreadable coverage entry: {e}"),
        }
    }
    tables.sort();
    Ok(tables)
}

/// Merge coverage rows of every module table into one package-keyed table.
/// Tables that do not exist are skipped.
pub fn read_coverage_tables(paths: &[PathBuf]) -> Result<CoverageTable> {
    let mut merged = CoverageTable::new();

    for path in paths {
        if !path.exists() {
            log::debug!("No coverage table at {}", path.display());
            continue;
        }
        let mut reader = table::open(path)?;
        for (package, rows) in parse_coverage_table(&mut reader, path)? {
            merged.entry(package).or_default().extend(rows);
        }
    }

    Ok(merged)
}

pub fn parse_coverage_table<R: Read>(reader: &mut csv::Reader<R>, path: &Path) -> Result<CoverageTable> {
    table::rows(reader, path).try_fold(CoverageTable::new(), |mut coverage, record| {
        let record = record?;
        let row = CoverageRow {
            package: table::field(&record, PACKAGE_COLUMN, path)?.to_string(),
            class: table::field(&record, CLASS_COLUMN, path)?.to_string(),
            instructions_missed: table::number(&record, MISSED_COLUMN, path)?,
            instructions_covered: table::number(&record, COVERED_COLUMN, path)?,
        };
        coverage.entry(row.package.clone()).or_default().push(row);
        Ok(coverage)
    })
}
