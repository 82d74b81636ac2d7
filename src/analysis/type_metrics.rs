use crate::analysis::table;
use crate::error::Result;
use crate::models::metrics::{ClassMetrics, ClassTable};
use std::io::Read;
use std::path::Path;

const PACKAGE_COLUMN: usize = 1;
const CLASS_COLUMN: usize = 2;
const LOC_COLUMN: usize = 7;
const FAN_IN_COLUMN: usize = 12;
const FAN_OUT_COLUMN: usize = 13;

/// Read per-class metrics grouped by package. Within a package, classes keep
/// the order in which the table lists them.
pub fn read_class_metrics(path: &Path) -> Result<ClassTable> {
    let mut reader = table::open(path)?;
    parse_class_metrics(&mut reader, path)
}

pub fn parse_class_metrics<R: Read>(reader: &mut csv::Reader<R>, path: &Path) -> Result<ClassTable> {
    table::rows(reader, path).try_fold(ClassTable::new(), |mut classes, record| {
        let record = record?;
        let metrics = ClassMetrics {
            package: table::field(&record, PACKAGE_COLUMN, path)?.to_string(),
            class: table::field(&record, CLASS_COLUMN, path)?.to_string(),
            loc: table::number(&record, LOC_COLUMN, path)?,
            fan_in: table::number(&record, FAN_IN_COLUMN, path)?,
            fan_out: table::number(&record, FAN_OUT_COLUMN, path)?,
        };
        classes
            .entry(metrics.package.clone())
            .or_insert_with(Vec::new)
            .push(metrics);
        Ok(classes)
    })
}
