//! Joins per-snapshot outputs of one project into per-package and test
//! time series, one row per snapshot date.

use crate::analysis::report::SnapshotReport;
use crate::analysis::table;
use crate::commands::snapshot::subdirectories;
use crate::error::{PipelineError, Result};
use crate::models::snapshot::{SnapshotResults, DATE_FORMAT, TEST_SUMMARY_FILE};
use crate::models::test_summary::TEST_SUMMARY_COLUMNS;
use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

pub const DATE_COLUMN: &str = "Date";

/// Dated snapshot directories of a project's results, oldest first.
pub fn project_snapshots(project: &str, project_dir: &Path) -> Result<Vec<SnapshotResults>> {
    let mut snapshots: Vec<SnapshotResults> = subdirectories(project_dir)?
        .into_iter()
        .filter_map(|dir| {
            let snapshot = SnapshotResults::from_dir(project, &dir);
            if snapshot.is_none() {
                log::warn!("{project}: ignoring {}, not a dated snapshot", dir.display());
            }
            snapshot
        })
        .collect();
    snapshots.sort_by_key(|snapshot| snapshot.date);
    Ok(snapshots)
}

/// Write `testdata-summary.csv`: the test counters of every snapshot by date.
pub fn write_test_summary_series(project_dir: &Path, snapshots: &[SnapshotResults]) -> Result<PathBuf> {
    let mut rows: Vec<(NaiveDate, Vec<String>)> = Vec::new();
    for snapshot in snapshots {
        let path = snapshot.test_data_csv();
        if !path.is_file() {
            log::warn!("{}: no test data for {}", snapshot.project, snapshot.date_label());
            continue;
        }
        match first_row(&path) {
            Ok(Some(values)) => rows.push((snapshot.date, values)),
            Ok(None) => log::warn!(
                "{}: test data for {} has no rows ({})",
                snapshot.project,
                snapshot.date_label(),
                path.display()
            ),
            Err(e) => log::error!(
                "{}: leaving {} out of the test series: {e}",
                snapshot.project,
                snapshot.date_label()
            ),
        }
    }

    let header: Vec<String> = TEST_SUMMARY_COLUMNS.iter().map(|c| c.to_string()).collect();
    let path = project_dir.join(TEST_SUMMARY_FILE);
    write_series(&path, &header, rows)?;
    Ok(path)
}

/// Write one `<package>.csv` per package found in any snapshot report,
/// including the project summary row.
pub fn write_package_series(project_dir: &Path, snapshots: &[SnapshotResults]) -> Result<Vec<PathBuf>> {
    let mut by_package: BTreeMap<String, Vec<(NaiveDate, Vec<String>)>> = BTreeMap::new();

    for snapshot in snapshots {
        let path = snapshot.report_csv();
        if !path.is_file() {
            continue;
        }
        match report_rows(&path) {
            Ok(report) => {
                for (package, values) in report {
                    by_package.entry(package).or_default().push((snapshot.date, values));
                }
            }
            Err(e) => log::error!(
                "{}: leaving {} out of the package series: {e}",
                snapshot.project,
                snapshot.date_label()
            ),
        }
    }

    // Every report column except the package name.
    let header: Vec<String> = SnapshotReport::header().into_iter().skip(1).collect();

    let mut written = Vec::with_capacity(by_package.len());
    for (package, rows) in by_package {
        let path = project_dir.join(format!("{}.csv", file_stem(&package)));
        write_series(&path, &header, rows)?;
        written.push(path);
    }
    Ok(written)
}

fn first_row(path: &Path) -> Result<Option<Vec<String>>> {
    let mut reader = table::open(path)?;
    let first = table::rows(&mut reader, path).next();
    first
        .map(|record| record.map(|record| record.iter().map(str::to_string).collect()))
        .transpose()
}

/// Package name and remaining columns of every row of a snapshot report.
/// Any unreadable row rejects the whole report.
fn report_rows(path: &Path) -> Result<Vec<(String, Vec<String>)>> {
    let mut reader = table::open(path)?;
    let mut rows = Vec::new();
    for record in table::rows(&mut reader, path) {
        let record = record?;
        let package = table::field(&record, 0, path)?.to_string();
        rows.push((package, record.iter().skip(1).map(str::to_string).collect()));
    }
    Ok(rows)
}

fn write_series(path: &Path, columns: &[String], mut rows: Vec<(NaiveDate, Vec<String>)>) -> Result<()> {
    rows.sort_by_key(|(date, _)| *date);

    let mut writer = csv::Writer::from_path(path).map_err(|e| PipelineError::csv(e, path))?;
    let header = std::iter::once(DATE_COLUMN).chain(columns.iter().map(String::as_str));
    writer.write_record(header).map_err(|e| PipelineError::csv(e, path))?;

    for (date, values) in rows {
        let date = date.format(DATE_FORMAT).to_string();
        let record = std::iter::once(date.as_str()).chain(values.iter().map(String::as_str));
        writer.write_record(record).map_err(|e| PipelineError::csv(e, path))?;
    }
    writer.flush().map_err(|e| PipelineError::io(e, path))?;
    Ok(())
}

fn file_stem(package: &str) -> String {
    package
        .chars()
        .map(|c| if matches!(c, '/' | '\\' | ':') { '_' } else { c })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn snapshot_dir(project_dir: &Path, date: &str) -> SnapshotResults {
        let dir = project_dir.join(date);
        fs::create_dir_all(&dir).unwrap();
        SnapshotResults::from_dir("demo", &dir).unwrap()
    }

    #[test]
    fn test_summary_rows_follow_dates() {
        let project = tempfile::tempdir().unwrap();
        let later = snapshot_dir(project.path(), "2023-03-01");
        let earlier = snapshot_dir(project.path(), "2023-01-01");
        let header = TEST_SUMMARY_COLUMNS.join(",");
        fs::write(later.test_data_csv(), format!("{header}\n9,1,0,0,10,90.00\n")).unwrap();
        fs::write(earlier.test_data_csv(), format!("{header}\n0,0,0,0,0,-1.00\n")).unwrap();

        let path = write_test_summary_series(project.path(), &[later, earlier]).unwrap();
        let text = fs::read_to_string(path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], format!("Date,{header}"));
        assert_eq!(lines[1], "2023-01-01,0,0,0,0,0,-1.00");
        assert_eq!(lines[2], "2023-03-01,9,1,0,0,10,90.00");
    }

    #[test]
    fn non_date_directories_are_ignored() {
        let project = tempfile::tempdir().unwrap();
        fs::create_dir_all(project.path().join("2023-02-01")).unwrap();
        fs::create_dir_all(project.path().join("scratch")).unwrap();
        fs::write(project.path().join("2023-01-01"), "not a directory").unwrap();

        let snapshots = project_snapshots("demo", project.path()).unwrap();
        assert_eq!(snapshots.len(), 1);
        assert_eq!(snapshots[0].date_label(), "2023-02-01");
    }

    #[test]
    fn header_only_or_unreadable_test_data_is_left_out() {
        let project = tempfile::tempdir().unwrap();
        let empty = snapshot_dir(project.path(), "2023-01-01");
        let garbled = snapshot_dir(project.path(), "2023-02-01");
        let good = snapshot_dir(project.path(), "2023-03-01");
        let header = TEST_SUMMARY_COLUMNS.join(",");
        fs::write(empty.test_data_csv(), format!("{header}\n")).unwrap();
        fs::write(garbled.test_data_csv(), [header.as_bytes(), &b"\n\xff\xfe,1\n"[..]].concat()).unwrap();
        fs::write(good.test_data_csv(), format!("{header}\n1,0,0,0,1,100.00\n")).unwrap();

        let path = write_test_summary_series(project.path(), &[empty, garbled, good]).unwrap();
        let text = fs::read_to_string(path).unwrap();
        assert_eq!(text.lines().skip(1).collect::<Vec<_>>(), vec!["2023-03-01,1,0,0,0,1,100.00"]);
    }

    #[test]
    fn package_rows_survive_the_join_unchanged() {
        use crate::analysis::report::{build_report, SnapshotTables};
        use crate::analysis::smells::ALL_PACKAGES_KEY;
        use crate::commands::extract::write_report;
        use crate::models::metrics::{ClassMetrics, CoverageRow, ProjectScalars, SmellCounts, SmellKind};

        let class = |package: &str, loc| ClassMetrics {
            package: package.to_string(),
            class: "C".to_string(),
            loc,
            fan_in: 1,
            fan_out: 2,
        };
        let mut cyclic = SmellCounts::default();
        cyclic.increment(SmellKind::CyclicDependency);
        cyclic.increment(SmellKind::GodComponent);

        let mut tables = SnapshotTables::default();
        tables.classes.insert("com.a".into(), vec![class("com.a", 12), class("com.a", 30)]);
        tables.classes.insert("com.b".into(), vec![class("com.b", 7)]);
        tables.smells.insert("com.a".into(), cyclic);
        tables.smells.insert(ALL_PACKAGES_KEY.into(), cyclic);
        tables.coverage.insert(
            "com.a".into(),
            vec![CoverageRow {
                package: "com.a".into(),
                class: "C".into(),
                instructions_covered: 3,
                instructions_missed: 1,
            }],
        );
        tables.scalars = ProjectScalars {
            decoupling_level: 61.2,
            propagation_cost: 8.0,
            dense_structure_average_degree: 2.5,
        };
        let report = build_report(&tables);

        let project = tempfile::tempdir().unwrap();
        let snapshot = snapshot_dir(project.path(), "2023-05-01");
        write_report(&snapshot.report_csv(), &report).unwrap();
        let written = write_package_series(project.path(), &[snapshot]).unwrap();
        assert_eq!(written.len(), 3);

        for record in report.records() {
            let path = project.path().join(format!("{}.csv", file_stem(&record[0])));
            let mut reader = table::open(&path).unwrap();
            let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
            assert_eq!(rows.len(), 1, "{}", record[0]);
            assert_eq!(&rows[0][0], "2023-05-01");
            let joined: Vec<&str> = rows[0].iter().skip(1).collect();
            let original: Vec<&str> = record.iter().skip(1).map(String::as_str).collect();
            assert_eq!(joined, original, "{}", record[0]);
        }
    }

    #[test]
    fn package_names_become_safe_file_names() {
        assert_eq!(file_stem("com.example"), "com.example");
        assert_eq!(file_stem("a/b"), "a_b");
    }
}
