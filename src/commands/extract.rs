use crate::analysis::arch_summary::{read_project_metric, DECOUPLING_LEVEL, PROPAGATION_COST};
use crate::analysis::coverage::{module_tables, read_coverage_tables};
use crate::analysis::report::{build_report, SnapshotReport, SnapshotTables};
use crate::analysis::smells::{read_dense_structure_average_degree, read_smell_table};
use crate::analysis::type_metrics::read_class_metrics;
use crate::commands::settings::Settings;
use crate::commands::snapshot::subdirectories;
use crate::commands::timeseries::{project_snapshots, write_package_series, write_test_summary_series};
use crate::error::{PipelineError, Result};
use crate::models::metrics::ProjectScalars;
use crate::models::snapshot::SnapshotResults;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default)]
pub struct ExtractSummary {
    pub reports: Vec<PathBuf>,
    pub failed_snapshots: usize,
    pub series: Vec<PathBuf>,
}

/// Write `output.csv` for every analyzed snapshot, then each project's
/// time-series files. A snapshot whose tool output cannot be read is logged
/// and left out.
pub fn extract_all(settings: &Settings) -> Result<ExtractSummary> {
    let mut summary = ExtractSummary::default();

    for project_dir in subdirectories(&settings.results_directory)? {
        let Some(project) = project_dir.file_name().map(|n| n.to_string_lossy().into_owned()) else {
            continue;
        };
        let snapshots = match project_snapshots(&project, &project_dir) {
            Ok(snapshots) => snapshots,
            Err(e) => {
                log::error!("Unable to access snapshots of {project}: {e}");
                continue;
            }
        };
        log::info!("{project}: extracting {} snapshots", snapshots.len());

        for snapshot in &snapshots {
            match extract_snapshot(snapshot).and_then(|report| write_report(&snapshot.report_csv(), &report)) {
                Ok(()) => summary.reports.push(snapshot.report_csv()),
                Err(e) => {
                    log::error!(
                        "{project}: skipping snapshot {} ({}): {e}",
                        snapshot.date_label(),
                        snapshot.dir.display()
                    );
                    summary.failed_snapshots += 1;
                    remove_stale_report(snapshot);
                }
            }
        }

        match write_test_summary_series(&project_dir, &snapshots) {
            Ok(path) => summary.series.push(path),
            Err(e) => log::error!("{project}: could not write the test series: {e}"),
        }
        match write_package_series(&project_dir, &snapshots) {
            Ok(paths) => summary.series.extend(paths),
            Err(e) => log::error!("{project}: could not write the package series: {e}"),
        }
    }

    Ok(summary)
}

/// A report left by an earlier run must not reach the series of a snapshot
/// that failed this time.
fn remove_stale_report(snapshot: &SnapshotResults) {
    let path = snapshot.report_csv();
    match fs::remove_file(&path) {
        Ok(()) => log::warn!("{}: removed stale {}", snapshot.project, path.display()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => log::error!("{}: could not remove stale {}: {e}", snapshot.project, path.display()),
    }
}

/// Read every tool output of one snapshot into memory.
pub fn extract_tables(snapshot: &SnapshotResults) -> Result<SnapshotTables> {
    let smells_csv = snapshot.smells_csv();
    let summary_html = snapshot.architecture_summary_html();

    let smells = read_smell_table(&smells_csv)?;
    let classes = read_class_metrics(&snapshot.type_metrics_csv())?;
    let coverage = read_coverage_tables(&module_tables(&snapshot.jacoco_dir())?)?;
    let scalars = ProjectScalars {
        decoupling_level: read_project_metric(&summary_html, DECOUPLING_LEVEL)?,
        propagation_cost: read_project_metric(&summary_html, PROPAGATION_COST)?,
        dense_structure_average_degree: read_dense_structure_average_degree(&smells_csv)?,
    };

    Ok(SnapshotTables {
        smells,
        classes,
        coverage,
        scalars,
    })
}

pub fn extract_snapshot(snapshot: &SnapshotResults) -> Result<SnapshotReport> {
    extract_tables(snapshot).map(|tables| build_report(&tables))
}

pub fn write_report(path: &Path, report: &SnapshotReport) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).map_err(|e| PipelineError::csv(e, path))?;
    writer
        .write_record(SnapshotReport::header())
        .map_err(|e| PipelineError::csv(e, path))?;
    for record in report.records() {
        writer.write_record(&record).map_err(|e| PipelineError::csv(e, path))?;
    }
    writer.flush().map_err(|e| PipelineError::io(e, path))?;
    Ok(())
}
