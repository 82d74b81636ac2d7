use chrono::NaiveDate;
use std::path::{Path, PathBuf};

/// Snapshot directories are named after their sample date.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

pub const DESIGNITE_DIR: &str = "DesigniteResults";
pub const JACOCO_DIR: &str = "JacocoResults";
pub const DV8_PROJECT_NAME: &str = "DV8Results";
pub const SMELLS_FILE: &str = "ArchitectureSmells.csv";
pub const TYPE_METRICS_FILE: &str = "TypeMetrics.csv";
pub const TEST_DATA_FILE: &str = "testdata.csv";
pub const REPORT_FILE: &str = "output.csv";
pub const TEST_SUMMARY_FILE: &str = "testdata-summary.csv";

/// One analyzed snapshot: `<results>/<project>/<date>/`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotResults {
    pub project: String,
    pub date: NaiveDate,
    pub dir: PathBuf,
}

impl SnapshotResults {
    /// Builds a handle from a results directory whose name is a sample date.
    /// Returns `None` when the directory name is not a `yyyy-mm-dd` date.
    pub fn from_dir(project: &str, dir: &Path) -> Option<Self> {
        let name = dir.file_name()?.to_str()?;
        let date = parse_snapshot_date(name)?;
        Some(Self {
            project: project.to_string(),
            date,
            dir: dir.to_path_buf(),
        })
    }

    pub fn date_label(&self) -> String {
        self.date.format(DATE_FORMAT).to_string()
    }

    pub fn designite_dir(&self) -> PathBuf {
        self.dir.join(DESIGNITE_DIR)
    }

    pub fn smells_csv(&self) -> PathBuf {
        self.designite_dir().join(SMELLS_FILE)
    }

    pub fn type_metrics_csv(&self) -> PathBuf {
        self.designite_dir().join(TYPE_METRICS_FILE)
    }

    pub fn jacoco_dir(&self) -> PathBuf {
        self.dir.join(JACOCO_DIR)
    }

    pub fn architecture_summary_html(&self) -> PathBuf {
        self.dir
            .join(DV8_PROJECT_NAME)
            .join("dv8-analysis-result")
            .join("analysis-summary.html")
    }

    pub fn test_data_csv(&self) -> PathBuf {
        self.dir.join(TEST_DATA_FILE)
    }

    pub fn report_csv(&self) -> PathBuf {
        self.dir.join(REPORT_FILE)
    }
}

pub fn parse_snapshot_date(name: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(name, DATE_FORMAT).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_date_directories() {
        assert!(SnapshotResults::from_dir("p", Path::new("/tmp/p/JacocoResults")).is_none());
        assert!(SnapshotResults::from_dir("p", Path::new("/tmp/p/2023-13-01")).is_none());
    }

    #[test]
    fn resolves_tool_output_paths() {
        let snapshot = SnapshotResults::from_dir("p", Path::new("/r/p/2023-01-01")).unwrap();
        assert_eq!(snapshot.date_label(), "2023-01-01");
        assert_eq!(
            snapshot.smells_csv(),
            PathBuf::from("/r/p/2023-01-01/DesigniteResults/ArchitectureSmells.csv")
        );
        assert_eq!(
            snapshot.architecture_summary_html(),
            PathBuf::from("/r/p/2023-01-01/DV8Results/dv8-analysis-result/analysis-summary.html")
        );
    }
}
