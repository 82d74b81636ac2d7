use crate::models::metrics::{
    ClassTable, CoverageTable, InstructionTotals, ProjectScalars, SmellCounts, SmellKind, SmellTable,
};

pub const PACKAGE_COLUMN: &str = "Namespace";
pub const SUMMARY_ROW_LABEL: &str = "all (includes smells in all packages)";

/// Extractor outputs for one snapshot.
#[derive(Debug, Clone, Default)]
pub struct SnapshotTables {
    pub smells: SmellTable,
    pub classes: ClassTable,
    pub coverage: CoverageTable,
    pub scalars: ProjectScalars,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PackageRow {
    pub package: String,
    pub smells: SmellCounts,
    /// `None` when no coverage data exists for the package.
    pub coverage: Option<f64>,
    pub loc: u64,
    pub class_count: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProjectRow {
    pub smells: SmellCounts,
    pub scalars: ProjectScalars,
    pub coverage: Option<f64>,
    pub loc: u64,
    pub class_count: usize,
}

/// Cross-sectional report of one snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotReport {
    pub packages: Vec<PackageRow>,
    pub project: ProjectRow,
}

/// Join the extractor tables into one row per package with class metrics
/// plus a project-wide row.
///
/// Project smell and coverage totals cover every package in the smell and
/// coverage tables, including packages without class metrics and the
/// catch-all `<All packages>` bucket.
pub fn build_report(tables: &SnapshotTables) -> SnapshotReport {
    let packages: Vec<PackageRow> = tables
        .classes
        .iter()
        .map(|(package, classes)| PackageRow {
            package: package.clone(),
            smells: tables.smells.get(package).copied().unwrap_or_default(),
            coverage: tables.coverage.get(package).and_then(|rows| {
                rows.iter()
                    .fold(InstructionTotals::default(), |mut totals, row| {
                        totals.add(row);
                        totals
                    })
                    .percentage()
            }),
            loc: classes.iter().map(|class| class.loc).sum(),
            class_count: classes.len(),
        })
        .collect();

    let smells = tables
        .smells
        .values()
        .fold(SmellCounts::default(), |mut total, counts| {
            total += counts;
            total
        });
    let instructions = tables
        .coverage
        .values()
        .flatten()
        .fold(InstructionTotals::default(), |mut totals, row| {
            totals.add(row);
            totals
        });

    let project = ProjectRow {
        smells,
        scalars: tables.scalars,
        coverage: instructions.percentage(),
        loc: packages.iter().map(|row| row.loc).sum(),
        class_count: packages.iter().map(|row| row.class_count).sum(),
    };

    SnapshotReport { packages, project }
}

impl SnapshotReport {
    pub fn header() -> Vec<String> {
        let mut header = vec![PACKAGE_COLUMN.to_string()];
        header.extend(SmellKind::ALL.iter().map(|kind| kind.label().to_string()));
        header.extend(
            [
                "Total Smells",
                "DS avg. degree",
                "PC",
                "DL",
                "Code Coverage",
                "LOC",
                "Nr. of Classes",
            ]
            .map(String::from),
        );
        header
    }

    pub fn records(&self) -> Vec<Vec<String>> {
        let mut records: Vec<Vec<String>> = self.packages.iter().map(PackageRow::record).collect();
        records.push(self.project.record());
        records
    }
}

impl PackageRow {
    fn record(&self) -> Vec<String> {
        let mut record = vec![self.package.clone()];
        record.extend(smell_fields(&self.smells));
        // Project scalars only apply to the summary row.
        record.extend([String::new(), String::new(), String::new()]);
        record.push(format_coverage(self.coverage));
        record.push(self.loc.to_string());
        record.push(self.class_count.to_string());
        record
    }
}

impl ProjectRow {
    fn record(&self) -> Vec<String> {
        let mut record = vec![SUMMARY_ROW_LABEL.to_string()];
        record.extend(smell_fields(&self.smells));
        record.push(format!("{:.2}", self.scalars.dense_structure_average_degree));
        record.push(format!("{:.2}%", self.scalars.propagation_cost));
        record.push(format!("{:.2}%", self.scalars.decoupling_level));
        record.push(format_coverage(self.coverage));
        record.push(self.loc.to_string());
        record.push(self.class_count.to_string());
        record
    }
}

fn smell_fields(smells: &SmellCounts) -> Vec<String> {
    smells
        .values()
        .chain(std::iter::once(smells.total()))
        .map(|count| count.to_string())
        .collect()
}

fn format_coverage(coverage: Option<f64>) -> String {
    coverage.map(|pct| format!("{pct:.2}%")).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::smells::ALL_PACKAGES_KEY;
    use crate::models::metrics::{ClassMetrics, CoverageRow};

    fn class(package: &str, name: &str, loc: u64) -> ClassMetrics {
        ClassMetrics {
            package: package.to_string(),
            class: name.to_string(),
            loc,
            fan_in: 0,
            fan_out: 0,
        }
    }

    fn coverage(package: &str, covered: u64, missed: u64) -> CoverageRow {
        CoverageRow {
            package: package.to_string(),
            class: "C".to_string(),
            instructions_covered: covered,
            instructions_missed: missed,
        }
    }

    fn smells(kinds: &[SmellKind]) -> SmellCounts {
        let mut counts = SmellCounts::default();
        for kind in kinds {
            counts.increment(*kind);
        }
        counts
    }

    #[test]
    fn header_has_fixed_layout() {
        let header = SnapshotReport::header();
        assert_eq!(header.len(), 15);
        assert_eq!(header[0], "Namespace");
        assert_eq!(header[2], "Cyclic Dependency");
        assert_eq!(header[8], "Total Smells");
        assert_eq!(header[14], "Nr. of Classes");
    }

    #[test]
    fn package_coverage_is_blank_without_rows() {
        let mut tables = SnapshotTables::default();
        tables.classes.insert("a".into(), vec![class("a", "A", 5)]);
        tables.classes.insert("b".into(), vec![class("b", "B", 7)]);
        tables.coverage.insert("b".into(), vec![coverage("b", 1, 2)]);

        let records = build_report(&tables).records();
        assert_eq!(records[0][12], "");
        assert_eq!(records[1][12], "33.33%");
    }

    #[test]
    fn cyclic_dependency_counts_per_package_and_project() {
        let mut tables = SnapshotTables::default();
        tables.classes.insert("a".into(), vec![class("a", "A", 1)]);
        tables.classes.insert("b".into(), vec![class("b", "B", 1)]);
        tables.smells.insert(
            "a".into(),
            smells(&[SmellKind::CyclicDependency; 3]),
        );

        let report = build_report(&tables);
        assert_eq!(report.packages[0].smells.get(SmellKind::CyclicDependency), 3);
        assert_eq!(report.packages[1].smells.get(SmellKind::CyclicDependency), 0);
        assert_eq!(report.project.smells.get(SmellKind::CyclicDependency), 3);

        let records = report.records();
        assert_eq!(records[1][2], "0");
        assert_eq!(records[2][0], SUMMARY_ROW_LABEL);
        assert_eq!(records[2][2], "3");
    }

    #[test]
    fn project_totals_include_catch_all_and_unlisted_packages() {
        let mut tables = SnapshotTables::default();
        tables.classes.insert(
            "a".into(),
            vec![class("a", "A1", 10), class("a", "A2", 20)],
        );
        tables.smells.insert("a".into(), smells(&[SmellKind::GodComponent]));
        tables.smells.insert(
            ALL_PACKAGES_KEY.into(),
            smells(&[SmellKind::DenseStructure, SmellKind::DenseStructure]),
        );
        tables.smells.insert("orphan".into(), smells(&[SmellKind::UnstableDependency]));
        tables.coverage.insert("a".into(), vec![coverage("a", 8, 2)]);
        tables.coverage.insert("orphan".into(), vec![coverage("orphan", 0, 10)]);
        tables.scalars = ProjectScalars {
            decoupling_level: 73.4,
            propagation_cost: 12.5,
            dense_structure_average_degree: 3.456,
        };

        let report = build_report(&tables);
        assert_eq!(report.packages.len(), 1);

        let package_total: u32 = report.packages.iter().map(|p| p.smells.total()).sum();
        assert_eq!(report.project.smells.total(), package_total + 2 + 1);

        let summary = &report.records()[1];
        assert_eq!(summary[8], "4");
        assert_eq!(summary[9], "3.46");
        assert_eq!(summary[10], "12.50%");
        assert_eq!(summary[11], "73.40%");
        assert_eq!(summary[12], "40.00%");
        assert_eq!(summary[13], "30");
        assert_eq!(summary[14], "2");
    }

    #[test]
    fn project_coverage_is_blank_without_instructions() {
        let mut tables = SnapshotTables::default();
        tables.classes.insert("a".into(), vec![class("a", "A", 1)]);
        let report = build_report(&tables);
        assert_eq!(report.project.coverage, None);
        assert_eq!(report.records()[1][12], "");
    }
}
