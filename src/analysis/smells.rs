use crate::analysis::table;
use crate::error::{PipelineError, Result};
use crate::models::metrics::{SmellCounts, SmellKind, SmellTable};
use regex::Regex;
use std::io::Read;
use std::path::Path;

/// Package key the analysis tool uses for smells spanning the whole project.
pub const ALL_PACKAGES_KEY: &str = "<All packages>";

const PACKAGE_COLUMN: usize = 1;
const SMELL_COLUMN: usize = 2;
const AVERAGE_DEGREE_PREFIX: &str = "Average degree = ";

/// Count smell occurrences per package from an architecture smells table.
pub fn read_smell_table(path: &Path) -> Result<SmellTable> {
    let mut reader = table::open(path)?;
    parse_smell_table(&mut reader, path)
}

pub fn parse_smell_table<R: Read>(reader: &mut csv::Reader<R>, path: &Path) -> Result<SmellTable> {
    table::rows(reader, path).try_fold(SmellTable::new(), |mut smells, record| {
        let record = record?;
        let package = table::field(&record, PACKAGE_COLUMN, path)?;
        let label = table::field(&record, SMELL_COLUMN, path)?;
        let kind = SmellKind::from_label(label).ok_or_else(|| PipelineError::UnknownSmell {
            kind: label.to_string(),
            path: path.to_path_buf(),
        })?;

        smells
            .entry(package.to_string())
            .or_insert_with(SmellCounts::default)
            .increment(kind);
        Ok(smells)
    })
}

/// Average degree reported alongside Dense Structure smells.
///
/// A table without any Dense Structure smell yields `0.0`.
pub fn read_dense_structure_average_degree(path: &Path) -> Result<f64> {
    let text = std::fs::read_to_string(path).map_err(|e| PipelineError::io(e, path))?;
    parse_dense_structure_average_degree(&text)?.ok_or_else(|| PipelineError::MetricNotFound {
        metric: AVERAGE_DEGREE_PREFIX.trim_end_matches(" = ").to_string(),
        path: path.to_path_buf(),
    })
}

/// `Ok(None)` means Dense Structure is present but its degree could not be read.
pub fn parse_dense_structure_average_degree(text: &str) -> Result<Option<f64>> {
    if !text.contains(SmellKind::DenseStructure.label()) {
        return Ok(Some(0.0));
    }

    let Some(start) = text.find(AVERAGE_DEGREE_PREFIX) else {
        return Ok(None);
    };
    let numeral = Regex::new(r"^\d+(?:\.\d+)?")?;
    let rest = &text[start + AVERAGE_DEGREE_PREFIX.len()..];

    Ok(numeral
        .find(rest)
        .and_then(|m| m.as_str().parse::<f64>().ok()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "Project Name,Package Name,Architecture Smell,Cause of the Smell\n";

    fn parse(body: &str) -> Result<SmellTable> {
        let input = format!("{HEADER}{body}");
        let mut reader = table::reader(input.as_bytes());
        parse_smell_table(&mut reader, Path::new("ArchitectureSmells.csv"))
    }

    #[test]
    fn counts_smells_per_package() {
        let smells = parse(
            "p,a,Cyclic Dependency,cause\n\
             p,a,Cyclic Dependency,cause\n\
             p,a,Cyclic Dependency,cause\n\
             p,b,God Component,\"big, very big\"\n",
        )
        .unwrap();

        assert_eq!(smells["a"].get(SmellKind::CyclicDependency), 3);
        assert_eq!(smells["a"].total(), 3);
        assert_eq!(smells["b"].get(SmellKind::GodComponent), 1);
    }

    #[test]
    fn unknown_smell_kind_is_rejected() {
        let err = parse("p,a,Spaghetti Code,cause\n").unwrap_err();
        assert!(matches!(err, PipelineError::UnknownSmell { ref kind, .. } if kind == "Spaghetti Code"));
    }

    #[test]
    fn missing_columns_are_malformed() {
        let err = parse("p,a\n").unwrap_err();
        assert!(matches!(err, PipelineError::MalformedRow { .. }));
    }

    #[test]
    fn average_degree_defaults_to_zero_without_dense_structure() {
        let text = format!("{HEADER}p,a,Cyclic Dependency,Average degree = 9.9.\n");
        assert_eq!(parse_dense_structure_average_degree(&text).unwrap(), Some(0.0));
    }

    #[test]
    fn average_degree_reads_numeral_after_prefix() {
        let text = format!(
            "{HEADER}p,<All packages>,Dense Structure,Average degree = 3.45. Threshold = 3.\n"
        );
        assert_eq!(parse_dense_structure_average_degree(&text).unwrap(), Some(3.45));

        let wide = "Dense Structure,Average degree = 12.5.";
        assert_eq!(parse_dense_structure_average_degree(wide).unwrap(), Some(12.5));
    }

    #[test]
    fn average_degree_missing_prefix_is_unreadable() {
        let text = "p,a,Dense Structure,too dense\n";
        assert_eq!(parse_dense_structure_average_degree(text).unwrap(), None);
    }
}
