use serde::{Deserialize, Serialize, Serializer};

/// Aggregated result of one build-tool test run across all modules.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TestSummary {
    #[serde(rename = "SuccessfulTests")]
    pub successful: u64,
    #[serde(rename = "FailedTests")]
    pub failed: u64,
    #[serde(rename = "ErrorTests")]
    pub errors: u64,
    #[serde(rename = "SkippedTests")]
    pub skipped: u64,
    #[serde(rename = "TotalTests")]
    pub total: u64,
    /// `-1.0` when no tests ran.
    #[serde(
        rename = "PercentageOfSuccessfulTests",
        serialize_with = "two_decimals"
    )]
    pub success_percentage: f64,
}

/// How per-module counters are combined into the final summary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestCountMode {
    /// Summed counters are halved: the build tool repeats every module's
    /// totals on an aggregate results line.
    #[default]
    Halved,
    /// Counters are reported as summed.
    Summed,
}

pub const TEST_SUMMARY_COLUMNS: [&str; 6] = [
    "SuccessfulTests",
    "FailedTests",
    "ErrorTests",
    "SkippedTests",
    "TotalTests",
    "PercentageOfSuccessfulTests",
];

impl TestSummary {
    pub fn from_counts(total: u64, failed: u64, errors: u64, skipped: u64) -> Self {
        let successful = total
            .saturating_sub(failed)
            .saturating_sub(errors)
            .saturating_sub(skipped);
        let success_percentage = if total == 0 {
            -1.0
        } else {
            successful as f64 / total as f64 * 100.0
        };
        Self {
            successful,
            failed,
            errors,
            skipped,
            total,
            success_percentage,
        }
    }
}

fn two_decimals<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format!("{value:.2}"))
}
