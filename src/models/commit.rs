use chrono::{DateTime, Local, NaiveDate, Utc};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Commit {
    pub id: String,
    pub authored_at: DateTime<Utc>,
    /// Author timestamp as a calendar date in the local timezone.
    pub date: NaiveDate,
}

impl Commit {
    pub fn new(id: impl Into<String>, authored_at: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            authored_at,
            date: authored_at.with_timezone(&Local).date_naive(),
        }
    }
}

/// A date chosen by the sampler, plus the instant of the commit that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SamplePoint {
    pub date: NaiveDate,
    pub target: DateTime<Utc>,
}

impl SamplePoint {
    /// Snapshot directory name, `yyyy-mm-dd`.
    pub fn dir_name(&self) -> String {
        self.date.format(crate::models::snapshot::DATE_FORMAT).to_string()
    }
}
