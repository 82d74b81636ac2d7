use crate::models::commit::{Commit, SamplePoint};
use chrono::{Days, NaiveDate};

/// Select one sample point per `interval_weeks` window of a chronologically
/// ordered history.
///
/// The first commit is always selected. A later commit is selected only if its
/// date is strictly more than `interval_weeks` weeks after the previously
/// selected date. Bursts of commits collapse into one sample, and long gaps
/// produce a sample at the next real commit instead of a synthetic date.
pub fn sample_commits(commits: &[Commit], interval_weeks: u32) -> Vec<SamplePoint> {
    let window = Days::new(u64::from(interval_weeks) * 7);
    let mut samples = Vec::new();
    let mut last_selected: Option<NaiveDate> = None;

    for commit in commits {
        let selected = match last_selected {
            None => true,
            // Overflowing the calendar means no later date can qualify.
            Some(prev) => prev
                .checked_add_days(window)
                .is_some_and(|threshold| commit.date > threshold),
        };

        if selected {
            samples.push(SamplePoint {
                date: commit.date,
                target: commit.authored_at,
            });
            last_selected = Some(commit.date);
        }
    }

    samples
}
