use crate::error::Result;
use crate::models::test_summary::{TestCountMode, TestSummary};
use regex::Regex;

const TESTS_RUN_PATTERN: &str = r"Tests run: (\d+), Failures: (\d+), Errors: (\d+), Skipped: (\d+)";

/// Running totals of every `Tests run: …` line seen in a build's output.
#[derive(Debug, Clone)]
pub struct TestRunTally {
    pattern: Regex,
    run: u64,
    failures: u64,
    errors: u64,
    skipped: u64,
}

impl TestRunTally {
    pub fn new() -> Result<Self> {
        Ok(Self {
            pattern: Regex::new(TESTS_RUN_PATTERN)?,
            run: 0,
            failures: 0,
            errors: 0,
            skipped: 0,
        })
    }

    pub fn observe(&mut self, line: &str) {
        let Some(caps) = self.pattern.captures(line) else {
            return;
        };
        let count = |i: usize| caps[i].parse::<u64>().unwrap_or(0);
        self.run += count(1);
        self.failures += count(2);
        self.errors += count(3);
        self.skipped += count(4);
    }

    pub fn finish(&self, mode: TestCountMode) -> TestSummary {
        let adjust = |n: u64| match mode {
            TestCountMode::Halved => n / 2,
            TestCountMode::Summed => n,
        };
        TestSummary::from_counts(
            adjust(self.run),
            adjust(self.failures),
            adjust(self.errors),
            adjust(self.skipped),
        )
    }
}

pub fn summarize_test_output<'a, I>(lines: I, mode: TestCountMode) -> Result<TestSummary>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut tally = TestRunTally::new()?;
    for line in lines {
        tally.observe(line);
    }
    Ok(tally.finish(mode))
}
