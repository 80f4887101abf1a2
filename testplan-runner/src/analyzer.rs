// Copyright (c) The testplan-publish Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Checks the test framework's own outcomes before anything is published.

use crate::{
    errors::AnalyzeError,
    helpers::plural,
    results::{NormalizedTestResult, TestOutcome},
};
use tracing::debug;

/// Counts of each outcome across a set of results.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct OutcomeCounts {
    /// Results that passed.
    pub passed: usize,

    /// Results that failed or errored.
    pub failed: usize,

    /// Results that were not executed.
    pub skipped: usize,

    /// Results without a reported outcome.
    pub other: usize,
}

impl OutcomeCounts {
    /// Tallies the outcomes of `results`.
    pub fn new(results: &[NormalizedTestResult]) -> Self {
        let mut counts = Self::default();
        for result in results {
            match result.outcome {
                TestOutcome::Passed => counts.passed += 1,
                TestOutcome::Failed | TestOutcome::Errored => counts.failed += 1,
                TestOutcome::Skipped => counts.skipped += 1,
                TestOutcome::None => counts.other += 1,
            }
        }
        counts
    }
}

/// Returns an error if `results` contain failing tests and `fail_on_failing` is set, or skipped
/// tests and `fail_on_skipped` is set.
///
/// Errored tests count as failing. Failing tests are checked first.
pub fn analyze_results(
    results: &[NormalizedTestResult],
    fail_on_failing: bool,
    fail_on_skipped: bool,
) -> Result<OutcomeCounts, AnalyzeError> {
    let counts = OutcomeCounts::new(results);
    debug!(
        "{} {}: {} passed, {} failed, {} skipped, {} without outcome",
        results.len(),
        plural::results_str(results.len()),
        counts.passed,
        counts.failed,
        counts.skipped,
        counts.other,
    );

    if fail_on_failing && counts.failed > 0 {
        return Err(AnalyzeError::FailingTests {
            count: counts.failed,
        });
    }
    if fail_on_skipped && counts.skipped > 0 {
        return Err(AnalyzeError::SkippedTests {
            count: counts.skipped,
        });
    }
    Ok(counts)
}
