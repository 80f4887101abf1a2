// Copyright (c) The testplan-publish Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use serde::{Deserialize, Serialize};

/// A summary of how test results were correlated to test points, and of the run that was
/// published for them.
///
/// This is the root structure produced by `testplan-publish --message-format json`.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
#[non_exhaustive]
pub struct CorrelationSummary {
    /// The identifier of the project the test plan belongs to.
    pub project_id: String,

    /// The test plan results were correlated against.
    pub test_plan: TestPlanSummary,

    /// Test results that were bound to exactly one test point, in binding order.
    pub matched: Vec<MatchedResultSummary>,

    /// Names of test results that did not match any test point.
    pub unmatched: Vec<String>,

    /// Test results that matched more than one test point and were therefore not bound.
    pub ambiguous: Vec<AmbiguousResultSummary>,

    /// The published test run, or `None` for dry runs and runs without any matches.
    #[serde(default)]
    pub run: Option<PublishedRunSummary>,
}

impl CorrelationSummary {
    /// Creates a new, empty summary for the given project and plan.
    pub fn new(project_id: impl Into<String>, test_plan: TestPlanSummary) -> Self {
        Self {
            project_id: project_id.into(),
            test_plan,
            matched: Vec::new(),
            unmatched: Vec::new(),
            ambiguous: Vec::new(),
            run: None,
        }
    }
}

/// Identifies a test plan.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct TestPlanSummary {
    /// The test plan identifier.
    pub id: u64,

    /// The display name of the test plan.
    pub name: String,
}

/// A test result bound to a test point.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct MatchedResultSummary {
    /// The test point the result was bound to.
    pub point_id: u64,

    /// The fully qualified name of the test result.
    pub test_name: String,

    /// The outcome reported by the test framework.
    pub outcome: String,
}

/// A test result that matched several test points.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct AmbiguousResultSummary {
    /// The fully qualified name of the test result.
    pub test_name: String,

    /// Every test point the result matched.
    pub candidate_point_ids: Vec<u64>,
}

/// A test run created in the test-management system.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PublishedRunSummary {
    /// The identifier of the test run.
    pub id: u64,

    /// A browser URL for the test run, if the server returned one.
    #[serde(default)]
    pub url: Option<String>,
}
