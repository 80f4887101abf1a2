// Copyright (c) The testplan-publish Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The remote test-management capability the context builder and publisher depend on.

mod azure;
#[cfg(any(test, feature = "internal-testing"))]
#[doc(hidden)]
pub mod fake;

pub use azure::*;

use crate::{
    context::{TestConfiguration, TestPlan, TestPoint},
    errors::RemoteError,
};
use camino::Utf8Path;
use std::collections::HashMap;

/// Everything needed to create a test run.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CreateRunRequest {
    /// The run name.
    pub name: String,

    /// The test plan the run belongs to.
    pub plan_id: u64,

    /// The test points the run covers.
    pub point_ids: Vec<u64>,

    /// The build that produced the results, if known.
    pub build_id: Option<String>,

    /// The release the results belong to, if any.
    pub release_uri: Option<String>,

    /// The release environment the results belong to, if any.
    pub release_environment_uri: Option<String>,
}

/// A test run in the remote system.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TestRun {
    /// The run identifier.
    pub id: u64,

    /// The run name.
    pub name: String,

    /// The run state, e.g. `InProgress` or `Completed`.
    pub state: Option<String>,

    /// A browsable URL for the run, if the server reported one.
    pub web_url: Option<String>,
}

/// Changes to apply to a test run.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TestRunUpdate {
    /// The run identifier.
    pub id: u64,

    /// The new run name.
    pub name: String,

    /// The new run state.
    pub state: String,

    /// An optional comment.
    pub comment: Option<String>,
}

/// A test case result placeholder in a test run.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TestCaseResult {
    /// The result identifier, unique within the run.
    pub id: u64,

    /// The test point this result belongs to.
    pub test_point_id: Option<u64>,

    /// The outcome name, e.g. `Passed`.
    pub outcome: Option<String>,

    /// The result state, e.g. `Completed`.
    pub state: Option<String>,

    /// The duration in milliseconds.
    pub duration_ms: Option<f64>,

    /// The error message.
    pub error_message: Option<String>,

    /// The stack trace.
    pub stack_trace: Option<String>,
}

/// Operations on a remote test-management system.
///
/// All paginated operations return fully drained results.
#[allow(async_fn_in_trait)]
pub trait TestManagementClient {
    /// Resolves a project name to its identifier.
    async fn resolve_project_id(&self, name: &str) -> Result<String, RemoteError>;

    /// Lists all test plans in a project.
    async fn list_test_plans(&self, project: &str) -> Result<Vec<TestPlan>, RemoteError>;

    /// Lists all test configurations in a project.
    async fn list_test_configurations(
        &self,
        project: &str,
    ) -> Result<Vec<TestConfiguration>, RemoteError>;

    /// Lists the test points of a suite, optionally including every child suite.
    async fn list_test_points(
        &self,
        project: &str,
        plan_id: u64,
        suite_id: u64,
        recursive: bool,
    ) -> Result<Vec<TestPoint>, RemoteError>;

    /// Returns a map from test case id to the value of the work item field `field` (the
    /// automated test name) for every test case under a suite, recursively.
    ///
    /// Test cases without the field are omitted.
    async fn list_test_case_automation(
        &self,
        project: &str,
        plan_id: u64,
        suite_id: u64,
        field: &str,
    ) -> Result<HashMap<String, String>, RemoteError>;

    /// Creates a test run.
    async fn create_test_run(
        &self,
        project: &str,
        request: &CreateRunRequest,
    ) -> Result<TestRun, RemoteError>;

    /// Returns every test case result placeholder of a run.
    async fn get_test_case_results(
        &self,
        project: &str,
        run_id: u64,
    ) -> Result<Vec<TestCaseResult>, RemoteError>;

    /// Writes outcomes onto a run's results.
    async fn update_test_case_results(
        &self,
        project: &str,
        run_id: u64,
        results: &[TestCaseResult],
    ) -> Result<Vec<TestCaseResult>, RemoteError>;

    /// Updates a test run.
    async fn update_test_run(
        &self,
        project: &str,
        update: &TestRunUpdate,
    ) -> Result<TestRun, RemoteError>;

    /// Attaches a file to a test run.
    async fn attach_to_run(
        &self,
        project: &str,
        run_id: u64,
        path: &Utf8Path,
    ) -> Result<(), RemoteError>;

    /// Attaches a file to a single result of a test run.
    async fn attach_to_result(
        &self,
        project: &str,
        run_id: u64,
        result_id: u64,
        name: &str,
        path: &Utf8Path,
    ) -> Result<(), RemoteError>;
}
