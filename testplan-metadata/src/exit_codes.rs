// Copyright (c) The testplan-publish Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

/// Documented exit codes for `testplan-publish` failures.
///
/// `testplan-publish` runs may fail for a variety of reasons. This structure documents the exit
/// codes that may occur in case of expected failures.
///
/// Unknown/unexpected failures will always result in exit code 1.
pub enum TestplanExitCode {}

impl TestplanExitCode {
    /// No errors occurred and results were published (or a dry run completed).
    pub const OK: i32 = 0;

    /// None of the test results could be correlated to a test point in the plan.
    pub const NO_RESULTS_CORRELATED: i32 = 4;

    /// The test results contain failing or skipped tests, and the run was configured to treat
    /// that as an error.
    pub const TEST_RESULTS_FAILED: i32 = 100;

    /// Resolving the project, test plan or configurations produced an error.
    pub const CONTEXT_BUILD_FAILED: i32 = 102;

    /// Reading test result files produced an error.
    pub const READ_RESULTS_FAILED: i32 = 104;

    /// Creating or updating the test run in the remote system produced an error.
    pub const PUBLISH_FAILED: i32 = 105;

    /// Writing data to stdout or stderr produced an error.
    pub const WRITE_OUTPUT_ERROR: i32 = 110;

    /// A user issue happened while setting up a `testplan-publish` invocation.
    pub const SETUP_ERROR: i32 = 96;
}
