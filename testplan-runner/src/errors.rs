// Copyright (c) The testplan-publish Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Errors produced by testplan-runner.

use crate::{matching::MatchStrategySet, reader::ReportFormat};
use camino::Utf8PathBuf;
use config::ConfigError;
use itertools::Itertools;
use std::{error::Error, fmt};
use thiserror::Error;

/// An error that occurred while parsing the config.
#[derive(Debug, Error)]
#[error("failed to parse testplan config at `{config_file}`")]
#[non_exhaustive]
pub struct ConfigParseError {
    config_file: Utf8PathBuf,
    #[source]
    kind: ConfigParseErrorKind,
}

impl ConfigParseError {
    pub(crate) fn new(config_file: impl Into<Utf8PathBuf>, kind: ConfigParseErrorKind) -> Self {
        Self {
            config_file: config_file.into(),
            kind,
        }
    }

    /// Returns the config file for this error.
    pub fn config_file(&self) -> &Utf8PathBuf {
        &self.config_file
    }

    /// Returns the kind of error this is.
    pub fn kind(&self) -> &ConfigParseErrorKind {
        &self.kind
    }
}

/// The kind of error that occurred while parsing a config.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigParseErrorKind {
    /// An error occurred while building the layered config.
    #[error(transparent)]
    BuildError(ConfigError),

    /// An error occurred while deserializing the config.
    #[error(transparent)]
    DeserializeError(serde_path_to_error::Error<ConfigError>),
}

/// Error returned while parsing a [`MatchStrategySet`] from a string.
#[derive(Clone, Debug, Error)]
#[error(
    "unrecognized test case match strategy: {input}\n(known values: {})",
    MatchStrategySet::variants().join(", "),
)]
pub struct MatchStrategyParseError {
    input: String,
}

impl MatchStrategyParseError {
    pub(crate) fn new(input: impl Into<String>) -> Self {
        Self {
            input: input.into(),
        }
    }
}

/// Error returned while parsing a [`ReportFormat`] from a string.
#[derive(Clone, Debug, Error)]
#[error(
    "unrecognized test result format: {input}\n(known values: {})",
    ReportFormat::variants().join(", "),
)]
pub struct ReportFormatParseError {
    input: String,
}

impl ReportFormatParseError {
    pub(crate) fn new(input: impl Into<String>) -> Self {
        Self {
            input: input.into(),
        }
    }
}

/// Error returned while parsing a [`ConfigAlias`](crate::context::ConfigAlias) from a string.
#[derive(Clone, Debug, Error)]
#[error("invalid test configuration alias `{input}`: expected `alias=configuration name`")]
pub struct ConfigAliasParseError {
    input: String,
}

impl ConfigAliasParseError {
    pub(crate) fn new(input: impl Into<String>) -> Self {
        Self {
            input: input.into(),
        }
    }
}

/// An error that occurs while building a [`MatchStrategyChain`](crate::matching::MatchStrategyChain).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProcessorBuildError {
    /// The test case regex could not be compiled.
    #[error("invalid test case regex `{regex}`")]
    InvalidRegex {
        /// The regex as supplied.
        regex: String,

        /// The underlying error.
        #[source]
        err: Box<regex::Error>,
    },

    /// The configuration filter does not name a known configuration.
    #[error("test configuration filter `{filter}` does not match any known configuration")]
    UnknownConfigFilter {
        /// The filter as supplied.
        filter: String,
    },
}

/// An error that occurs while resolving a [`TestContext`](crate::context::TestContext).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ContextBuildError {
    /// The project name could not be resolved to an identifier.
    #[error("could not resolve project name `{project}`")]
    ProjectNotResolved {
        /// The project name.
        project: String,

        /// The underlying error.
        #[source]
        err: RemoteError,
    },

    /// Listing test plans failed.
    #[error("failed to list test plans for project `{project}`")]
    ListTestPlans {
        /// The project name.
        project: String,

        /// The underlying error.
        #[source]
        err: RemoteError,
    },

    /// The project has no test plans at all.
    #[error("no test plans found in project `{project}`")]
    NoTestPlans {
        /// The project name.
        project: String,
    },

    /// No test plan has the requested name.
    #[error("test plan `{name}` was not found")]
    TestPlanNotFound {
        /// The requested test plan name.
        name: String,
    },

    /// Several test plans share the requested name.
    #[error("test plan name `{name}` is ambiguous (ids: {})", .ids.iter().join(", "))]
    TestPlanAmbiguous {
        /// The requested test plan name.
        name: String,

        /// The identifiers of every plan with that name.
        ids: Vec<u64>,
    },

    /// No test plan name was supplied and no single active plan could be inferred.
    #[error("unable to infer active test plan (specify a test plan name)")]
    NoActiveTestPlan,

    /// Listing test configurations failed.
    #[error("failed to list test configurations for project `{project}`")]
    ListConfigurations {
        /// The project name.
        project: String,

        /// The underlying error.
        #[source]
        err: RemoteError,
    },

    /// An alias refers to a configuration name that does not exist.
    #[error("unrecognized config name `{config}` for alias `{alias}`")]
    UnrecognizedConfigAlias {
        /// The alias being registered.
        alias: String,

        /// The configuration name the alias refers to.
        config: String,
    },

    /// The configuration filter does not name a known configuration.
    #[error("test configuration filter `{filter}` does not match any known configuration")]
    UnknownConfigFilter {
        /// The filter as supplied.
        filter: String,
    },

    /// Listing test points failed.
    #[error("failed to list test points for test plan `{plan}`")]
    ListTestPoints {
        /// The test plan name.
        plan: String,

        /// The underlying error.
        #[source]
        err: RemoteError,
    },

    /// Listing test cases (for automated test names) failed.
    #[error("failed to list test cases for test plan `{plan}`")]
    ListTestCases {
        /// The test plan name.
        plan: String,

        /// The underlying error.
        #[source]
        err: RemoteError,
    },
}

/// An error that occurs while locating or reading test result files.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ReadResultsError {
    /// A test result file does not exist.
    #[error("test result file `{path}` does not exist")]
    MissingFile {
        /// The path that was checked.
        path: Utf8PathBuf,
    },

    /// A test result file pattern is not a valid glob.
    #[error("invalid test result file pattern `{pattern}`")]
    InvalidPattern {
        /// The pattern as supplied.
        pattern: String,

        /// The underlying error.
        #[source]
        err: globset::Error,
    },

    /// A directory could not be walked while expanding a pattern.
    #[error("error walking `{dir}` while expanding test result file patterns")]
    WalkDir {
        /// The directory being walked.
        dir: Utf8PathBuf,

        /// The underlying error.
        #[source]
        err: walkdir::Error,
    },

    /// None of the files contained a test suite in the expected format.
    #[error(
        "no {format} test suites could be read from {}",
        .files.iter().map(|f| format!("`{f}`")).join(", "),
    )]
    NoSuites {
        /// The expected format.
        format: ReportFormat,

        /// The files that were read.
        files: Vec<Utf8PathBuf>,
    },
}

/// An error that occurs while parsing a single test result file.
///
/// These errors are not fatal on their own: the file is skipped and the remaining files are
/// still read.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ReportParseError {
    /// The file could not be read.
    #[error("error reading `{path}`")]
    Read {
        /// The file path.
        path: Utf8PathBuf,

        /// The underlying error.
        #[source]
        err: std::io::Error,
    },

    /// The file is not well-formed XML.
    #[error("`{path}` is not well-formed XML")]
    Xml {
        /// The file path.
        path: Utf8PathBuf,

        /// The underlying error.
        #[source]
        err: quick_xml::Error,
    },
}

/// An error returned by a [`TestManagementClient`](crate::client::TestManagementClient).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RemoteError {
    /// The HTTP request could not be performed.
    #[error("request to `{url}` failed")]
    Transport {
        /// The request URL.
        url: String,

        /// The underlying error.
        #[source]
        err: Box<ureq::Error>,
    },

    /// The server returned a non-success status.
    #[error("request to `{url}` returned HTTP {status}: {body}")]
    Status {
        /// The request URL.
        url: String,

        /// The HTTP status code.
        status: u16,

        /// The response body, for diagnostics.
        body: String,
    },

    /// The response body could not be decoded.
    #[error("failed to decode response from `{url}`")]
    Decode {
        /// The request URL.
        url: String,

        /// The underlying error.
        #[source]
        err: serde_path_to_error::Error<serde_json::Error>,
    },

    /// The request body could not be encoded.
    #[error("failed to encode request body for `{url}`")]
    Encode {
        /// The request URL.
        url: String,

        /// The underlying error.
        #[source]
        err: serde_json::Error,
    },

    /// The response contained an identifier that isn't a number where one was expected.
    #[error("response from `{url}` contained non-numeric {what} id `{id}`")]
    InvalidId {
        /// The request URL.
        url: String,

        /// What the identifier refers to.
        what: &'static str,

        /// The identifier as reported.
        id: String,
    },

    /// An attachment could not be read from disk.
    #[error("failed to read attachment `{path}`")]
    ReadAttachment {
        /// The attachment path.
        path: Utf8PathBuf,

        /// The underlying error.
        #[source]
        err: std::io::Error,
    },

    /// The background task performing the request panicked or was cancelled.
    #[error("remote request task failed")]
    TaskJoin(#[source] tokio::task::JoinError),
}

/// An error that occurs while publishing a test run.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PublishError {
    /// No test result could be correlated to a test point.
    #[error(
        "couldn't create a test run for test plan `{plan}` because the test results could not \
         be correlated to any known test cases"
    )]
    NoMatches {
        /// The test plan name.
        plan: String,
    },

    /// Creating the test run failed.
    #[error("failed to create test run for test plan `{plan}`")]
    CreateRun {
        /// The test plan name.
        plan: String,

        /// The underlying error.
        #[source]
        err: RemoteError,
    },

    /// Fetching the test run's result placeholders failed.
    #[error("failed to fetch results for test run {run_id}")]
    FetchResults {
        /// The test run identifier.
        run_id: u64,

        /// The underlying error.
        #[source]
        err: RemoteError,
    },

    /// Writing outcomes onto the test run's results failed.
    #[error("failed to update results for test run {run_id}")]
    UpdateResults {
        /// The test run identifier.
        run_id: u64,

        /// The underlying error.
        #[source]
        err: RemoteError,
    },

    /// Marking the test run complete failed.
    #[error("failed to complete test run {run_id}")]
    CompleteRun {
        /// The test run identifier.
        run_id: u64,

        /// The underlying error.
        #[source]
        err: RemoteError,
    },
}

/// An error produced when the test results themselves are considered a failure.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
#[non_exhaustive]
pub enum AnalyzeError {
    /// Some tests failed.
    #[error("test framework results contain failing tests ({count} failed)")]
    FailingTests {
        /// The number of failing tests.
        count: usize,
    },

    /// Some tests were skipped.
    #[error("test framework results contain skipped tests ({count} skipped)")]
    SkippedTests {
        /// The number of skipped tests.
        count: usize,
    },
}

/// Displays an error along with its chain of sources.
pub struct DisplayErrorChain<E> {
    error: E,
}

impl<E: Error> DisplayErrorChain<E> {
    /// Creates a new `DisplayErrorChain`.
    pub fn new(error: E) -> Self {
        Self { error }
    }
}

impl<E: Error> fmt::Display for DisplayErrorChain<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;

        let mut next_error = self.error.source();
        while let Some(err) = next_error {
            write!(f, "\n  caused by: {err}")?;
            next_error = err.source();
        }

        Ok(())
    }
}
