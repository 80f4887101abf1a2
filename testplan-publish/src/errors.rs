// Copyright (c) The testplan-publish Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::output::{NO_HEADING_TARGET, StderrStyles};
use camino::Utf8PathBuf;
use owo_colors::OwoColorize;
use std::error::Error;
use testplan_metadata::TestplanExitCode;
use testplan_runner::errors::*;
use thiserror::Error;

pub(crate) type Result<T, E = ExpectedError> = std::result::Result<T, E>;

// Note that the #[error()] strings are mostly placeholder messages -- the expected way to print out
// errors is with the display_to_stderr method, which colorizes errors.

/// An expected failure of a `testplan-publish` invocation.
#[derive(Debug, Error)]
#[doc(hidden)]
pub enum ExpectedError {
    #[error("could not determine the current directory")]
    CurrentDirFailed {
        #[source]
        error: std::io::Error,
    },
    #[error("current directory is not valid UTF-8")]
    CurrentDirInvalidUtf8 { path: std::path::PathBuf },
    #[error("required argument missing")]
    MissingArgument {
        name: &'static str,
        env: &'static str,
    },
    #[error("config parse error")]
    ConfigParseError {
        #[from]
        err: ConfigParseError,
    },
    #[error("failed to create tokio runtime")]
    TokioRuntimeCreate {
        #[source]
        err: std::io::Error,
    },
    #[error("read results error")]
    ReadResultsError {
        #[from]
        err: ReadResultsError,
    },
    #[error("test results failed")]
    AnalyzeError {
        #[from]
        err: AnalyzeError,
    },
    #[error("context build error")]
    ContextBuildError {
        #[from]
        err: ContextBuildError,
    },
    #[error("processor build error")]
    ProcessorBuildError {
        #[from]
        err: ProcessorBuildError,
    },
    #[error("publish error")]
    PublishError {
        #[from]
        err: PublishError,
    },
    #[error("failed to write summary")]
    WriteSummary {
        #[source]
        err: std::io::Error,
    },
    #[error("failed to serialize summary")]
    SerializeSummary {
        #[source]
        err: serde_json::Error,
    },
    #[error("results directory does not exist")]
    ResultsDirMissing { dir: Utf8PathBuf },
}

impl ExpectedError {
    pub(crate) fn missing_argument(name: &'static str, env: &'static str) -> Self {
        Self::MissingArgument { name, env }
    }

    /// Returns the exit code for the process.
    pub fn process_exit_code(&self) -> i32 {
        match self {
            Self::CurrentDirFailed { .. }
            | Self::CurrentDirInvalidUtf8 { .. }
            | Self::MissingArgument { .. }
            | Self::ConfigParseError { .. }
            | Self::TokioRuntimeCreate { .. }
            | Self::ResultsDirMissing { .. } => TestplanExitCode::SETUP_ERROR,
            Self::ReadResultsError { .. } => TestplanExitCode::READ_RESULTS_FAILED,
            Self::AnalyzeError { .. } => TestplanExitCode::TEST_RESULTS_FAILED,
            Self::ContextBuildError { .. } | Self::ProcessorBuildError { .. } => {
                TestplanExitCode::CONTEXT_BUILD_FAILED
            }
            Self::PublishError { err } => match err {
                PublishError::NoMatches { .. } => TestplanExitCode::NO_RESULTS_CORRELATED,
                _ => TestplanExitCode::PUBLISH_FAILED,
            },
            Self::WriteSummary { .. } | Self::SerializeSummary { .. } => {
                TestplanExitCode::WRITE_OUTPUT_ERROR
            }
        }
    }

    /// Displays this error to stderr.
    pub fn display_to_stderr(&self, styles: &StderrStyles) {
        let mut next_error = match self {
            Self::CurrentDirFailed { error } => {
                tracing::error!("could not determine the current directory");
                Some(error as &dyn Error)
            }
            Self::CurrentDirInvalidUtf8 { path } => {
                tracing::error!(
                    "current directory `{}` is not valid UTF-8",
                    path.display().style(styles.bold)
                );
                None
            }
            Self::MissingArgument { name, env } => {
                tracing::error!(
                    "{} is required: pass it in or set {}",
                    name.style(styles.bold),
                    env.style(styles.bold),
                );
                None
            }
            Self::ConfigParseError { err } => {
                tracing::error!(
                    "failed to parse config at `{}`",
                    err.config_file().style(styles.bold)
                );
                err.source()
            }
            Self::TokioRuntimeCreate { err } => {
                tracing::error!("failed to create tokio runtime");
                Some(err as &dyn Error)
            }
            Self::ReadResultsError { err } => {
                tracing::error!("{err}");
                err.source()
            }
            Self::AnalyzeError { err } => {
                tracing::error!("{err}");
                None
            }
            Self::ContextBuildError { err } => {
                tracing::error!("{err}");
                err.source()
            }
            Self::ProcessorBuildError { err } => {
                tracing::error!("{err}");
                err.source()
            }
            Self::PublishError { err } => {
                tracing::error!("{err}");
                err.source()
            }
            Self::WriteSummary { err } => {
                tracing::error!("failed to write summary to stdout");
                Some(err as &dyn Error)
            }
            Self::SerializeSummary { err } => {
                tracing::error!("failed to serialize summary");
                Some(err as &dyn Error)
            }
            Self::ResultsDirMissing { dir } => {
                tracing::error!("results directory `{}` does not exist", dir.style(styles.bold));
                None
            }
        };

        while let Some(err) = next_error {
            tracing::error!(target: NO_HEADING_TARGET, "\nCaused by:\n  {}", err);
            next_error = err.source();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes() {
        let no_matches = ExpectedError::from(PublishError::NoMatches {
            plan: "Sprint 1".to_owned(),
        });
        assert_eq!(
            no_matches.process_exit_code(),
            TestplanExitCode::NO_RESULTS_CORRELATED
        );

        let failing = ExpectedError::from(AnalyzeError::FailingTests { count: 2 });
        assert_eq!(
            failing.process_exit_code(),
            TestplanExitCode::TEST_RESULTS_FAILED
        );

        let context = ExpectedError::from(ContextBuildError::NoActiveTestPlan);
        assert_eq!(
            context.process_exit_code(),
            TestplanExitCode::CONTEXT_BUILD_FAILED
        );

        let missing = ExpectedError::missing_argument("--collection-uri", "SYSTEM_COLLECTIONURI");
        assert_eq!(missing.process_exit_code(), TestplanExitCode::SETUP_ERROR);
    }
}
