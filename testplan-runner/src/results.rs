// Copyright (c) The testplan-publish Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The framework-agnostic representation of a single test outcome.

use camino::Utf8PathBuf;
use std::{collections::BTreeMap, fmt, time::Duration};

/// The outcome of a test, as reported by the test framework.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
pub enum TestOutcome {
    /// The framework did not report an outcome.
    #[default]
    None,

    /// The test passed.
    Passed,

    /// The test ran and an assertion failed.
    Failed,

    /// The test could not complete because of an error outside its assertions.
    Errored,

    /// The test was not executed (skipped, ignored or otherwise not run).
    Skipped,
}

impl TestOutcome {
    /// Returns the name the test-management system uses for this outcome.
    pub fn as_remote_str(self) -> &'static str {
        match self {
            Self::None => "None",
            Self::Passed => "Passed",
            Self::Failed => "Failed",
            Self::Errored => "Error",
            Self::Skipped => "NotExecuted",
        }
    }
}

impl fmt::Display for TestOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::None => "none",
            Self::Passed => "passed",
            Self::Failed => "failed",
            Self::Errored => "errored",
            Self::Skipped => "skipped",
        };
        f.write_str(s)
    }
}

/// A file attached to a test result.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TestAttachment {
    /// The display name of the attachment.
    pub name: String,

    /// The resolved path to the attachment on disk.
    pub path: Utf8PathBuf,
}

impl TestAttachment {
    /// Creates a new attachment.
    pub fn new(name: impl Into<String>, path: impl Into<Utf8PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }
}

/// One test outcome, regardless of the framework that produced it.
///
/// Created by a [`reader`](crate::reader) and consumed once by the
/// [`ResultProcessor`](crate::processor::ResultProcessor).
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct NormalizedTestResult {
    /// The fully qualified test identifier, e.g. `Namespace.Class.Method`.
    pub name: String,

    /// The reported outcome.
    pub outcome: TestOutcome,

    /// How long the test took, if reported.
    pub duration: Option<Duration>,

    /// The failure message, if any.
    pub failure_message: Option<String>,

    /// The stack trace, if any.
    pub stack_trace: Option<String>,

    /// Framework-specific metadata such as traits, categories or properties.
    pub properties: BTreeMap<String, String>,

    /// Files attached to this result.
    pub attachments: Vec<TestAttachment>,
}

impl NormalizedTestResult {
    /// Creates a new result with the given name and outcome and no other details.
    pub fn new(name: impl Into<String>, outcome: TestOutcome) -> Self {
        Self {
            name: name.into(),
            outcome,
            duration: None,
            failure_message: None,
            stack_trace: None,
            properties: BTreeMap::new(),
            attachments: Vec::new(),
        }
    }

    /// Adds a property, replacing any existing value for `key`.
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// Returns the value of a property, if present.
    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }

    /// Returns the duration in milliseconds, if known.
    pub fn duration_ms(&self) -> Option<f64> {
        self.duration.map(|d| d.as_secs_f64() * 1000.0)
    }

    /// Returns true if this result has attachments.
    pub fn has_attachments(&self) -> bool {
        !self.attachments.is_empty()
    }
}
