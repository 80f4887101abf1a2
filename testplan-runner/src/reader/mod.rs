// Copyright (c) The testplan-publish Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Reading test framework result files.
//!
//! The entry points are [`expand_result_files`], which turns the paths and glob patterns passed in
//! by the user into a list of files, and [`read_results`], which parses those files into
//! [`NormalizedTestResult`]s.

mod junit;
mod nunit;
mod testng;
mod trx;
mod xml;
mod xunit;

use crate::{
    errors::{DisplayErrorChain, ReadResultsError, ReportFormatParseError, ReportParseError},
    helpers::plural,
    results::NormalizedTestResult,
};
use camino::{Utf8Path, Utf8PathBuf};
use globset::GlobBuilder;
use indexmap::IndexSet;
use std::{fmt, io, str::FromStr, time::Duration};
use tracing::{debug, warn};
use walkdir::WalkDir;
use xml::XmlElement;

/// The format of a test result file.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum ReportFormat {
    /// JUnit XML.
    JUnit,

    /// xUnit.net v2 XML.
    XUnit,

    /// NUnit 3 XML.
    NUnit,

    /// MSTest TRX.
    MsTest,

    /// TestNG XML.
    TestNg,
}

impl ReportFormat {
    /// Returns the accepted format names.
    pub fn variants() -> &'static [&'static str] {
        &["junit", "xunit", "nunit", "mstest", "testng"]
    }

    /// Returns the name of this format.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::JUnit => "junit",
            Self::XUnit => "xunit",
            Self::NUnit => "nunit",
            Self::MsTest => "mstest",
            Self::TestNg => "testng",
        }
    }

    fn parse_document(self, root: &XmlElement) -> Option<Vec<NormalizedTestResult>> {
        match self {
            Self::JUnit => junit::parse(root),
            Self::XUnit => xunit::parse(root),
            Self::NUnit => nunit::parse(root),
            Self::MsTest => trx::parse(root),
            Self::TestNg => testng::parse(root),
        }
    }
}

impl fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReportFormat {
    type Err = ReportFormatParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "junit" => Ok(Self::JUnit),
            "xunit" => Ok(Self::XUnit),
            "nunit" => Ok(Self::NUnit),
            "mstest" | "trx" => Ok(Self::MsTest),
            "testng" => Ok(Self::TestNg),
            _ => Err(ReportFormatParseError::new(s)),
        }
    }
}

/// Parses a duration in (possibly fractional) seconds.
pub(crate) fn parse_seconds(input: &str) -> Option<Duration> {
    let seconds: f64 = input.trim().parse().ok()?;
    Duration::try_from_secs_f64(seconds).ok()
}

/// Expands `patterns` into the list of test result files to read.
///
/// Each pattern is either a path or a glob. Relative patterns are interpreted relative to
/// `base_dir`. A glob that matches nothing contributes no files. A path that does not exist is an
/// error if `fail_on_missing_files` is true, and is skipped with a warning otherwise.
///
/// Files are returned in the order the patterns were given, without duplicates.
pub fn expand_result_files(
    base_dir: &Utf8Path,
    patterns: &[String],
    fail_on_missing_files: bool,
) -> Result<Vec<Utf8PathBuf>, ReadResultsError> {
    let mut files = IndexSet::new();

    for pattern in patterns {
        let full = base_dir.join(pattern);
        if is_glob(pattern) {
            let matched = expand_glob(&full)?;
            if matched.is_empty() {
                warn!("test result file pattern `{pattern}` did not match any files");
            }
            files.extend(matched);
        } else if full.is_file() {
            files.insert(full);
        } else if fail_on_missing_files {
            return Err(ReadResultsError::MissingFile { path: full });
        } else {
            warn!("test result file `{full}` does not exist, skipping");
        }
    }

    debug!(
        "found {} test result {}",
        files.len(),
        plural::files_str(files.len()),
    );
    Ok(files.into_iter().collect())
}

fn is_glob(pattern: &str) -> bool {
    pattern.contains(['*', '?', '[', '{'])
}

fn expand_glob(pattern: &Utf8Path) -> Result<Vec<Utf8PathBuf>, ReadResultsError> {
    let matcher = GlobBuilder::new(pattern.as_str())
        .literal_separator(true)
        .build()
        .map_err(|err| ReadResultsError::InvalidPattern {
            pattern: pattern.to_string(),
            err,
        })?
        .compile_matcher();

    // Walk from the longest prefix that contains no glob metacharacters.
    let root: Utf8PathBuf = pattern
        .components()
        .take_while(|component| !is_glob(component.as_str()))
        .collect();

    let mut matched = Vec::new();
    for entry in WalkDir::new(&root).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) if err.depth() == 0 && is_not_found(&err) => break,
            Err(err) => return Err(ReadResultsError::WalkDir { dir: root, err }),
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let Some(path) = Utf8Path::from_path(entry.path()) else {
            debug!("skipping non-UTF-8 path `{}`", entry.path().display());
            continue;
        };
        if matcher.is_match(path) {
            matched.push(path.to_owned());
        }
    }

    Ok(matched)
}

fn is_not_found(err: &walkdir::Error) -> bool {
    err.io_error()
        .is_some_and(|err| err.kind() == io::ErrorKind::NotFound)
}

/// Reads every file in `files` as `format` and returns the combined results.
///
/// Files that cannot be read or are not well-formed are logged and skipped. If none of the files
/// contained a test suite in the expected format, [`ReadResultsError::NoSuites`] is returned. A
/// valid file with no tests in it produces no results.
///
/// Attachment names default to the attachment's file name. Relative attachment paths are resolved
/// against the directories of `files`, in order; attachments that cannot be found are dropped with
/// a warning.
pub fn read_results(
    format: ReportFormat,
    files: &[Utf8PathBuf],
) -> Result<Vec<NormalizedTestResult>, ReadResultsError> {
    let mut results = Vec::new();
    let mut any_suites = false;

    for file in files {
        match read_file(format, file) {
            Ok(Some(file_results)) => {
                debug!(
                    "read {} {} from `{file}`",
                    file_results.len(),
                    plural::results_str(file_results.len()),
                );
                any_suites = true;
                results.extend(file_results);
            }
            Ok(None) => {
                warn!("`{file}` does not contain {format} test results, skipping");
            }
            Err(err) => {
                warn!("{}", DisplayErrorChain::new(err));
            }
        }
    }

    if !any_suites {
        return Err(ReadResultsError::NoSuites {
            format,
            files: files.to_vec(),
        });
    }

    let search_dirs: IndexSet<&Utf8Path> = files.iter().filter_map(|file| file.parent()).collect();
    for result in &mut results {
        resolve_attachments(result, &search_dirs);
    }

    Ok(results)
}

fn read_file(
    format: ReportFormat,
    path: &Utf8Path,
) -> Result<Option<Vec<NormalizedTestResult>>, ReportParseError> {
    let contents = std::fs::read_to_string(path).map_err(|err| ReportParseError::Read {
        path: path.to_owned(),
        err,
    })?;
    let root = XmlElement::parse(&contents).map_err(|err| ReportParseError::Xml {
        path: path.to_owned(),
        err,
    })?;
    Ok(root.and_then(|root| format.parse_document(&root)))
}

fn resolve_attachments(result: &mut NormalizedTestResult, search_dirs: &IndexSet<&Utf8Path>) {
    let test_name = &result.name;
    result.attachments.retain_mut(|attachment| {
        if attachment.name.is_empty() {
            attachment.name = attachment
                .path
                .file_name()
                .unwrap_or(attachment.path.as_str())
                .to_owned();
        }
        if attachment.path.is_absolute() {
            return true;
        }

        match search_dirs
            .iter()
            .map(|dir| dir.join(&attachment.path))
            .find(|candidate| candidate.is_file())
        {
            Some(resolved) => {
                attachment.path = resolved;
                true
            }
            None => {
                warn!(
                    "attachment `{}` for test `{test_name}` was not found, skipping",
                    attachment.path,
                );
                false
            }
        }
    });
}
