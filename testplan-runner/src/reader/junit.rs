// Copyright (c) The testplan-publish Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! JUnit XML reports.

use super::{parse_seconds, xml::XmlElement};
use crate::results::{NormalizedTestResult, TestAttachment, TestOutcome};

static TESTSUITES_TAG: &str = "testsuites";
static TESTSUITE_TAG: &str = "testsuite";
static TESTCASE_TAG: &str = "testcase";
static PROPERTIES_TAG: &str = "properties";
static PROPERTY_TAG: &str = "property";
static FAILURE_TAG: &str = "failure";
static ERROR_TAG: &str = "error";
static SKIPPED_TAG: &str = "skipped";
static SYSTEM_OUT_TAG: &str = "system-out";

static PROPERTY_MARKER: &str = "[[PROPERTY|";
static ATTACHMENT_MARKER: &str = "[[ATTACHMENT|";

pub(super) fn parse(root: &XmlElement) -> Option<Vec<NormalizedTestResult>> {
    if root.name != TESTSUITES_TAG && root.name != TESTSUITE_TAG {
        return None;
    }

    let mut suites = Vec::new();
    root.descendants_named(TESTSUITE_TAG, &mut suites);

    let results = suites
        .into_iter()
        .flat_map(|suite| suite.children_named(TESTCASE_TAG))
        .map(parse_testcase)
        .collect();
    Some(results)
}

fn parse_testcase(testcase: &XmlElement) -> NormalizedTestResult {
    let name = testcase.attr("name").unwrap_or_default();
    let full_name = match testcase.nonempty_attr("classname") {
        Some(classname) => format!("{classname}.{name}"),
        None => name.to_owned(),
    };

    let mut result = NormalizedTestResult::new(full_name, TestOutcome::Passed);
    result.duration = testcase.attr("time").and_then(parse_seconds);

    if let Some(failure) = testcase.child(FAILURE_TAG) {
        result.outcome = TestOutcome::Failed;
        set_failure(&mut result, failure);
    } else if let Some(error) = testcase.child(ERROR_TAG) {
        result.outcome = TestOutcome::Errored;
        set_failure(&mut result, error);
    } else if let Some(skipped) = testcase.child(SKIPPED_TAG) {
        result.outcome = TestOutcome::Skipped;
        result.failure_message = skipped
            .nonempty_attr("message")
            .or_else(|| skipped.nonempty_text())
            .map(str::to_owned);
    }

    let direct = testcase.children_named(PROPERTY_TAG);
    let nested = testcase
        .children_named(PROPERTIES_TAG)
        .flat_map(|properties| properties.children_named(PROPERTY_TAG));
    for property in direct.chain(nested) {
        if let Some(key) = property.nonempty_attr("name") {
            let value = property
                .attr("value")
                .or_else(|| property.nonempty_text())
                .unwrap_or_default();
            result.properties.insert(key.to_owned(), value.to_owned());
        }
    }

    for output in testcase.children_named(SYSTEM_OUT_TAG) {
        parse_markers(&mut result, &output.text);
    }

    result
}

fn set_failure(result: &mut NormalizedTestResult, element: &XmlElement) {
    result.failure_message = element
        .nonempty_attr("message")
        .or_else(|| element.nonempty_attr("type"))
        .map(str::to_owned);
    result.stack_trace = element.nonempty_text().map(str::to_owned);
}

/// Scans output for `[[PROPERTY|key=value]]` and `[[ATTACHMENT|path]]` lines.
fn parse_markers(result: &mut NormalizedTestResult, output: &str) {
    for line in output.lines().map(str::trim) {
        let Some(body) = line.strip_suffix("]]") else {
            continue;
        };
        if let Some(property) = body.strip_prefix(PROPERTY_MARKER) {
            if let Some((key, value)) = property.split_once('=') {
                let key = key.trim();
                if !key.is_empty() {
                    result
                        .properties
                        .insert(key.to_owned(), value.trim().to_owned());
                }
            }
        } else if let Some(path) = body.strip_prefix(ATTACHMENT_MARKER) {
            let path = path.trim();
            if !path.is_empty() {
                result.attachments.push(TestAttachment::new("", path));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;
    use pretty_assertions::assert_eq;
    use std::time::Duration;

    fn read(input: &str) -> Vec<NormalizedTestResult> {
        let root = XmlElement::parse(input)
            .expect("parses")
            .expect("has a root");
        parse(&root).expect("is a junit report")
    }

    #[test]
    fn read_junit_report() {
        let results = read(indoc! {r#"
            <?xml version="1.0" encoding="UTF-8"?>
            <testsuites name="all">
                <testsuite name="login" tests="4">
                    <testcase classname="Tests.Login" name="valid_user" time="0.25">
                        <properties>
                            <property name="TestCase" value="1234"/>
                        </properties>
                    </testcase>
                    <testcase classname="Tests.Login" name="bad_password" time="1.5">
                        <failure message="expected 401" type="AssertionError">at login.rs:10</failure>
                        <system-out>
                            starting
                            [[PROPERTY|Config=Windows 10]]
                            [[ATTACHMENT|screenshots/bad_password.png]]
                        </system-out>
                    </testcase>
                    <testcase name="setup">
                        <error message="connection refused"/>
                    </testcase>
                    <testcase classname="Tests.Login" name="sso">
                        <skipped message="not configured"/>
                    </testcase>
                </testsuite>
            </testsuites>
        "#});

        assert_eq!(results.len(), 4);

        assert_eq!(results[0].name, "Tests.Login.valid_user");
        assert_eq!(results[0].outcome, TestOutcome::Passed);
        assert_eq!(results[0].duration, Some(Duration::from_millis(250)));
        assert_eq!(results[0].property("TestCase"), Some("1234"));

        assert_eq!(results[1].outcome, TestOutcome::Failed);
        assert_eq!(results[1].failure_message.as_deref(), Some("expected 401"));
        assert_eq!(results[1].stack_trace.as_deref(), Some("at login.rs:10"));
        assert_eq!(results[1].property("Config"), Some("Windows 10"));
        assert_eq!(
            results[1].attachments,
            vec![TestAttachment::new("", "screenshots/bad_password.png")]
        );

        assert_eq!(results[2].name, "setup");
        assert_eq!(results[2].outcome, TestOutcome::Errored);
        assert_eq!(
            results[2].failure_message.as_deref(),
            Some("connection refused")
        );

        assert_eq!(results[3].outcome, TestOutcome::Skipped);
        assert_eq!(results[3].failure_message.as_deref(), Some("not configured"));
    }

    #[test]
    fn single_suite_root() {
        let results = read(r#"<testsuite name="s"><testcase name="a"/></testsuite>"#);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].name, "a");
    }

    #[test]
    fn empty_suite_has_no_results() {
        assert_eq!(read(r#"<testsuites><testsuite name="s"/></testsuites>"#), Vec::new());
    }

    #[test]
    fn other_roots_are_not_junit() {
        let root = XmlElement::parse("<assemblies/>")
            .expect("parses")
            .expect("has a root");
        assert_eq!(parse(&root), None);
    }
}
