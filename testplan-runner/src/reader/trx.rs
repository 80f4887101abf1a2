// Copyright (c) The testplan-publish Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! MSTest (TRX) reports.
//!
//! Results and test definitions live in separate sections of a TRX file. Each
//! `UnitTestResult` is joined with its `UnitTest` through the `testId` attribute to recover the
//! qualified method name and the test's properties.

use super::xml::XmlElement;
use crate::results::{NormalizedTestResult, TestAttachment, TestOutcome};
use std::{collections::HashMap, time::Duration};

pub(super) fn parse(root: &XmlElement) -> Option<Vec<NormalizedTestResult>> {
    if root.name != "TestRun" {
        return None;
    }

    let mut definitions = Vec::new();
    root.descendants_named("UnitTest", &mut definitions);
    let definitions: HashMap<&str, &XmlElement> = definitions
        .into_iter()
        .filter_map(|unit_test| Some((unit_test.nonempty_attr("id")?, unit_test)))
        .collect();

    let mut results = Vec::new();
    root.descendants_named("UnitTestResult", &mut results);
    let results = results
        .into_iter()
        .map(|result| {
            let definition = result
                .attr("testId")
                .and_then(|id| definitions.get(id).copied());
            parse_result(result, definition)
        })
        .collect();
    Some(results)
}

fn parse_result(element: &XmlElement, definition: Option<&XmlElement>) -> NormalizedTestResult {
    let name = definition
        .and_then(|unit_test| unit_test.child("TestMethod"))
        .and_then(|method| {
            let name = method.nonempty_attr("name")?;
            Some(match method.nonempty_attr("className") {
                Some(class_name) => format!("{class_name}.{name}"),
                None => name.to_owned(),
            })
        })
        .unwrap_or_else(|| element.attr("testName").unwrap_or_default().to_owned());

    let mut result = NormalizedTestResult::new(name, parse_outcome(element.attr("outcome")));
    result.duration = element.attr("duration").and_then(parse_timespan);

    if let Some(error_info) = element
        .child("Output")
        .and_then(|output| output.child("ErrorInfo"))
    {
        result.failure_message = error_info.child_text("Message").map(str::to_owned);
        result.stack_trace = error_info.child_text("StackTrace").map(str::to_owned);
    }

    if let Some(properties) = definition.and_then(|unit_test| unit_test.child("Properties")) {
        for property in properties.children_named("Property") {
            if let Some(key) = property.child_text("Key") {
                let value = property.child_text("Value").unwrap_or_default();
                result.properties.insert(key.to_owned(), value.to_owned());
            }
        }
    }

    for files in element.children_named("ResultFiles") {
        for file in files.children_named("ResultFile") {
            if let Some(path) = file.nonempty_attr("path") {
                result.attachments.push(TestAttachment::new("", path));
            }
        }
    }

    result
}

fn parse_outcome(outcome: Option<&str>) -> TestOutcome {
    match outcome {
        Some("Passed" | "PassedButRunAborted" | "Warning") => TestOutcome::Passed,
        Some("Failed" | "Timeout" | "Aborted") => TestOutcome::Failed,
        Some("Error") => TestOutcome::Errored,
        Some("NotExecuted" | "NotRunnable" | "Pending") => TestOutcome::Skipped,
        _ => TestOutcome::None,
    }
}

/// Parses a .NET `TimeSpan` of the form `[d.]hh:mm:ss[.fffffff]`.
fn parse_timespan(input: &str) -> Option<Duration> {
    let (hours, rest) = input.trim().split_once(':')?;
    let (minutes, seconds) = rest.split_once(':')?;
    let (days, hours) = hours.split_once('.').unwrap_or(("0", hours));

    let days: u64 = days.parse().ok()?;
    let hours: u64 = hours.parse().ok()?;
    let minutes: u64 = minutes.parse().ok()?;
    let seconds = Duration::try_from_secs_f64(seconds.parse().ok()?).ok()?;

    let whole_seconds = days
        .checked_mul(24)?
        .checked_add(hours)?
        .checked_mul(60)?
        .checked_add(minutes)?
        .checked_mul(60)?;
    Duration::from_secs(whole_seconds).checked_add(seconds)
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    #[test]
    fn read_trx_report() {
        let root = XmlElement::parse(indoc! {r#"
            <?xml version="1.0" encoding="utf-8"?>
            <TestRun id="a" name="run" xmlns="http://microsoft.com/schemas/VisualStudio/TeamTest/2010">
              <Results>
                <UnitTestResult executionId="e1" testId="t1" testName="ValidUser" duration="00:00:00.2500000" outcome="Passed"/>
                <UnitTestResult executionId="e2" testId="t2" testName="BadPassword" duration="00:00:01.5000000" outcome="Failed">
                  <Output>
                    <ErrorInfo>
                      <Message>Assert.AreEqual failed.</Message>
                      <StackTrace>at Tests.Login.BadPassword()</StackTrace>
                    </ErrorInfo>
                  </Output>
                  <ResultFiles>
                    <ResultFile path="screens\bad.png"/>
                  </ResultFiles>
                </UnitTestResult>
                <UnitTestResult executionId="e3" testId="t3" testName="Sso" outcome="NotExecuted"/>
                <UnitTestResult executionId="e4" testId="missing" testName="Orphan" outcome="Error"/>
              </Results>
              <TestDefinitions>
                <UnitTest name="ValidUser" id="t1">
                  <Properties>
                    <Property><Key>TestCase</Key><Value>1234</Value></Property>
                  </Properties>
                  <TestMethod className="Tests.Login" name="ValidUser"/>
                </UnitTest>
                <UnitTest name="BadPassword" id="t2">
                  <TestMethod className="Tests.Login" name="BadPassword"/>
                </UnitTest>
                <UnitTest name="Sso" id="t3">
                  <TestMethod className="Tests.Login" name="Sso"/>
                </UnitTest>
              </TestDefinitions>
            </TestRun>
        "#})
        .expect("parses")
        .expect("has a root");
        let results = parse(&root).expect("is a trx report");

        let names: Vec<_> = results.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "Tests.Login.ValidUser",
                "Tests.Login.BadPassword",
                "Tests.Login.Sso",
                "Orphan"
            ]
        );
        assert_eq!(results[0].outcome, TestOutcome::Passed);
        assert_eq!(results[0].duration, Some(Duration::from_millis(250)));
        assert_eq!(results[0].property("TestCase"), Some("1234"));

        assert_eq!(results[1].outcome, TestOutcome::Failed);
        assert_eq!(
            results[1].failure_message.as_deref(),
            Some("Assert.AreEqual failed.")
        );
        assert_eq!(
            results[1].stack_trace.as_deref(),
            Some("at Tests.Login.BadPassword()")
        );
        assert_eq!(
            results[1].attachments,
            vec![TestAttachment::new("", "screens\\bad.png")]
        );

        assert_eq!(results[2].outcome, TestOutcome::Skipped);
        assert_eq!(results[2].duration, None);
        assert_eq!(results[3].outcome, TestOutcome::Errored);
    }

    #[test_case("00:00:00.2500000", Some(Duration::from_millis(250)); "fractional seconds")]
    #[test_case("01:02:03", Some(Duration::from_secs(3723)); "whole seconds")]
    #[test_case("1.00:00:01", Some(Duration::from_secs(86401)); "with days")]
    #[test_case("12.5", None; "not a timespan")]
    #[test_case("aa:00:00", None; "invalid hours")]
    #[test_case("18446744073709551615.00:00:00", None; "day count overflows")]
    #[test_case("0.18446744073709551615:59:59", None; "hour count overflows")]
    fn timespans(input: &str, expected: Option<Duration>) {
        assert_eq!(parse_timespan(input), expected);
    }
}
