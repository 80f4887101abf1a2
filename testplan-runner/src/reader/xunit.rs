// Copyright (c) The testplan-publish Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! xUnit.net v2 XML reports.

use super::{parse_seconds, xml::XmlElement};
use crate::results::{NormalizedTestResult, TestOutcome};

pub(super) fn parse(root: &XmlElement) -> Option<Vec<NormalizedTestResult>> {
    if root.name != "assemblies" && root.name != "assembly" {
        return None;
    }

    let mut tests = Vec::new();
    root.descendants_named("test", &mut tests);
    Some(tests.into_iter().map(parse_test).collect())
}

fn parse_test(test: &XmlElement) -> NormalizedTestResult {
    let outcome = match test.attr("result") {
        Some("Pass") => TestOutcome::Passed,
        Some("Fail") => TestOutcome::Failed,
        Some("Skip" | "NotRun") => TestOutcome::Skipped,
        _ => TestOutcome::None,
    };

    let mut result = NormalizedTestResult::new(test.attr("name").unwrap_or_default(), outcome);
    result.duration = test.attr("time").and_then(parse_seconds);

    if let Some(failure) = test.child("failure") {
        result.failure_message = failure.child_text("message").map(str::to_owned);
        result.stack_trace = failure.child_text("stack-trace").map(str::to_owned);
    }
    if outcome == TestOutcome::Skipped {
        result.failure_message = test.child_text("reason").map(str::to_owned);
    }

    for traits in test.children_named("traits") {
        for item in traits.children_named("trait") {
            if let (Some(key), Some(value)) = (item.nonempty_attr("name"), item.attr("value")) {
                result.properties.insert(key.to_owned(), value.to_owned());
            }
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;
    use pretty_assertions::assert_eq;
    use std::time::Duration;

    #[test]
    fn read_xunit_report() {
        let root = XmlElement::parse(indoc! {r#"
            <assemblies>
              <assembly name="Tests.dll" total="3">
                <collection name="Login">
                  <test name="Tests.Login.ValidUser" type="Tests.Login" method="ValidUser" time="0.5" result="Pass">
                    <traits>
                      <trait name="TestCase" value="1234"/>
                      <trait name="Category" value="smoke"/>
                    </traits>
                  </test>
                  <test name="Tests.Login.BadPassword" time="0.125" result="Fail">
                    <failure exception-type="Xunit.Sdk.EqualException">
                      <message><![CDATA[Assert.Equal() Failure]]></message>
                      <stack-trace><![CDATA[at Tests.Login.BadPassword()]]></stack-trace>
                    </failure>
                  </test>
                  <test name="Tests.Login.Sso" time="0" result="Skip">
                    <reason><![CDATA[not configured]]></reason>
                  </test>
                </collection>
              </assembly>
            </assemblies>
        "#})
        .expect("parses")
        .expect("has a root");
        let results = parse(&root).expect("is an xunit report");

        assert_eq!(results.len(), 3);
        assert_eq!(results[0].name, "Tests.Login.ValidUser");
        assert_eq!(results[0].outcome, TestOutcome::Passed);
        assert_eq!(results[0].duration, Some(Duration::from_millis(500)));
        assert_eq!(results[0].property("TestCase"), Some("1234"));
        assert_eq!(results[0].property("Category"), Some("smoke"));

        assert_eq!(results[1].outcome, TestOutcome::Failed);
        assert_eq!(
            results[1].failure_message.as_deref(),
            Some("Assert.Equal() Failure")
        );
        assert_eq!(
            results[1].stack_trace.as_deref(),
            Some("at Tests.Login.BadPassword()")
        );

        assert_eq!(results[2].outcome, TestOutcome::Skipped);
        assert_eq!(results[2].failure_message.as_deref(), Some("not configured"));
    }
}
