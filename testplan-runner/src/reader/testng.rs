// Copyright (c) The testplan-publish Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! TestNG `testng-results.xml` reports.

use super::xml::XmlElement;
use crate::results::{NormalizedTestResult, TestOutcome};
use std::time::Duration;

static DESCRIPTION_PROPERTY: &str = "Description";

pub(super) fn parse(root: &XmlElement) -> Option<Vec<NormalizedTestResult>> {
    if root.name != "testng-results" {
        return None;
    }

    let mut classes = Vec::new();
    root.descendants_named("class", &mut classes);

    let results = classes
        .into_iter()
        .flat_map(|class| {
            let class_name = class.nonempty_attr("name");
            class
                .children_named("test-method")
                // Setup and teardown methods are not tests.
                .filter(|method| method.attr("is-config") != Some("true"))
                .map(move |method| parse_method(class_name, method))
        })
        .collect();
    Some(results)
}

fn parse_method(class_name: Option<&str>, method: &XmlElement) -> NormalizedTestResult {
    let outcome = match method.attr("status") {
        Some("PASS") => TestOutcome::Passed,
        Some("FAIL") => TestOutcome::Failed,
        Some("SKIP") => TestOutcome::Skipped,
        _ => TestOutcome::None,
    };

    let name = method.attr("name").unwrap_or_default();
    let full_name = match class_name {
        Some(class_name) => format!("{class_name}.{name}"),
        None => name.to_owned(),
    };

    let mut result = NormalizedTestResult::new(full_name, outcome);
    result.duration = method
        .attr("duration-ms")
        .and_then(|ms| ms.trim().parse().ok())
        .map(Duration::from_millis);

    if let Some(exception) = method.child("exception") {
        result.failure_message = exception
            .child_text("message")
            .or_else(|| exception.nonempty_attr("class"))
            .map(str::to_owned);
        result.stack_trace = exception.child_text("full-stacktrace").map(str::to_owned);
    }

    if let Some(description) = method.nonempty_attr("description") {
        result
            .properties
            .insert(DESCRIPTION_PROPERTY.to_owned(), description.to_owned());
    }
    for attributes in method.children_named("attributes") {
        for attribute in attributes.children_named("attribute") {
            let key = attribute.nonempty_attr("name");
            if let (Some(key), Some(value)) = (key, attribute.nonempty_text()) {
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

    #[test]
    fn read_testng_report() {
        let root = XmlElement::parse(indoc! {r#"
            <testng-results skipped="1" failed="1" total="3" passed="1">
              <suite name="Suite" duration-ms="1250">
                <test name="Login">
                  <class name="com.fabrikam.LoginTest">
                    <test-method status="PASS" signature="setUp()" name="setUp" is-config="true" duration-ms="3"/>
                    <test-method status="PASS" signature="validUser()" name="validUser" duration-ms="500" description="Valid user">
                      <attributes>
                        <attribute name="TestCase"><![CDATA[1234]]></attribute>
                      </attributes>
                    </test-method>
                    <test-method status="FAIL" signature="badPassword()" name="badPassword" duration-ms="125">
                      <exception class="java.lang.AssertionError">
                        <message><![CDATA[expected [1] but found [2]]]></message>
                        <full-stacktrace><![CDATA[java.lang.AssertionError: expected [1] but found [2]
            at com.fabrikam.LoginTest.badPassword(LoginTest.java:20)]]></full-stacktrace>
                      </exception>
                    </test-method>
                    <test-method status="SKIP" signature="sso()" name="sso" duration-ms="0">
                      <exception class="org.testng.SkipException"/>
                    </test-method>
                  </class>
                </test>
              </suite>
            </testng-results>
        "#})
        .expect("parses")
        .expect("has a root");
        let results = parse(&root).expect("is a testng report");

        assert_eq!(results.len(), 3);
        assert_eq!(results[0].name, "com.fabrikam.LoginTest.validUser");
        assert_eq!(results[0].outcome, TestOutcome::Passed);
        assert_eq!(results[0].duration, Some(Duration::from_millis(500)));
        assert_eq!(results[0].property("TestCase"), Some("1234"));
        assert_eq!(results[0].property("Description"), Some("Valid user"));

        assert_eq!(results[1].outcome, TestOutcome::Failed);
        assert_eq!(
            results[1].failure_message.as_deref(),
            Some("expected [1] but found [2]")
        );
        assert!(
            results[1]
                .stack_trace
                .as_deref()
                .is_some_and(|trace| trace.contains("LoginTest.java:20")),
            "stack trace: {:?}",
            results[1].stack_trace
        );

        assert_eq!(results[2].outcome, TestOutcome::Skipped);
        assert_eq!(
            results[2].failure_message.as_deref(),
            Some("org.testng.SkipException")
        );
    }

    #[test]
    fn other_roots_are_not_testng() {
        let root = XmlElement::parse("<testsuites/>")
            .expect("parses")
            .expect("has a root");
        assert_eq!(parse(&root), None);
    }
}
