// Copyright (c) The testplan-publish Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! NUnit 3 XML reports.

use super::{parse_seconds, xml::XmlElement};
use crate::results::{NormalizedTestResult, TestAttachment, TestOutcome};

pub(super) fn parse(root: &XmlElement) -> Option<Vec<NormalizedTestResult>> {
    if root.name != "test-run" && root.name != "test-suite" {
        return None;
    }

    let mut cases = Vec::new();
    root.descendants_named("test-case", &mut cases);
    Some(cases.into_iter().map(parse_case).collect())
}

fn parse_case(case: &XmlElement) -> NormalizedTestResult {
    let outcome = match (case.attr("result"), case.attr("label")) {
        (_, Some("Error" | "Invalid")) => TestOutcome::Errored,
        (Some("Passed"), _) => TestOutcome::Passed,
        (Some("Failed"), _) => TestOutcome::Failed,
        (Some("Skipped"), _) => TestOutcome::Skipped,
        _ => TestOutcome::None,
    };

    let name = case
        .nonempty_attr("fullname")
        .or_else(|| case.attr("name"))
        .unwrap_or_default();
    let mut result = NormalizedTestResult::new(name, outcome);
    result.duration = case.attr("duration").and_then(parse_seconds);

    if let Some(failure) = case.child("failure") {
        result.failure_message = failure.child_text("message").map(str::to_owned);
        result.stack_trace = failure.child_text("stack-trace").map(str::to_owned);
    } else if let Some(reason) = case.child("reason") {
        result.failure_message = reason.child_text("message").map(str::to_owned);
    }

    for properties in case.children_named("properties") {
        for property in properties.children_named("property") {
            if let (Some(key), Some(value)) = (property.nonempty_attr("name"), property.attr("value"))
            {
                result.properties.insert(key.to_owned(), value.to_owned());
            }
        }
    }

    for attachments in case.children_named("attachments") {
        for attachment in attachments.children_named("attachment") {
            if let Some(path) = attachment.child_text("filePath") {
                let name = attachment.child_text("description").unwrap_or_default();
                result.attachments.push(TestAttachment::new(name, path));
            }
        }
    }

    result
}
