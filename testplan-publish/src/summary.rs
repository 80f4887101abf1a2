// Copyright (c) The testplan-publish Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::output::SummaryStyles;
use owo_colors::OwoColorize;
use std::io::{self, Write};
use testplan_metadata::{
    AmbiguousResultSummary, CorrelationSummary, MatchedResultSummary, PublishedRunSummary,
    TestPlanSummary,
};
use testplan_runner::{
    plural,
    processor::CorrelationResult,
    publisher::PublishedRun,
    results::TestOutcome,
};

pub(crate) fn correlation_summary(
    correlation: &CorrelationResult,
    run: Option<&PublishedRun>,
) -> CorrelationSummary {
    let plan = TestPlanSummary {
        id: correlation.test_plan.id,
        name: correlation.test_plan.name.clone(),
    };
    let mut summary = CorrelationSummary::new(&correlation.project_id, plan);

    summary.matched = correlation
        .matches
        .iter()
        .map(|(point_id, result)| MatchedResultSummary {
            point_id: point_id.0,
            test_name: result.name.clone(),
            outcome: result.outcome.as_remote_str().to_owned(),
        })
        .collect();
    summary.unmatched = correlation
        .unmatched
        .iter()
        .map(|result| result.name.clone())
        .collect();
    summary.ambiguous = correlation
        .ambiguous
        .iter()
        .map(|ambiguous| AmbiguousResultSummary {
            test_name: ambiguous.result.name.clone(),
            candidate_point_ids: ambiguous.candidates.iter().map(|id| id.0).collect(),
        })
        .collect();
    summary.run = run.map(|run| PublishedRunSummary {
        id: run.id,
        url: run.url.clone(),
    });

    summary
}

pub(crate) fn write_human_summary(
    summary: &CorrelationSummary,
    verbose: bool,
    styles: &SummaryStyles,
    mut writer: impl Write,
) -> io::Result<()> {
    let total = summary.matched.len() + summary.unmatched.len() + summary.ambiguous.len();
    writeln!(
        writer,
        "{} {} correlated against test plan `{}` (id {}): {} matched, {} unmatched, {} ambiguous",
        total.style(styles.count),
        plural::results_str(total),
        summary.test_plan.name,
        summary.test_plan.id,
        summary.matched.len().style(styles.pass),
        summary.unmatched.len().style(styles.skip),
        summary.ambiguous.len().style(styles.fail),
    )?;

    if verbose {
        for matched in &summary.matched {
            let outcome_style = match matched.outcome.as_str() {
                s if s == TestOutcome::Passed.as_remote_str() => styles.pass,
                s if s == TestOutcome::Skipped.as_remote_str() => styles.skip,
                _ => styles.fail,
            };
            writeln!(
                writer,
                "  {:>11} {} -> test point {}",
                matched.outcome.style(outcome_style),
                matched.test_name,
                matched.point_id,
            )?;
        }
    }
    for name in &summary.unmatched {
        writeln!(writer, "  {:>11} {name}", "UNMATCHED".style(styles.skip))?;
    }
    for ambiguous in &summary.ambiguous {
        let ids: Vec<_> = ambiguous
            .candidate_point_ids
            .iter()
            .map(u64::to_string)
            .collect();
        writeln!(
            writer,
            "  {:>11} {} (test points {})",
            "AMBIGUOUS".style(styles.fail),
            ambiguous.test_name,
            ids.join(", "),
        )?;
    }

    match &summary.run {
        Some(run) => match &run.url {
            Some(url) => writeln!(writer, "published test run {}: {url}", run.id)?,
            None => writeln!(writer, "published test run {}", run.id)?,
        },
        None => writeln!(writer, "no test run was published")?,
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn summary() -> CorrelationSummary {
        let mut summary = CorrelationSummary::new(
            "proj-id",
            TestPlanSummary {
                id: 1,
                name: "Sprint 1".to_owned(),
            },
        );
        summary.matched = vec![
            MatchedResultSummary {
                point_id: 10,
                test_name: "Tests.Login.ValidUser".to_owned(),
                outcome: "Passed".to_owned(),
            },
            MatchedResultSummary {
                point_id: 11,
                test_name: "Tests.Login.BadPassword".to_owned(),
                outcome: "Failed".to_owned(),
            },
        ];
        summary.unmatched = vec!["Tests.Orphan".to_owned()];
        summary.ambiguous = vec![AmbiguousResultSummary {
            test_name: "Tests.Login".to_owned(),
            candidate_point_ids: vec![12, 13],
        }];
        summary
    }

    fn render(summary: &CorrelationSummary, verbose: bool) -> String {
        let mut out = Vec::new();
        write_human_summary(summary, verbose, &SummaryStyles::default(), &mut out)
            .expect("writing to a Vec succeeds");
        String::from_utf8(out).expect("summary is UTF-8")
    }

    #[test]
    fn human_summary() {
        let mut summary = summary();
        summary.run = Some(PublishedRunSummary {
            id: 77,
            url: Some("https://dev.azure.com/fabrikam/runs/77".to_owned()),
        });

        let expected = [
            "4 results correlated against test plan `Sprint 1` (id 1): \
             2 matched, 1 unmatched, 1 ambiguous",
            "    UNMATCHED Tests.Orphan",
            "    AMBIGUOUS Tests.Login (test points 12, 13)",
            "published test run 77: https://dev.azure.com/fabrikam/runs/77",
            "",
        ];
        assert_eq!(render(&summary, false), expected.join("\n"));
    }

    #[test]
    fn verbose_summary_lists_matches() {
        let output = render(&summary(), true);
        assert!(
            output.contains("       Passed Tests.Login.ValidUser -> test point 10\n"),
            "output: {output}"
        );
        assert!(output.ends_with("no test run was published\n"), "output: {output}");
    }
}
