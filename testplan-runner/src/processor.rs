// Copyright (c) The testplan-publish Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Binds test results to test points.

use crate::{
    context::{TestContext, TestPlan, TestPoint, TestPointId},
    helpers::plural,
    matching::MatchStrategyChain,
    results::NormalizedTestResult,
};
use indexmap::IndexMap;
use itertools::Itertools;
use tracing::{debug, warn};

/// A result that matched more than one test point and was therefore not bound.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AmbiguousResult {
    /// The result.
    pub result: NormalizedTestResult,

    /// Every test point the result matched, in pool order.
    pub candidates: Vec<TestPointId>,
}

/// The output of [`ResultProcessor::process`].
///
/// Every input result appears in exactly one of `matches` (as a value), `unmatched` or
/// `ambiguous`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CorrelationResult {
    /// The project identifier.
    pub project_id: String,

    /// The test plan.
    pub test_plan: TestPlan,

    /// Results bound to test points, in binding order.
    pub matches: IndexMap<TestPointId, NormalizedTestResult>,

    /// Results that matched no test point, in input order.
    pub unmatched: Vec<NormalizedTestResult>,

    /// Results that matched several test points, in input order.
    pub ambiguous: Vec<AmbiguousResult>,
}

impl CorrelationResult {
    fn new(project_id: &str, test_plan: &TestPlan) -> Self {
        Self {
            project_id: project_id.to_owned(),
            test_plan: test_plan.clone(),
            matches: IndexMap::new(),
            unmatched: Vec::new(),
            ambiguous: Vec::new(),
        }
    }

    /// Returns the total number of results that were processed.
    pub fn total(&self) -> usize {
        self.matches.len() + self.unmatched.len() + self.ambiguous.len()
    }
}

/// Drives a [`MatchStrategyChain`] across results and the remaining pool of test points.
#[derive(Clone, Debug)]
pub struct ResultProcessor {
    chain: MatchStrategyChain,
}

impl ResultProcessor {
    /// Creates a processor that uses `chain`.
    pub fn new(chain: MatchStrategyChain) -> Self {
        Self { chain }
    }

    /// Correlates `results` against the test points of `context`.
    ///
    /// Results are processed in input order. A point bound to a result is removed from the
    /// pool, so an earlier result always wins a point over a later one.
    pub fn process(
        &self,
        context: &TestContext,
        results: impl IntoIterator<Item = NormalizedTestResult>,
    ) -> CorrelationResult {
        let mut pool: IndexMap<TestPointId, &TestPoint> = context
            .test_points()
            .iter()
            .map(|point| (point.id, point))
            .collect();
        let mut correlation = CorrelationResult::new(context.project_id(), context.test_plan());

        for result in results {
            if pool.is_empty() {
                correlation.unmatched.push(result);
                continue;
            }

            let candidates: Vec<TestPointId> = pool
                .values()
                .filter(|point| self.chain.is_match(&result, point))
                .map(|point| point.id)
                .collect();

            match candidates.as_slice() {
                [] => {
                    debug!("test result `{}` did not match any test point", result.name);
                    correlation.unmatched.push(result);
                }
                [id] => {
                    debug!("test result `{}` matched test point {id}", result.name);
                    pool.shift_remove(id);
                    correlation.matches.insert(*id, result);
                }
                _ => {
                    warn!(
                        "test result `{}` matched {} {} ({}), leaving it unmatched",
                        result.name,
                        candidates.len(),
                        plural::points_str(candidates.len()),
                        candidates.iter().join(", "),
                    );
                    correlation
                        .ambiguous
                        .push(AmbiguousResult { result, candidates });
                }
            }
        }

        correlation
    }
}
