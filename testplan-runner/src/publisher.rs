// Copyright (c) The testplan-publish Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Publishes a [`CorrelationResult`] as a test run.

use crate::{
    client::{CreateRunRequest, TestCaseResult, TestManagementClient, TestRunUpdate},
    context::TestPointId,
    errors::{DisplayErrorChain, PublishError},
    helpers::plural,
    processor::CorrelationResult,
    results::{NormalizedTestResult, TestAttachment},
};
use camino::Utf8PathBuf;
use indexmap::IndexMap;
use std::time::Instant;
use tracing::{debug, info, warn};

/// The default test run title.
pub const DEFAULT_RUN_TITLE: &str = "PublishTestPlanResults";

const COMPLETED: &str = "Completed";

/// Options for a [`RunPublisher`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PublishOptions {
    /// The title the run is given once complete.
    pub run_title: String,

    /// The build that produced the results.
    pub build_id: Option<String>,

    /// The release the results belong to.
    pub release_uri: Option<String>,

    /// The release environment the results belong to.
    pub release_environment_uri: Option<String>,

    /// If true, nothing is written to the remote system.
    pub dry_run: bool,

    /// If true, a correlation without any match is an error.
    pub fail_on_unmatched: bool,

    /// Files attached to the run itself, typically the result files that were read.
    pub run_files: Vec<Utf8PathBuf>,
}

impl Default for PublishOptions {
    fn default() -> Self {
        Self {
            run_title: DEFAULT_RUN_TITLE.to_owned(),
            build_id: None,
            release_uri: None,
            release_environment_uri: None,
            dry_run: false,
            fail_on_unmatched: true,
            run_files: Vec::new(),
        }
    }
}

/// A test run that was published.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PublishedRun {
    /// The run identifier.
    pub id: u64,

    /// A browsable URL for the run, if the server reported one.
    pub url: Option<String>,
}

/// Creates test runs and writes outcomes back through a [`TestManagementClient`].
#[derive(Debug)]
pub struct RunPublisher<'a, C> {
    client: &'a C,
    options: PublishOptions,
}

impl<'a, C: TestManagementClient> RunPublisher<'a, C> {
    /// Creates a new publisher.
    pub fn new(client: &'a C, options: PublishOptions) -> Self {
        Self { client, options }
    }

    /// Publishes `correlation`.
    ///
    /// Returns `None` if nothing was published, either because this is a dry run or because
    /// nothing matched and that isn't treated as an error.
    pub async fn publish(
        &self,
        correlation: &CorrelationResult,
    ) -> Result<Option<PublishedRun>, PublishError> {
        if self.options.dry_run {
            info!("dry run enabled, skipping publishing results");
            return Ok(None);
        }

        let plan = &correlation.test_plan;
        if correlation.matches.is_empty() {
            if self.options.fail_on_unmatched {
                return Err(PublishError::NoMatches {
                    plan: plan.name.clone(),
                });
            }
            warn!(
                "no test results could be correlated to test plan `{}`, skipping publish",
                plan.name
            );
            return Ok(None);
        }

        let project = correlation.project_id.as_str();
        let request = CreateRunRequest {
            name: self.options.run_title.clone(),
            plan_id: plan.id,
            point_ids: correlation.matches.keys().map(|id| id.0).collect(),
            build_id: self.options.build_id.clone(),
            release_uri: self.options.release_uri.clone(),
            release_environment_uri: self.options.release_environment_uri.clone(),
        };
        debug!(
            "creating test run for project {project}, test plan {} with {} {}",
            plan.id,
            request.point_ids.len(),
            plural::points_str(request.point_ids.len()),
        );
        let run = self
            .client
            .create_test_run(project, &request)
            .await
            .map_err(|err| PublishError::CreateRun {
                plan: plan.name.clone(),
                err,
            })?;

        let mut results = self
            .client
            .get_test_case_results(project, run.id)
            .await
            .map_err(|err| PublishError::FetchResults { run_id: run.id, err })?;

        let mut attachments: IndexMap<u64, &[TestAttachment]> = IndexMap::new();
        for result in &mut results {
            let matched = result
                .test_point_id
                .and_then(|point_id| correlation.matches.get(&TestPointId(point_id)));
            let Some(matched) = matched else {
                warn!(
                    "test case result {} in run {} does not belong to a correlated test point",
                    result.id, run.id
                );
                continue;
            };

            apply_outcome(result, matched);
            if matched.has_attachments() {
                attachments.insert(result.id, &matched.attachments);
            }
        }

        info!("publishing test results to test run {}", run.id);
        self.client
            .update_test_case_results(project, run.id, &results)
            .await
            .map_err(|err| PublishError::UpdateResults { run_id: run.id, err })?;

        for path in &self.options.run_files {
            if let Err(err) = self.client.attach_to_run(project, run.id, path).await {
                warn!(
                    "failed to attach `{path}` to test run {}: {}",
                    run.id,
                    DisplayErrorChain::new(err)
                );
            }
        }
        self.upload_attachments(project, run.id, &attachments).await;

        let update = TestRunUpdate {
            id: run.id,
            name: self.options.run_title.clone(),
            state: COMPLETED.to_owned(),
            comment: None,
        };
        let finished = self
            .client
            .update_test_run(project, &update)
            .await
            .map_err(|err| PublishError::CompleteRun { run_id: run.id, err })?;

        let published = PublishedRun {
            id: finished.id,
            url: finished.web_url.or(run.web_url),
        };
        match &published.url {
            Some(url) => info!("published test run {}: {url}", published.id),
            None => info!("published test run {}", published.id),
        }
        Ok(Some(published))
    }

    async fn upload_attachments(
        &self,
        project: &str,
        run_id: u64,
        attachments: &IndexMap<u64, &[TestAttachment]>,
    ) {
        if attachments.is_empty() {
            return;
        }
        info!(
            "identified {} test {} with attachments",
            attachments.len(),
            plural::results_str(attachments.len())
        );

        let start = Instant::now();
        let mut count = 0;
        for (result_id, result_attachments) in attachments {
            for attachment in result_attachments.iter() {
                count += 1;
                if let Err(err) = self
                    .client
                    .attach_to_result(
                        project,
                        run_id,
                        *result_id,
                        &attachment.name,
                        &attachment.path,
                    )
                    .await
                {
                    warn!(
                        "failed to attach `{}` to test result {result_id}: {}",
                        attachment.path,
                        DisplayErrorChain::new(err)
                    );
                }
            }
        }

        info!(
            "uploaded {count} {} in {} ms",
            plural::attachments_str(count),
            start.elapsed().as_millis()
        );
    }
}

fn apply_outcome(result: &mut TestCaseResult, matched: &NormalizedTestResult) {
    result.outcome = Some(matched.outcome.as_remote_str().to_owned());
    result.duration_ms = matched.duration_ms();
    result.error_message = matched.failure_message.clone();
    result.stack_trace = matched.stack_trace.clone();
    result.state = Some(COMPLETED.to_owned());
}
