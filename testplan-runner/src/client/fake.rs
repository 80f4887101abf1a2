// Copyright (c) The testplan-publish Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! An in-memory [`TestManagementClient`] that records every call.
//!
//! Not part of the public API.

#![allow(missing_docs)]

use super::{CreateRunRequest, TestCaseResult, TestManagementClient, TestRun, TestRunUpdate};
use crate::{
    context::{TestConfiguration, TestPlan, TestPoint},
    errors::RemoteError,
};
use camino::{Utf8Path, Utf8PathBuf};
use std::{
    collections::{HashMap, HashSet},
    sync::Mutex,
};

/// A call made against the fake.
#[derive(Clone, Debug, PartialEq)]
pub enum RecordedCall {
    ResolveProject(String),
    ListTestPlans,
    ListConfigurations,
    ListTestPoints { plan_id: u64, suite_id: u64 },
    ListTestCaseAutomation { field: String },
    CreateRun(CreateRunRequest),
    GetResults(u64),
    UpdateResults(Vec<TestCaseResult>),
    UpdateRun(TestRunUpdate),
    AttachToRun(Utf8PathBuf),
    AttachToResult { result_id: u64, name: String },
}

#[derive(Debug, Default)]
pub struct FakeClient {
    pub project_id: Option<String>,
    pub plans: Vec<TestPlan>,
    pub configs: Vec<TestConfiguration>,
    pub points: Vec<TestPoint>,
    pub automation: HashMap<String, String>,
    pub failing_attachments: HashSet<Utf8PathBuf>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl FakeClient {
    pub fn new(project_id: &str) -> Self {
        Self {
            project_id: Some(project_id.to_owned()),
            ..Default::default()
        }
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().expect("lock is not poisoned").clone()
    }

    fn record(&self, call: RecordedCall) {
        self.calls.lock().expect("lock is not poisoned").push(call);
    }

    fn not_found(what: &str) -> RemoteError {
        RemoteError::Status {
            url: format!("fake://{what}"),
            status: 404,
            body: String::new(),
        }
    }
}

const RUN_ID: u64 = 77;

impl TestManagementClient for FakeClient {
    async fn resolve_project_id(&self, name: &str) -> Result<String, RemoteError> {
        self.record(RecordedCall::ResolveProject(name.to_owned()));
        self.project_id
            .clone()
            .ok_or_else(|| Self::not_found("project"))
    }

    async fn list_test_plans(&self, _project: &str) -> Result<Vec<TestPlan>, RemoteError> {
        self.record(RecordedCall::ListTestPlans);
        Ok(self.plans.clone())
    }

    async fn list_test_configurations(
        &self,
        _project: &str,
    ) -> Result<Vec<TestConfiguration>, RemoteError> {
        self.record(RecordedCall::ListConfigurations);
        Ok(self.configs.clone())
    }

    async fn list_test_points(
        &self,
        _project: &str,
        plan_id: u64,
        suite_id: u64,
        _recursive: bool,
    ) -> Result<Vec<TestPoint>, RemoteError> {
        self.record(RecordedCall::ListTestPoints { plan_id, suite_id });
        Ok(self.points.clone())
    }

    async fn list_test_case_automation(
        &self,
        _project: &str,
        _plan_id: u64,
        _suite_id: u64,
        field: &str,
    ) -> Result<HashMap<String, String>, RemoteError> {
        self.record(RecordedCall::ListTestCaseAutomation {
            field: field.to_owned(),
        });
        Ok(self.automation.clone())
    }

    async fn create_test_run(
        &self,
        _project: &str,
        request: &CreateRunRequest,
    ) -> Result<TestRun, RemoteError> {
        self.record(RecordedCall::CreateRun(request.clone()));
        Ok(TestRun {
            id: RUN_ID,
            name: request.name.clone(),
            state: Some("InProgress".to_owned()),
            web_url: None,
        })
    }

    async fn get_test_case_results(
        &self,
        _project: &str,
        run_id: u64,
    ) -> Result<Vec<TestCaseResult>, RemoteError> {
        self.record(RecordedCall::GetResults(run_id));
        let point_ids = self
            .calls()
            .into_iter()
            .find_map(|call| match call {
                RecordedCall::CreateRun(request) => Some(request.point_ids),
                _ => None,
            })
            .unwrap_or_default();

        // Placeholders come back in reverse order so callers can't rely on position.
        Ok(point_ids
            .into_iter()
            .rev()
            .map(|point_id| TestCaseResult {
                id: 1000 + point_id,
                test_point_id: Some(point_id),
                ..Default::default()
            })
            .collect())
    }

    async fn update_test_case_results(
        &self,
        _project: &str,
        _run_id: u64,
        results: &[TestCaseResult],
    ) -> Result<Vec<TestCaseResult>, RemoteError> {
        self.record(RecordedCall::UpdateResults(results.to_vec()));
        Ok(results.to_vec())
    }

    async fn update_test_run(
        &self,
        _project: &str,
        update: &TestRunUpdate,
    ) -> Result<TestRun, RemoteError> {
        self.record(RecordedCall::UpdateRun(update.clone()));
        Ok(TestRun {
            id: update.id,
            name: update.name.clone(),
            state: Some(update.state.clone()),
            web_url: Some(format!("https://fake/runs/{}", update.id)),
        })
    }

    async fn attach_to_run(
        &self,
        _project: &str,
        _run_id: u64,
        path: &Utf8Path,
    ) -> Result<(), RemoteError> {
        self.record(RecordedCall::AttachToRun(path.to_owned()));
        if self.failing_attachments.contains(path) {
            return Err(Self::not_found("attachment"));
        }
        Ok(())
    }

    async fn attach_to_result(
        &self,
        _project: &str,
        _run_id: u64,
        result_id: u64,
        name: &str,
        path: &Utf8Path,
    ) -> Result<(), RemoteError> {
        self.record(RecordedCall::AttachToResult {
            result_id,
            name: name.to_owned(),
        });
        if self.failing_attachments.contains(path) {
            return Err(Self::not_found("attachment"));
        }
        Ok(())
    }
}
