// Copyright (c) The testplan-publish Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use super::{ConfigAlias, ConfigRegistry, TestContext, TestPlan};
use crate::{client::TestManagementClient, errors::ContextBuildError, helpers::plural};
use chrono::{DateTime, Utc};
use tracing::{debug, info};

/// The user-supplied inputs a [`TestContext`] is resolved from.
#[derive(Clone, Debug, Default)]
pub struct ContextParameters {
    /// The project name.
    pub project_name: String,

    /// The test plan name. If unset, the active plan is inferred.
    pub test_plan: Option<String>,

    /// Restricts test points to a single configuration (by id, name or alias).
    pub config_filter: Option<String>,

    /// Aliases to register on top of configuration ids and names.
    pub config_aliases: Vec<ConfigAlias>,

    /// If set, the work item field holding automated test names, which are then loaded onto
    /// every test point.
    pub automation_field: Option<String>,
}

/// Resolves [`ContextParameters`] into a [`TestContext`] through a [`TestManagementClient`].
///
/// Each remote lookup is performed exactly once.
#[derive(Debug)]
pub struct TestContextBuilder<'a, C> {
    client: &'a C,
    params: ContextParameters,
    now: DateTime<Utc>,
}

impl<'a, C: TestManagementClient> TestContextBuilder<'a, C> {
    /// Creates a new builder.
    pub fn new(client: &'a C, params: ContextParameters) -> Self {
        Self {
            client,
            params,
            now: Utc::now(),
        }
    }

    /// Sets the time test plan end dates are compared against when inferring the active plan.
    pub fn with_current_time(mut self, now: DateTime<Utc>) -> Self {
        self.now = now;
        self
    }

    /// Performs the remote lookups and returns the context.
    pub async fn build(self) -> Result<TestContext, ContextBuildError> {
        let params = &self.params;
        let project_name = params.project_name.as_str();

        let project_id = self
            .client
            .resolve_project_id(project_name)
            .await
            .map_err(|err| ContextBuildError::ProjectNotResolved {
                project: project_name.to_owned(),
                err,
            })?;
        debug!("resolved project `{project_name}` to {project_id}");

        let plans = self
            .client
            .list_test_plans(&project_id)
            .await
            .map_err(|err| ContextBuildError::ListTestPlans {
                project: project_name.to_owned(),
                err,
            })?;
        let test_plan = select_test_plan(project_name, plans, params.test_plan.as_deref(), self.now)?;
        info!("using test plan `{}` (id {})", test_plan.name, test_plan.id);

        let configs = self
            .client
            .list_test_configurations(&project_id)
            .await
            .map_err(|err| ContextBuildError::ListConfigurations {
                project: project_name.to_owned(),
                err,
            })?;
        debug!(
            "loaded {} test {}",
            configs.len(),
            plural::configurations_str(configs.len())
        );

        let mut registry = ConfigRegistry::new();
        for config in configs {
            registry.register(config);
        }
        for alias in &params.config_aliases {
            registry.add_alias(&alias.alias, &alias.config)?;
        }

        let config_filter = match &params.config_filter {
            Some(filter) => {
                let config = registry.resolve(filter).ok_or_else(|| {
                    ContextBuildError::UnknownConfigFilter {
                        filter: filter.clone(),
                    }
                })?;
                debug!(
                    "filtering test points to configuration `{}` (id {})",
                    config.name, config.id
                );
                Some(config.id.clone())
            }
            None => None,
        };

        let mut test_points = self
            .client
            .list_test_points(&project_id, test_plan.id, test_plan.root_suite_id, true)
            .await
            .map_err(|err| ContextBuildError::ListTestPoints {
                plan: test_plan.name.clone(),
                err,
            })?;
        if let Some(filter) = &config_filter {
            test_points.retain(|point| &point.configuration_id == filter);
        }

        if let Some(field) = &params.automation_field {
            let automation = self
                .client
                .list_test_case_automation(
                    &project_id,
                    test_plan.id,
                    test_plan.root_suite_id,
                    field,
                )
                .await
                .map_err(|err| ContextBuildError::ListTestCases {
                    plan: test_plan.name.clone(),
                    err,
                })?;
            for point in &mut test_points {
                point.automated_test_name = automation.get(&point.test_case_id).cloned();
            }
        }

        debug!(
            "loaded {} {} from test plan `{}`",
            test_points.len(),
            plural::points_str(test_points.len()),
            test_plan.name,
        );

        Ok(TestContext::new(
            project_id,
            project_name,
            test_plan,
            registry,
            config_filter,
            test_points,
        ))
    }
}

fn select_test_plan(
    project: &str,
    mut plans: Vec<TestPlan>,
    name: Option<&str>,
    now: DateTime<Utc>,
) -> Result<TestPlan, ContextBuildError> {
    if plans.is_empty() {
        return Err(ContextBuildError::NoTestPlans {
            project: project.to_owned(),
        });
    }

    if let Some(name) = name {
        let mut named: Vec<_> = plans.into_iter().filter(|plan| plan.name == name).collect();
        return match named.len() {
            0 => Err(ContextBuildError::TestPlanNotFound {
                name: name.to_owned(),
            }),
            1 => Ok(named.remove(0)),
            _ => Err(ContextBuildError::TestPlanAmbiguous {
                name: name.to_owned(),
                ids: named.iter().map(|plan| plan.id).collect(),
            }),
        };
    }

    if plans.len() == 1 {
        return Ok(plans.remove(0));
    }

    plans
        .into_iter()
        .filter(|plan| plan.end_date.is_some_and(|end| end > now))
        .max_by_key(|plan| plan.end_date)
        .ok_or(ContextBuildError::NoActiveTestPlan)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        client::fake::{FakeClient, RecordedCall},
        context::{ConfigurationId, TestConfiguration, TestPoint},
    };
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn date(year: i32, month: u32, day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(year, month, day, 0, 0, 0)
            .single()
            .expect("valid date")
    }

    fn plan(id: u64, name: &str, end_date: Option<DateTime<Utc>>) -> TestPlan {
        TestPlan {
            id,
            name: name.to_owned(),
            end_date,
            root_suite_id: id * 10,
        }
    }

    fn client() -> FakeClient {
        let mut client = FakeClient::new("proj-id");
        client.plans = vec![plan(1, "Sprint 1", None)];
        client.configs = vec![
            TestConfiguration::new("10", "Windows 10"),
            TestConfiguration::new("20", "Ubuntu 22.04"),
        ];
        client.points = vec![
            TestPoint::new(100, "1", "Login", "10"),
            TestPoint::new(101, "1", "Login", "20"),
            TestPoint::new(102, "2", "Logout", "20"),
        ];
        client
    }

    fn params() -> ContextParameters {
        ContextParameters {
            project_name: "Fabrikam".to_owned(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn builds_context_with_single_plan() {
        let client = client();
        let context = TestContextBuilder::new(&client, params())
            .build()
            .await
            .expect("context builds");

        assert_eq!(context.project_id(), "proj-id");
        assert_eq!(context.project_name(), "Fabrikam");
        assert_eq!(context.test_plan().id, 1);
        assert_eq!(context.test_points().len(), 3);
        assert_eq!(context.config_filter(), None);
        assert_eq!(
            client.calls(),
            vec![
                RecordedCall::ResolveProject("Fabrikam".to_owned()),
                RecordedCall::ListTestPlans,
                RecordedCall::ListConfigurations,
                RecordedCall::ListTestPoints {
                    plan_id: 1,
                    suite_id: 10
                },
            ]
        );
    }

    #[tokio::test]
    async fn unresolved_project_is_an_error() {
        let mut client = client();
        client.project_id = None;
        let err = TestContextBuilder::new(&client, params())
            .build()
            .await
            .expect_err("project is unknown");
        assert_eq!(err.to_string(), "could not resolve project name `Fabrikam`");
    }

    #[tokio::test]
    async fn plan_is_selected_by_name() {
        let mut client = client();
        client.plans = vec![plan(1, "Sprint 1", None), plan(2, "Sprint 2", None)];
        let context = TestContextBuilder::new(
            &client,
            ContextParameters {
                test_plan: Some("Sprint 2".to_owned()),
                ..params()
            },
        )
        .build()
        .await
        .expect("context builds");
        assert_eq!(context.test_plan().id, 2);
    }

    #[tokio::test]
    async fn plan_name_must_be_unique() {
        let mut client = client();
        client.plans = vec![plan(1, "Sprint", None), plan(2, "Sprint", None)];
        let err = TestContextBuilder::new(
            &client,
            ContextParameters {
                test_plan: Some("Sprint".to_owned()),
                ..params()
            },
        )
        .build()
        .await
        .expect_err("plan name is ambiguous");
        assert!(
            matches!(&err, ContextBuildError::TestPlanAmbiguous { ids, .. } if ids == &[1, 2]),
            "unexpected error: {err}"
        );
    }

    #[tokio::test]
    async fn missing_plan_name_is_an_error() {
        let client = client();
        let err = TestContextBuilder::new(
            &client,
            ContextParameters {
                test_plan: Some("Sprint 9".to_owned()),
                ..params()
            },
        )
        .build()
        .await
        .expect_err("plan does not exist");
        assert_eq!(err.to_string(), "test plan `Sprint 9` was not found");
    }

    #[test]
    fn active_plan_has_latest_future_end_date() {
        let now = date(2024, 6, 1);
        let plans = vec![
            plan(1, "Past", Some(date(2024, 1, 1))),
            plan(2, "Soon", Some(date(2024, 7, 1))),
            plan(3, "Later", Some(date(2024, 12, 1))),
            plan(4, "Open", None),
        ];
        let selected = select_test_plan("Fabrikam", plans, None, now).expect("plan is inferred");
        assert_eq!(selected.name, "Later");
    }

    #[test]
    fn no_future_plan_is_an_error() {
        let now = date(2024, 6, 1);
        let plans = vec![
            plan(1, "Past", Some(date(2024, 1, 1))),
            plan(2, "Open", None),
        ];
        let err = select_test_plan("Fabrikam", plans, None, now).expect_err("no active plan");
        assert!(matches!(err, ContextBuildError::NoActiveTestPlan));
    }

    #[test]
    fn no_plans_is_an_error() {
        let err =
            select_test_plan("Fabrikam", Vec::new(), None, date(2024, 6, 1)).expect_err("no plans");
        assert_eq!(err.to_string(), "no test plans found in project `Fabrikam`");
    }

    #[tokio::test]
    async fn unknown_alias_names_configuration() {
        let client = client();
        let err = TestContextBuilder::new(
            &client,
            ContextParameters {
                config_aliases: vec!["mac=macOS 14".parse().expect("alias parses")],
                ..params()
            },
        )
        .build()
        .await
        .expect_err("alias is unknown");
        assert!(
            err.to_string().contains("`macOS 14`"),
            "error names the configuration: {err}"
        );
    }

    #[tokio::test]
    async fn config_filter_restricts_points() {
        let client = client();
        let context = TestContextBuilder::new(
            &client,
            ContextParameters {
                config_aliases: vec!["linux=Ubuntu 22.04".parse().expect("alias parses")],
                config_filter: Some("linux".to_owned()),
                ..params()
            },
        )
        .build()
        .await
        .expect("context builds");

        assert_eq!(context.config_filter(), Some(&ConfigurationId::new("20")));
        let ids: Vec<_> = context.test_points().iter().map(|p| p.id.0).collect();
        assert_eq!(ids, vec![101, 102]);
    }

    #[tokio::test]
    async fn unknown_config_filter_is_an_error() {
        let client = client();
        let err = TestContextBuilder::new(
            &client,
            ContextParameters {
                config_filter: Some("macOS".to_owned()),
                ..params()
            },
        )
        .build()
        .await
        .expect_err("filter is unknown");
        assert!(matches!(err, ContextBuildError::UnknownConfigFilter { filter } if filter == "macOS"));
    }

    #[tokio::test]
    async fn automation_names_are_loaded_on_request() {
        let mut client = client();
        client
            .automation
            .insert("1".to_owned(), "Tests.LoginTests.Login".to_owned());
        let context = TestContextBuilder::new(
            &client,
            ContextParameters {
                automation_field: Some("Microsoft.VSTS.TCM.AutomatedTestName".to_owned()),
                ..params()
            },
        )
        .build()
        .await
        .expect("context builds");

        let names: Vec<_> = context
            .test_points()
            .iter()
            .map(|p| p.automated_test_name.as_deref())
            .collect();
        assert_eq!(
            names,
            vec![
                Some("Tests.LoginTests.Login"),
                Some("Tests.LoginTests.Login"),
                None
            ]
        );
        assert!(client.calls().contains(&RecordedCall::ListTestCaseAutomation {
            field: "Microsoft.VSTS.TCM.AutomatedTestName".to_owned()
        }));
    }
}
