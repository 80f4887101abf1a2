// Copyright (c) The testplan-publish Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::{
    ExpectedError, Result,
    output::{OutputContext, OutputOpts, OutputWriter, clap_styles},
    summary::{correlation_summary, write_human_summary},
};
use camino::{Utf8Path, Utf8PathBuf};
use clap::{Args, Parser, ValueEnum};
use std::io::Write;
use testplan_metadata::CorrelationSummary;
use testplan_runner::{
    analyzer::analyze_results,
    client::{AzureDevOpsClient, TestManagementClient},
    config::TestplanConfig,
    context::{ConfigAlias, ContextParameters, TestContextBuilder},
    matching::{MatchParameters, MatchStrategyChain, MatchStrategySet},
    processor::ResultProcessor,
    publisher::{PublishOptions, RunPublisher},
    reader::{ReportFormat, expand_result_files, read_results},
};
use tracing::{debug, info};

/// Publish automated test results to the test points of a test plan.
///
/// Test results are read from result files produced by a test framework and matched against the
/// test points of a test plan. Matched results are published as a test run; test points without
/// a result are left untouched.
#[derive(Debug, Parser)]
#[command(
    version,
    styles = clap_styles::style(),
    max_term_width = 100,
)]
pub struct TestplanPublishApp {
    /// The format of the test result files
    #[arg(long, short = 'f', value_name = "FORMAT", env = "TESTPLAN_FORMAT")]
    format: ReportFormat,

    /// Test result files or glob patterns, relative to the results directory
    #[arg(required = true, value_name = "FILES")]
    files: Vec<String>,

    #[clap(flatten)]
    server: ServerOpts,

    #[clap(flatten)]
    context: ContextOpts,

    #[clap(flatten)]
    matching: MatchingOpts,

    #[clap(flatten)]
    publish: PublishOpts,

    /// Config file [default: .config/testplan.toml in the current directory]
    #[arg(long, value_name = "PATH", env = "TESTPLAN_CONFIG_FILE")]
    config_file: Option<Utf8PathBuf>,

    /// The format to write the correlation summary in
    #[arg(long, value_enum, default_value_t, value_name = "FORMAT")]
    message_format: MessageFormat,

    #[clap(flatten)]
    output: OutputOpts,
}

#[derive(Debug, Args)]
#[command(next_help_heading = "Server options")]
struct ServerOpts {
    /// The collection URI of the server
    #[arg(long, value_name = "URI", env = "SYSTEM_COLLECTIONURI")]
    collection_uri: Option<String>,

    /// The project containing the test plan
    #[arg(long, value_name = "NAME", env = "SYSTEM_TEAMPROJECT")]
    project: Option<String>,

    /// A personal access token [env: TESTPLAN_ACCESS_TOKEN, SYSTEM_ACCESSTOKEN]
    #[arg(long, value_name = "TOKEN", hide_env_values = true)]
    access_token: Option<String>,
}

#[derive(Debug, Args)]
#[command(next_help_heading = "Test plan options")]
struct ContextOpts {
    /// The name of the test plan [default: the active test plan]
    #[arg(long, value_name = "NAME", env = "TESTPLAN_TEST_PLAN")]
    test_plan: Option<String>,

    /// Only match test points of this configuration (id, name or alias)
    #[arg(long, value_name = "CONFIG", env = "TESTPLAN_CONFIG_FILTER")]
    config_filter: Option<String>,

    /// An alias for a test configuration, in the form ALIAS=NAME (may be repeated)
    #[arg(long = "config-alias", value_name = "ALIAS=NAME")]
    config_aliases: Vec<ConfigAlias>,
}

#[derive(Debug, Args)]
#[command(next_help_heading = "Matching options")]
struct MatchingOpts {
    /// Comma-separated match strategies: none, name, regex, property, vsproperty, auto
    #[arg(long, value_name = "STRATEGIES", env = "TESTPLAN_STRATEGY")]
    strategy: Option<MatchStrategySet>,

    /// The test result property holding the test case id
    #[arg(long, value_name = "NAME")]
    test_case_property: Option<String>,

    /// The regex extracting the test case id from a test result name
    #[arg(long, value_name = "REGEX")]
    test_case_regex: Option<String>,

    /// The test result property holding the test configuration
    #[arg(long, value_name = "NAME")]
    test_config_property: Option<String>,
}

#[derive(Debug, Args)]
#[command(next_help_heading = "Publish options")]
struct PublishOpts {
    /// The directory relative test result files are read from [default: current directory]
    #[arg(long, value_name = "DIR", env = "TESTPLAN_RESULTS_DIR")]
    results_dir: Option<Utf8PathBuf>,

    /// The title of the published test run
    #[arg(long, value_name = "TITLE")]
    run_title: Option<String>,

    /// The build the test results belong to
    #[arg(long, value_name = "ID", env = "BUILD_BUILDID")]
    build_id: Option<String>,

    /// The release the test results belong to
    #[arg(long, value_name = "URI", env = "RELEASE_RELEASEURI")]
    release_uri: Option<String>,

    /// The release environment the test results belong to
    #[arg(long, value_name = "URI", env = "RELEASE_ENVIRONMENTURI")]
    release_environment_uri: Option<String>,

    /// Correlate results without writing anything to the server
    #[arg(long)]
    dry_run: bool,

    /// Don't fail if no test result matched a test point
    #[arg(long)]
    allow_unmatched: bool,

    /// Don't fail if a test result file does not exist
    #[arg(long)]
    allow_missing_files: bool,

    /// Fail after publishing if the test results contain failing tests
    #[arg(long)]
    fail_on_failing_tests: bool,

    /// Fail after publishing if the test results contain skipped tests
    #[arg(long)]
    fail_on_skipped_tests: bool,
}

/// The format the correlation summary is written in.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, ValueEnum)]
enum MessageFormat {
    /// A human-readable summary.
    #[default]
    Human,

    /// A JSON summary.
    Json,
}

impl TestplanPublishApp {
    /// Initializes the output context.
    pub fn init_output(&self) -> OutputContext {
        self.output.init()
    }

    /// Executes the app.
    ///
    /// Returns the exit code.
    pub fn exec(self, output: OutputContext, output_writer: &mut OutputWriter) -> Result<i32> {
        let workdir = current_dir()?;
        let config = TestplanConfig::from_sources(&workdir, self.config_file.as_deref())?;
        let settings = Settings::new(self, config, &workdir)?;

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .thread_name("testplan-publish-worker")
            .build()
            .map_err(|err| ExpectedError::TokioRuntimeCreate { err })?;

        let client = AzureDevOpsClient::new(&settings.collection_uri, &settings.access_token);
        let summary = runtime.block_on(settings.run(&client))?;

        let mut writer = output_writer.stdout_writer();
        match settings.message_format {
            MessageFormat::Human => {
                let styles = output.stdout_styles();
                write_human_summary(&summary, output.verbose, &styles, &mut writer)
                    .map_err(|err| ExpectedError::WriteSummary { err })?;
            }
            MessageFormat::Json => {
                serde_json::to_writer(&mut writer, &summary)
                    .map_err(|err| ExpectedError::SerializeSummary { err })?;
                writeln!(writer).map_err(|err| ExpectedError::WriteSummary { err })?;
            }
        }
        writer
            .flush()
            .map_err(|err| ExpectedError::WriteSummary { err })?;

        Ok(0)
    }
}

/// The merged result of command-line arguments and config.
#[derive(Debug)]
struct Settings {
    format: ReportFormat,
    files: Vec<String>,
    results_dir: Utf8PathBuf,
    collection_uri: String,
    access_token: String,
    context: ContextParameters,
    matching: MatchParameters,
    publish: PublishOptions,
    fail_on_missing_files: bool,
    fail_on_failing_tests: bool,
    fail_on_skipped_tests: bool,
    message_format: MessageFormat,
}

impl Settings {
    fn new(app: TestplanPublishApp, config: TestplanConfig, workdir: &Utf8Path) -> Result<Self> {
        let TestplanPublishApp {
            format,
            files,
            server,
            context,
            matching,
            publish,
            message_format,
            ..
        } = app;

        let collection_uri = server
            .collection_uri
            .or(config.server.collection_uri)
            .ok_or_else(|| {
                ExpectedError::missing_argument("--collection-uri", "SYSTEM_COLLECTIONURI")
            })?;
        let project = server
            .project
            .or(config.server.project)
            .ok_or_else(|| ExpectedError::missing_argument("--project", "SYSTEM_TEAMPROJECT"))?;
        let access_token = server
            .access_token
            .or_else(|| env_var("TESTPLAN_ACCESS_TOKEN"))
            .or_else(|| env_var("SYSTEM_ACCESSTOKEN"))
            .ok_or_else(|| ExpectedError::missing_argument("--access-token", "SYSTEM_ACCESSTOKEN"))?;

        let mut match_config = config.matching;
        if let Some(strategy) = matching.strategy {
            match_config.strategy = strategy;
        }
        if let Some(property) = matching.test_case_property {
            match_config.test_case_property = property;
        }
        if let Some(regex) = matching.test_case_regex {
            match_config.test_case_regex = regex;
        }
        if let Some(property) = matching.test_config_property {
            match_config.test_config_property = property;
        }

        let mut context_config = config.context;
        if context.test_plan.is_some() {
            context_config.test_plan = context.test_plan;
        }
        if context.config_filter.is_some() {
            context_config.test_config_filter = context.config_filter;
        }
        context_config.test_config_aliases.extend(context.config_aliases);

        let results_dir = match publish.results_dir {
            Some(dir) => workdir.join(dir),
            None => workdir.to_owned(),
        };
        if !results_dir.is_dir() {
            return Err(ExpectedError::ResultsDirMissing { dir: results_dir });
        }

        let mut publish_options = config.publish.publish_options();
        if let Some(title) = publish.run_title {
            publish_options.run_title = title;
        }
        publish_options.build_id = publish.build_id;
        publish_options.release_uri = publish.release_uri;
        publish_options.release_environment_uri = publish.release_environment_uri;
        publish_options.dry_run |= publish.dry_run;
        publish_options.fail_on_unmatched &= !publish.allow_unmatched;

        Ok(Self {
            format,
            files,
            results_dir,
            collection_uri,
            access_token,
            context: context_config.context_parameters(project, &match_config),
            matching: match_config.match_parameters(),
            publish: publish_options,
            fail_on_missing_files: config.publish.fail_on_missing_files
                && !publish.allow_missing_files,
            fail_on_failing_tests: config.publish.fail_on_failing_tests
                || publish.fail_on_failing_tests,
            fail_on_skipped_tests: config.publish.fail_on_skipped_tests
                || publish.fail_on_skipped_tests,
            message_format,
        })
    }

    async fn run<C: TestManagementClient>(&self, client: &C) -> Result<CorrelationSummary> {
        let files = expand_result_files(&self.results_dir, &self.files, self.fail_on_missing_files)?;
        let results = read_results(self.format, &files)?;

        let context = TestContextBuilder::new(client, self.context.clone())
            .build()
            .await?;
        let chain = MatchStrategyChain::build(&self.matching, &context)?;
        debug!(
            "matching with strategies: {}",
            chain
                .strategies()
                .iter()
                .map(|strategy| strategy.name())
                .collect::<Vec<_>>()
                .join(", ")
        );

        // Failing and skipped results are published before this check fails the run.
        let counts_check = analyze_results(
            &results,
            self.fail_on_failing_tests,
            self.fail_on_skipped_tests,
        );

        let correlation = ResultProcessor::new(chain).process(&context, results);
        info!(
            "{} matched, {} unmatched, {} ambiguous",
            correlation.matches.len(),
            correlation.unmatched.len(),
            correlation.ambiguous.len(),
        );

        let mut options = self.publish.clone();
        options.run_files = files;
        let run = RunPublisher::new(client, options)
            .publish(&correlation)
            .await?;
        counts_check?;

        Ok(correlation_summary(&correlation, run.as_ref()))
    }
}

fn current_dir() -> Result<Utf8PathBuf> {
    let dir =
        std::env::current_dir().map_err(|error| ExpectedError::CurrentDirFailed { error })?;
    Utf8PathBuf::try_from(dir)
        .map_err(|err| ExpectedError::CurrentDirInvalidUtf8 { path: err.into_path_buf() })
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino_tempfile::Utf8TempDir;
    use clap::CommandFactory;
    use indoc::indoc;
    use pretty_assertions::assert_eq;
    use testplan_runner::{
        client::fake::{FakeClient, RecordedCall},
        context::{TestConfiguration, TestPlan, TestPoint},
        errors::AnalyzeError,
    };

    #[test]
    fn verify_app() {
        TestplanPublishApp::command().debug_assert();
    }

    fn parse(args: &[&str]) -> TestplanPublishApp {
        let args = std::iter::once("testplan-publish").chain(args.iter().copied());
        TestplanPublishApp::try_parse_from(args).expect("arguments are valid")
    }

    #[test]
    fn parse_arguments() {
        let app = parse(&[
            "--format",
            "trx",
            "--collection-uri",
            "https://dev.azure.com/fabrikam/",
            "--project",
            "Fabrikam",
            "--config-alias",
            "win=Windows 10",
            "--config-alias",
            "linux='Ubuntu 22.04'",
            "--strategy",
            "name,regex",
            "--dry-run",
            "--message-format",
            "json",
            "results/*.trx",
            "extra.trx",
        ]);

        assert_eq!(app.format, ReportFormat::MsTest);
        assert_eq!(app.files, vec!["results/*.trx", "extra.trx"]);
        assert_eq!(app.context.config_aliases.len(), 2);
        assert_eq!(
            app.matching.strategy,
            Some(MatchStrategySet::NAME | MatchStrategySet::REGEX)
        );
        assert!(app.publish.dry_run);
        assert_eq!(app.message_format, MessageFormat::Json);
    }

    #[test]
    fn invalid_arguments() {
        let base = ["testplan-publish", "--format", "junit"];
        let cases: [&[&str]; 3] = [
            &[],
            &["--strategy", "fuzzy", "a.xml"],
            &["--config-alias", "no-equals", "a.xml"],
        ];
        for extra in cases {
            let args = base.iter().chain(extra.iter()).copied();
            TestplanPublishApp::try_parse_from(args).expect_err("arguments are invalid");
        }
        TestplanPublishApp::try_parse_from(["testplan-publish", "--format", "tap", "a.xml"])
            .expect_err("unknown format");
    }

    #[test]
    fn command_line_overrides_config() {
        let app = parse(&[
            "--format",
            "junit",
            "--collection-uri",
            "https://dev.azure.com/fabrikam/",
            "--project",
            "Fabrikam",
            "--access-token",
            "pat",
            "--test-plan",
            "Sprint 2",
            "--strategy",
            "vsproperty",
            "--test-case-regex",
            r"TC(\d+)",
            "--run-title",
            "Nightly",
            "--allow-unmatched",
            "--allow-missing-files",
            "--fail-on-skipped-tests",
            "a.xml",
        ]);
        let workdir = std::env::temp_dir();
        let workdir = Utf8Path::from_path(&workdir).expect("temp dir is UTF-8");

        let settings = Settings::new(app, TestplanConfig::default_config(), workdir)
            .expect("settings are valid");
        assert_eq!(settings.collection_uri, "https://dev.azure.com/fabrikam/");
        assert_eq!(settings.access_token, "pat");
        assert_eq!(settings.context.project_name, "Fabrikam");
        assert_eq!(settings.context.test_plan.as_deref(), Some("Sprint 2"));
        assert_eq!(
            settings.context.automation_field.as_deref(),
            Some("Microsoft.VSTS.TCM.AutomatedTestName")
        );
        assert_eq!(settings.matching.strategies, MatchStrategySet::VSPROPERTY);
        assert_eq!(settings.matching.test_case_regex, r"TC(\d+)");
        assert_eq!(settings.matching.test_case_property, "TestCase");
        assert_eq!(settings.publish.run_title, "Nightly");
        assert!(!settings.publish.fail_on_unmatched);
        assert!(!settings.publish.dry_run);
        assert!(!settings.fail_on_missing_files);
        assert!(!settings.fail_on_failing_tests);
        assert!(settings.fail_on_skipped_tests);
        assert_eq!(settings.results_dir, workdir);
    }

    #[tokio::test]
    async fn failing_tests_are_published_before_failing() {
        let dir = Utf8TempDir::new().expect("created temp dir");
        std::fs::write(
            dir.path().join("report.xml"),
            indoc! {r#"
                <testsuites>
                  <testsuite name="Tests">
                    <testcase classname="Tests" name="Login">
                      <failure message="expected 1, got 2"/>
                    </testcase>
                  </testsuite>
                </testsuites>
            "#},
        )
        .expect("wrote report");

        let mut client = FakeClient::new("proj-id");
        client.plans = vec![TestPlan {
            id: 5,
            name: "Sprint 1".to_owned(),
            end_date: None,
            root_suite_id: 6,
        }];
        client.configs = vec![TestConfiguration::new("1", "Windows 10")];
        client.points = vec![TestPoint::new(1, "100", "Login", "1")];

        let settings = Settings {
            format: ReportFormat::JUnit,
            files: vec!["report.xml".to_owned()],
            results_dir: dir.path().to_owned(),
            collection_uri: "https://dev.azure.com/fabrikam/".to_owned(),
            access_token: "pat".to_owned(),
            context: ContextParameters {
                project_name: "Fabrikam".to_owned(),
                ..Default::default()
            },
            matching: MatchParameters {
                strategies: MatchStrategySet::NAME,
                ..Default::default()
            },
            publish: PublishOptions::default(),
            fail_on_missing_files: true,
            fail_on_failing_tests: true,
            fail_on_skipped_tests: false,
            message_format: MessageFormat::Human,
        };

        let err = settings
            .run(&client)
            .await
            .expect_err("failing tests fail the run");
        assert!(
            matches!(
                err,
                ExpectedError::AnalyzeError {
                    err: AnalyzeError::FailingTests { count: 1 }
                }
            ),
            "unexpected error: {err:?}"
        );

        let calls = client.calls();
        let update = calls.iter().find_map(|call| match call {
            RecordedCall::UpdateResults(results) => Some(results),
            _ => None,
        });
        let update = update.expect("results were published");
        assert_eq!(update.len(), 1);
        assert_eq!(update[0].test_point_id, Some(1));
        assert_eq!(update[0].outcome.as_deref(), Some("Failed"));
        assert!(
            calls
                .iter()
                .any(|call| matches!(call, RecordedCall::UpdateRun(update) if update.state == "Completed")),
            "run was completed: {calls:?}"
        );
    }
}
