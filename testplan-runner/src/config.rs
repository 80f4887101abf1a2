// Copyright (c) The testplan-publish Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Layered configuration for testplan-publish.
//!
//! The embedded default config is loaded first, followed by the repository config file. Values
//! passed in on the command line are applied on top by the caller.

use crate::{
    context::{ConfigAlias, ContextParameters},
    errors::{ConfigParseError, ConfigParseErrorKind},
    matching::{MatchParameters, MatchStrategySet},
    publisher::PublishOptions,
};
use camino::{Utf8Path, Utf8PathBuf};
use config::{Config, File, FileFormat};
use serde::{Deserialize, Deserializer, de::Error as _};
use std::{collections::BTreeSet, fmt, str::FromStr};
use tracing::warn;

/// Overall configuration for testplan-publish.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct TestplanConfig {
    /// How test results are matched to test points.
    pub matching: MatchingConfig,

    /// How the test plan and configurations are chosen.
    pub context: ContextConfig,

    /// How the test run is published.
    pub publish: PublishConfig,

    /// The server to talk to.
    pub server: ServerConfig,
}

impl TestplanConfig {
    /// The default location of the config within the working directory.
    pub const CONFIG_PATH: &'static str = ".config/testplan.toml";

    /// Contains the default config as a TOML file.
    pub const DEFAULT_CONFIG: &'static str = include_str!("../default-config.toml");

    /// Reads the config, layering `config_file` on top of the default config.
    ///
    /// If `config_file` is `None`, [`Self::CONFIG_PATH`] under `workdir` is used if it exists.
    pub fn from_sources(
        workdir: &Utf8Path,
        config_file: Option<&Utf8Path>,
    ) -> Result<Self, ConfigParseError> {
        let (config_file, source) = match config_file {
            Some(file) => (file.to_owned(), File::new(file.as_str(), FileFormat::Toml)),
            None => {
                let config_file = workdir.join(Self::CONFIG_PATH);
                let source = File::new(config_file.as_str(), FileFormat::Toml).required(false);
                (config_file, source)
            }
        };

        let builder = Self::make_default_config().add_source(source);
        Self::build_and_deserialize(builder, &config_file)
    }

    /// Returns the default config.
    pub fn default_config() -> Self {
        Self::build_and_deserialize(Self::make_default_config(), Utf8Path::new("<default config>"))
            .expect("default config is always valid")
    }

    fn make_default_config() -> config::ConfigBuilder<config::builder::DefaultState> {
        Config::builder().add_source(File::from_str(Self::DEFAULT_CONFIG, FileFormat::Toml))
    }

    fn build_and_deserialize(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
        config_file: &Utf8Path,
    ) -> Result<Self, ConfigParseError> {
        let config = builder.build().map_err(|error| {
            ConfigParseError::new(config_file, ConfigParseErrorKind::BuildError(error))
        })?;

        let mut unknown = BTreeSet::new();
        let mut cb = |path: serde_ignored::Path| {
            unknown.insert(path.to_string());
        };
        let ignored_de = serde_ignored::Deserializer::new(config, &mut cb);
        let config: Self = serde_path_to_error::deserialize(ignored_de).map_err(|error| {
            ConfigParseError::new(config_file, ConfigParseErrorKind::DeserializeError(error))
        })?;

        if !unknown.is_empty() {
            let keys: Vec<_> = unknown.iter().map(|key| format!("`{key}`")).collect();
            warn!(
                "ignoring unknown config keys in `{config_file}`: {}",
                keys.join(", "),
            );
        }

        Ok(config)
    }

    /// Returns the default config file path under `workdir`.
    pub fn default_config_path(workdir: &Utf8Path) -> Utf8PathBuf {
        workdir.join(Self::CONFIG_PATH)
    }
}

/// The `[matching]` section.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct MatchingConfig {
    /// The strategies to enable.
    #[serde(deserialize_with = "deserialize_from_str")]
    pub strategy: MatchStrategySet,

    /// The result property carrying a test case id.
    pub test_case_property: String,

    /// The regex that extracts a test case id from a result name.
    pub test_case_regex: String,

    /// The result property carrying a configuration id, name or alias.
    pub test_config_property: String,

    /// The work item field holding automated test names.
    pub automation_property: String,

    /// The result property that may carry the test case title.
    pub description_property: String,
}

impl MatchingConfig {
    /// Returns the parameters used to build a [`MatchStrategyChain`](crate::matching::MatchStrategyChain).
    pub fn match_parameters(&self) -> MatchParameters {
        MatchParameters {
            strategies: self.strategy,
            test_case_property: self.test_case_property.clone(),
            test_case_regex: self.test_case_regex.clone(),
            test_config_property: self.test_config_property.clone(),
            description_property: self.description_property.clone(),
        }
    }

    /// Returns the work item field to load automated test names from, if the `vsproperty`
    /// strategy is enabled.
    pub fn automation_field(&self) -> Option<&str> {
        self.strategy
            .contains(MatchStrategySet::VSPROPERTY)
            .then_some(self.automation_property.as_str())
    }
}

/// The `[context]` section.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ContextConfig {
    /// The test plan name.
    #[serde(default)]
    pub test_plan: Option<String>,

    /// Restricts test points to a single configuration.
    #[serde(default)]
    pub test_config_filter: Option<String>,

    /// Extra names for configurations.
    #[serde(default, deserialize_with = "deserialize_vec_from_str")]
    pub test_config_aliases: Vec<ConfigAlias>,
}

impl ContextConfig {
    /// Returns the parameters used to build a [`TestContext`](crate::context::TestContext).
    pub fn context_parameters(
        &self,
        project_name: impl Into<String>,
        matching: &MatchingConfig,
    ) -> ContextParameters {
        ContextParameters {
            project_name: project_name.into(),
            test_plan: self.test_plan.clone(),
            config_filter: self.test_config_filter.clone(),
            config_aliases: self.test_config_aliases.clone(),
            automation_field: matching.automation_field().map(str::to_owned),
        }
    }
}

/// The `[publish]` section.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PublishConfig {
    /// The title the run is given once complete.
    pub test_run_title: String,

    /// If true, nothing is written to the server.
    pub dry_run: bool,

    /// If true, a correlation without any match is an error.
    pub fail_on_unmatched: bool,

    /// If true, a missing test result file is an error.
    pub fail_on_missing_files: bool,

    /// If true, failing tests are an error.
    pub fail_on_failing_tests: bool,

    /// If true, skipped tests are an error.
    pub fail_on_skipped_tests: bool,
}

impl PublishConfig {
    /// Returns the options used by a [`RunPublisher`](crate::publisher::RunPublisher).
    pub fn publish_options(&self) -> PublishOptions {
        PublishOptions {
            run_title: self.test_run_title.clone(),
            dry_run: self.dry_run,
            fail_on_unmatched: self.fail_on_unmatched,
            ..Default::default()
        }
    }
}

/// The `[server]` section.
///
/// The access token is never read from config files.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ServerConfig {
    /// The collection URI.
    #[serde(default)]
    pub collection_uri: Option<String>,

    /// The project name.
    #[serde(default)]
    pub project: Option<String>,
}

fn deserialize_from_str<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: fmt::Display,
{
    let s = String::deserialize(deserializer)?;
    s.parse().map_err(D::Error::custom)
}

fn deserialize_vec_from_str<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: fmt::Display,
{
    let items = Vec::<String>::deserialize(deserializer)?;
    items
        .iter()
        .map(|item| item.parse().map_err(D::Error::custom))
        .collect()
}
