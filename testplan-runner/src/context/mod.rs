// Copyright (c) The testplan-publish Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The resolved project, test plan, configurations and test points that results are correlated
//! against.
//!
//! A [`TestContext`] is built once per run by a [`TestContextBuilder`] and is immutable
//! afterwards.

mod builder;

pub use builder::*;

use crate::errors::{ConfigAliasParseError, ContextBuildError};
use chrono::{DateTime, Utc};
use indexmap::{IndexMap, IndexSet};
use std::{fmt, str::FromStr};
use tracing::{debug, warn};

/// The opaque identifier of a test configuration.
///
/// The remote system may report these as numbers or strings, so they are always compared as
/// strings.
#[derive(Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct ConfigurationId(String);

impl ConfigurationId {
    /// Creates a new configuration identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConfigurationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A named environment or platform variant that test points execute under.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TestConfiguration {
    /// The configuration identifier.
    pub id: ConfigurationId,

    /// The human-readable name, unique within a project.
    pub name: String,
}

impl TestConfiguration {
    /// Creates a new configuration.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: ConfigurationId::new(id),
            name: name.into(),
        }
    }
}

/// The identifier of a test point, unique within a test plan.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct TestPointId(pub u64);

impl fmt::Display for TestPointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A test case bound to one configuration within a test plan.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TestPoint {
    /// The test point identifier.
    pub id: TestPointId,

    /// The identifier of the underlying test case.
    pub test_case_id: String,

    /// The display name of the underlying test case.
    pub test_case_name: String,

    /// The configuration this point runs under.
    pub configuration_id: ConfigurationId,

    /// The automated test name recorded on the test case, if it was loaded.
    pub automated_test_name: Option<String>,
}

impl TestPoint {
    /// Creates a new test point without an automated test name.
    pub fn new(
        id: u64,
        test_case_id: impl Into<String>,
        test_case_name: impl Into<String>,
        configuration_id: impl Into<String>,
    ) -> Self {
        Self {
            id: TestPointId(id),
            test_case_id: test_case_id.into(),
            test_case_name: test_case_name.into(),
            configuration_id: ConfigurationId::new(configuration_id),
            automated_test_name: None,
        }
    }
}

/// A test plan in the remote system.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TestPlan {
    /// The plan identifier.
    pub id: u64,

    /// The plan name.
    pub name: String,

    /// The plan's end date, if it has one.
    pub end_date: Option<DateTime<Utc>>,

    /// The identifier of the plan's root suite.
    pub root_suite_id: u64,
}

/// A user-defined shorthand that resolves to a test configuration name.
///
/// Parsed from `alias=configuration name`. Quotes around the name are stripped.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ConfigAlias {
    /// The alias.
    pub alias: String,

    /// The configuration name the alias refers to.
    pub config: String,
}

impl FromStr for ConfigAlias {
    type Err = ConfigAliasParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (alias, config) = s.split_once('=').ok_or_else(|| ConfigAliasParseError::new(s))?;
        let alias = alias.trim();
        let config = config.trim().trim_matches(['"', '\'']);
        if alias.is_empty() || config.is_empty() {
            return Err(ConfigAliasParseError::new(s));
        }

        Ok(Self {
            alias: alias.to_owned(),
            config: config.to_owned(),
        })
    }
}

/// Maps configuration ids, names and aliases to configurations.
#[derive(Clone, Debug, Default)]
pub struct ConfigRegistry {
    entries: IndexMap<String, TestConfiguration>,
}

impl ConfigRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a configuration under both its id and its name.
    pub fn register(&mut self, config: TestConfiguration) {
        self.entries
            .insert(config.id.as_str().to_owned(), config.clone());
        self.entries.insert(config.name.clone(), config);
    }

    /// Registers `alias` for the configuration named `config_name`.
    ///
    /// Registering an alias that already exists is a no-op.
    pub fn add_alias(&mut self, alias: &str, config_name: &str) -> Result<(), ContextBuildError> {
        let Some(config) = self.entries.get(config_name).cloned() else {
            return Err(ContextBuildError::UnrecognizedConfigAlias {
                alias: alias.to_owned(),
                config: config_name.to_owned(),
            });
        };

        if let Some(existing) = self.entries.get(alias) {
            warn!(
                "test configuration alias `{alias}` is already registered (for `{}`), ignoring",
                existing.name,
            );
            return Ok(());
        }

        debug!("registered test configuration alias `{alias}` for `{}`", config.name);
        self.entries.insert(alias.to_owned(), config);
        Ok(())
    }

    /// Looks up a configuration by id, name or alias.
    pub fn resolve(&self, key: &str) -> Option<&TestConfiguration> {
        self.entries.get(key)
    }

    /// Returns the configurations that test points may belong to.
    ///
    /// With a filter, only entries resolving to the filter's configuration are allowed.
    /// Otherwise every registered configuration is allowed.
    pub fn allowed(&self, filter: Option<&ConfigurationId>) -> AllowedConfigs {
        let ids = self
            .entries
            .values()
            .filter(|config| filter.is_none_or(|id| &config.id == id))
            .map(|config| config.id.clone())
            .collect();
        AllowedConfigs { ids }
    }

    /// Returns the number of registered keys (ids, names and aliases).
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// The set of configuration ids that test points are allowed to match under.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct AllowedConfigs {
    ids: IndexSet<ConfigurationId>,
}

impl AllowedConfigs {
    /// Returns true if `id` is allowed.
    pub fn contains(&self, id: &ConfigurationId) -> bool {
        self.ids.contains(id)
    }

    /// Iterates over the allowed ids.
    pub fn iter(&self) -> impl Iterator<Item = &ConfigurationId> + '_ {
        self.ids.iter()
    }
}

/// Everything a run correlates against.
#[derive(Clone, Debug)]
pub struct TestContext {
    project_id: String,
    project_name: String,
    test_plan: TestPlan,
    registry: ConfigRegistry,
    config_filter: Option<ConfigurationId>,
    test_points: Vec<TestPoint>,
}

impl TestContext {
    /// Creates a context from already-resolved parts.
    ///
    /// Most callers should use [`TestContextBuilder`] instead.
    pub fn new(
        project_id: impl Into<String>,
        project_name: impl Into<String>,
        test_plan: TestPlan,
        registry: ConfigRegistry,
        config_filter: Option<ConfigurationId>,
        test_points: Vec<TestPoint>,
    ) -> Self {
        Self {
            project_id: project_id.into(),
            project_name: project_name.into(),
            test_plan,
            registry,
            config_filter,
            test_points,
        }
    }

    /// Returns the project identifier.
    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    /// Returns the project name.
    pub fn project_name(&self) -> &str {
        &self.project_name
    }

    /// Returns the resolved test plan.
    pub fn test_plan(&self) -> &TestPlan {
        &self.test_plan
    }

    /// Returns the configuration registry.
    pub fn registry(&self) -> &ConfigRegistry {
        &self.registry
    }

    /// Returns the resolved configuration filter, if one was supplied.
    pub fn config_filter(&self) -> Option<&ConfigurationId> {
        self.config_filter.as_ref()
    }

    /// Returns the test points available for matching.
    pub fn test_points(&self) -> &[TestPoint] {
        &self.test_points
    }

    /// Returns the configurations test points are allowed to match under.
    pub fn allowed_configs(&self) -> AllowedConfigs {
        self.registry.allowed(self.config_filter.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    fn registry() -> ConfigRegistry {
        let mut registry = ConfigRegistry::new();
        registry.register(TestConfiguration::new("1", "Windows 10"));
        registry.register(TestConfiguration::new("2", "Ubuntu 22.04"));
        registry
    }

    #[test_case("win=Windows 10", "win", "Windows 10"; "plain")]
    #[test_case(" win = Windows 10 ", "win", "Windows 10"; "trimmed")]
    #[test_case("win=\"Windows 10\"", "win", "Windows 10"; "double quoted")]
    #[test_case("win='Windows 10'", "win", "Windows 10"; "single quoted")]
    #[test_case("a=b=c", "a", "b=c"; "first equals splits")]
    fn parse_alias(input: &str, alias: &str, config: &str) {
        let parsed: ConfigAlias = input.parse().expect("alias parses");
        assert_eq!(
            parsed,
            ConfigAlias {
                alias: alias.to_owned(),
                config: config.to_owned(),
            }
        );
    }

    #[test_case("Windows 10"; "no equals")]
    #[test_case("=Windows 10"; "empty alias")]
    #[test_case("win=''"; "empty name")]
    fn parse_alias_invalid(input: &str) {
        input
            .parse::<ConfigAlias>()
            .expect_err("alias should fail to parse");
    }

    #[test]
    fn registry_resolves_ids_and_names() {
        let registry = registry();
        assert_eq!(registry.len(), 4);
        assert_eq!(
            registry.resolve("1").map(|c| c.name.as_str()),
            Some("Windows 10")
        );
        assert_eq!(
            registry.resolve("Ubuntu 22.04").map(|c| c.id.as_str()),
            Some("2")
        );
        assert_eq!(registry.resolve("macOS"), None);
    }

    #[test]
    fn alias_for_unknown_config_names_it() {
        let mut registry = registry();
        let err = registry
            .add_alias("mac", "macOS 14")
            .expect_err("unknown configuration");
        assert_eq!(
            err.to_string(),
            "unrecognized config name `macOS 14` for alias `mac`"
        );
    }

    #[test]
    fn duplicate_alias_is_ignored() {
        let mut registry = registry();
        registry.add_alias("os", "Windows 10").expect("first alias");
        registry.add_alias("os", "Ubuntu 22.04").expect("second alias");
        assert_eq!(
            registry.resolve("os").map(|c| c.id.as_str()),
            Some("1"),
            "later registration is a no-op"
        );
    }

    #[test]
    fn allowed_configs_follow_filter() {
        let mut registry = registry();
        registry.add_alias("win", "Windows 10").expect("alias");

        let all = registry.allowed(None);
        assert!(all.contains(&ConfigurationId::new("1")));
        assert!(all.contains(&ConfigurationId::new("2")));

        let filtered = registry.allowed(Some(&ConfigurationId::new("1")));
        assert!(filtered.contains(&ConfigurationId::new("1")));
        assert!(!filtered.contains(&ConfigurationId::new("2")));
        assert_eq!(filtered.iter().count(), 1);
    }
}
