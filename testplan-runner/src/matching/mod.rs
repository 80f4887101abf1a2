// Copyright (c) The testplan-publish Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Strategies that decide whether a test result belongs to a test point.
//!
//! Each [`MatchStrategy`] classifies a (result, point) pair as [`MatchVerdict::Fail`],
//! [`MatchVerdict::None`] or [`MatchVerdict::Exact`]. A [`MatchStrategyChain`] evaluates
//! strategies in a fixed order and stops at the first verdict that isn't `None`.

use crate::{
    context::{AllowedConfigs, ConfigRegistry, TestContext, TestPoint},
    errors::{MatchStrategyParseError, ProcessorBuildError},
    results::NormalizedTestResult,
};
use bitflags::bitflags;
use regex::Regex;
use std::{fmt, str::FromStr};

/// The verdict of a single strategy for a (result, point) pair.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum MatchVerdict {
    /// The pair is rejected and no further strategies run.
    Fail,

    /// The strategy does not apply; the next strategy decides.
    None,

    /// The pair is accepted and no further strategies run.
    Exact,
}

bitflags! {
    /// The set of user-selectable match strategies.
    ///
    /// The configuration filter is always active and isn't part of this set.
    #[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
    pub struct MatchStrategySet: u32 {
        /// Match on the normalized test case name.
        const NAME = 2;
        /// Match on a test case id extracted from the result name with a regex.
        const REGEX = 4;
        /// Match on a test case id carried in a result property.
        const PROPERTY = 8;
        /// Match on the automated test name recorded on the test case.
        const VSPROPERTY = 16;
        /// Name, regex and property matching.
        const AUTO = Self::NAME.bits() | Self::REGEX.bits() | Self::PROPERTY.bits();
    }
}

impl MatchStrategySet {
    /// No user-selectable strategies.
    pub const NONE: Self = Self::empty();

    /// Returns the accepted strategy names.
    pub fn variants() -> &'static [&'static str] {
        &["none", "name", "regex", "property", "vsproperty", "auto"]
    }

    fn from_token(token: &str) -> Option<Self> {
        let set = match token {
            "none" => Self::NONE,
            "name" => Self::NAME,
            "regex" => Self::REGEX,
            "property" => Self::PROPERTY,
            "vsproperty" => Self::VSPROPERTY,
            "auto" => Self::AUTO,
            _ => return None,
        };
        Some(set)
    }
}

impl Default for MatchStrategySet {
    fn default() -> Self {
        Self::AUTO
    }
}

impl FromStr for MatchStrategySet {
    type Err = MatchStrategyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut set = Self::NONE;
        let mut any = false;
        for token in s.split(',').map(str::trim).filter(|t| !t.is_empty()) {
            let flags = Self::from_token(&token.to_ascii_lowercase())
                .ok_or_else(|| MatchStrategyParseError::new(token))?;
            set |= flags;
            any = true;
        }

        if any {
            Ok(set)
        } else {
            Err(MatchStrategyParseError::new(s))
        }
    }
}

impl fmt::Display for MatchStrategySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("none");
        }
        if *self == Self::AUTO {
            return f.write_str("auto");
        }

        let names = [
            (Self::NAME, "name"),
            (Self::REGEX, "regex"),
            (Self::PROPERTY, "property"),
            (Self::VSPROPERTY, "vsproperty"),
        ];
        let mut first = true;
        for (flag, name) in names {
            if self.contains(flag) {
                if !first {
                    f.write_str(",")?;
                }
                f.write_str(name)?;
                first = false;
            }
        }
        Ok(())
    }
}

/// Inputs to [`MatchStrategyChain::build`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MatchParameters {
    /// The strategies to enable.
    pub strategies: MatchStrategySet,

    /// The result property carrying a test case id.
    pub test_case_property: String,

    /// The regex that extracts a test case id from a result name. Empty disables regex
    /// matching.
    pub test_case_regex: String,

    /// The result property carrying a configuration id, name or alias.
    pub test_config_property: String,

    /// The result property whose value may also match the test case name.
    pub description_property: String,
}

impl Default for MatchParameters {
    fn default() -> Self {
        Self {
            strategies: MatchStrategySet::AUTO,
            test_case_property: "TestCase".to_owned(),
            test_case_regex: r"(\d+)".to_owned(),
            test_config_property: "Config".to_owned(),
            description_property: "Description".to_owned(),
        }
    }
}

/// One predicate in a [`MatchStrategyChain`].
#[derive(Clone, Debug)]
pub enum MatchStrategy {
    /// Rejects points outside the allowed configurations, and points whose configuration
    /// disagrees with the result's configuration tag.
    Config {
        /// The configurations points may belong to.
        allowed: AllowedConfigs,

        /// Resolves configuration tags (ids, names or aliases).
        registry: ConfigRegistry,

        /// The result property carrying the configuration tag.
        property: String,
    },

    /// Accepts a point whose normalized name is a suffix of the normalized result name.
    Name {
        /// The result property that may equal the point name instead.
        description_property: String,
    },

    /// Accepts a point whose test case id equals the id extracted from the result name.
    Regex {
        /// The id extraction regex.
        regex: Regex,
    },

    /// Accepts a point whose automated test name equals the result name.
    AutomationName,

    /// Accepts a point whose test case id equals a result property.
    Property {
        /// The result property carrying a test case id.
        property: String,
    },
}

impl MatchStrategy {
    /// Classifies a (result, point) pair.
    pub fn is_match(&self, result: &NormalizedTestResult, point: &TestPoint) -> MatchVerdict {
        match self {
            Self::Config {
                allowed,
                registry,
                property,
            } => {
                if !allowed.contains(&point.configuration_id) {
                    return MatchVerdict::Fail;
                }
                match result.property(property) {
                    Some(tag) => match registry.resolve(tag) {
                        Some(config) if config.id == point.configuration_id => MatchVerdict::None,
                        _ => MatchVerdict::Fail,
                    },
                    None => MatchVerdict::None,
                }
            }
            Self::Name {
                description_property,
            } => {
                let point_name = normalize_name(&point.test_case_name);
                // Every name ends with the empty string.
                if point_name.is_empty() {
                    return MatchVerdict::None;
                }
                if normalize_name(&result.name).ends_with(&point_name) {
                    return MatchVerdict::Exact;
                }
                match result.property(description_property) {
                    Some(description) if normalize_name(description) == point_name => {
                        MatchVerdict::Exact
                    }
                    _ => MatchVerdict::None,
                }
            }
            Self::Regex { regex } => {
                let Some(captures) = regex.captures(&result.name) else {
                    return MatchVerdict::None;
                };
                // Use the first capture group, or the whole match for a regex without groups.
                let id = captures.get(1).or_else(|| captures.get(0));
                match id {
                    Some(id) if id.as_str() == point.test_case_id => MatchVerdict::Exact,
                    _ => MatchVerdict::Fail,
                }
            }
            Self::AutomationName => match &point.automated_test_name {
                Some(name) if name.to_lowercase() == result.name.to_lowercase() => {
                    MatchVerdict::Exact
                }
                Some(_) => MatchVerdict::Fail,
                None => MatchVerdict::None,
            },
            Self::Property { property } => match result.property(property) {
                Some(id) if !id.is_empty() && id == point.test_case_id => MatchVerdict::Exact,
                _ => MatchVerdict::Fail,
            },
        }
    }

    /// Returns a short name for this strategy, used in diagnostics.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Config { .. } => "config",
            Self::Name { .. } => "name",
            Self::Regex { .. } => "regex",
            Self::AutomationName => "vsproperty",
            Self::Property { .. } => "property",
        }
    }
}

/// Lower-cases a name and treats `_`, `-` and space as the same separator.
fn normalize_name(name: &str) -> String {
    name.to_lowercase()
        .chars()
        .map(|c| if matches!(c, '_' | '-' | ' ') { '_' } else { c })
        .collect()
}

/// An ordered sequence of [`MatchStrategy`]s.
///
/// The configuration filter always comes first, followed by the selected strategies in the
/// order name, regex, automation name, property.
#[derive(Clone, Debug)]
pub struct MatchStrategyChain {
    strategies: Vec<MatchStrategy>,
}

impl MatchStrategyChain {
    /// Builds the chain for `params` against `context`.
    pub fn build(
        params: &MatchParameters,
        context: &TestContext,
    ) -> Result<Self, ProcessorBuildError> {
        let allowed = context.allowed_configs();
        if let Some(filter) = context.config_filter()
            && !allowed.contains(filter)
        {
            return Err(ProcessorBuildError::UnknownConfigFilter {
                filter: filter.to_string(),
            });
        }

        let mut strategies = vec![MatchStrategy::Config {
            allowed,
            registry: context.registry().clone(),
            property: params.test_config_property.clone(),
        }];

        if params.strategies.contains(MatchStrategySet::NAME) {
            strategies.push(MatchStrategy::Name {
                description_property: params.description_property.clone(),
            });
        }
        if params.strategies.contains(MatchStrategySet::REGEX) && !params.test_case_regex.is_empty()
        {
            let regex = Regex::new(&params.test_case_regex).map_err(|err| {
                ProcessorBuildError::InvalidRegex {
                    regex: params.test_case_regex.clone(),
                    err: Box::new(err),
                }
            })?;
            strategies.push(MatchStrategy::Regex { regex });
        }
        if params.strategies.contains(MatchStrategySet::VSPROPERTY) {
            strategies.push(MatchStrategy::AutomationName);
        }
        if params.strategies.contains(MatchStrategySet::PROPERTY) {
            strategies.push(MatchStrategy::Property {
                property: params.test_case_property.clone(),
            });
        }

        Ok(Self { strategies })
    }

    /// Creates a chain from an explicit list of strategies.
    pub fn from_strategies(strategies: Vec<MatchStrategy>) -> Self {
        Self { strategies }
    }

    /// Returns the strategies in evaluation order.
    pub fn strategies(&self) -> &[MatchStrategy] {
        &self.strategies
    }

    /// Returns the first verdict that isn't [`MatchVerdict::None`], or `None` if every
    /// strategy was inconclusive.
    pub fn evaluate(&self, result: &NormalizedTestResult, point: &TestPoint) -> MatchVerdict {
        self.strategies
            .iter()
            .map(|strategy| strategy.is_match(result, point))
            .find(|verdict| *verdict != MatchVerdict::None)
            .unwrap_or(MatchVerdict::None)
    }

    /// Returns true if the chain's combined verdict for the pair is [`MatchVerdict::Exact`].
    pub fn is_match(&self, result: &NormalizedTestResult, point: &TestPoint) -> bool {
        self.evaluate(result, point) == MatchVerdict::Exact
    }
}
