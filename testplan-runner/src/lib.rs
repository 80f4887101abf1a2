// Copyright (c) The testplan-publish Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

#![warn(missing_docs)]

//! Core functionality for `testplan-publish`: correlating automated test results with the test
//! points of a test plan, and publishing them back as a test run.
//!
//! The basic flow of operations is:
//!
//! 1. [`reader`] turns framework-specific result files into
//!    [`NormalizedTestResult`](results::NormalizedTestResult)s.
//! 2. [`context::TestContextBuilder`] resolves the project, test plan, configurations and test
//!    points through a [`client::TestManagementClient`].
//! 3. [`processor::ResultProcessor`] runs the [`matching::MatchStrategyChain`] over every result
//!    and the remaining pool of test points, producing a
//!    [`CorrelationResult`](processor::CorrelationResult).
//! 4. [`publisher::RunPublisher`] creates a test run for the bound points and writes the outcomes
//!    back.

pub mod analyzer;
pub mod client;
pub mod config;
pub mod context;
pub mod errors;
mod helpers;
pub mod matching;
pub mod processor;
pub mod publisher;
pub mod reader;
pub mod results;

pub use helpers::plural;
