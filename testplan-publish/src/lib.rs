// Copyright (c) The testplan-publish Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Publish automated test results to the test points of a test plan.
//!
//! `testplan-publish` reads the result files produced by a test framework (JUnit, xUnit, NUnit or
//! MSTest), matches each result against the test points of a test plan, and publishes the
//! matched outcomes as a test run. See the `testplan-runner` crate for the library behind it.

#![warn(missing_docs)]

mod dispatch;
mod errors;
mod output;
mod summary;

#[doc(hidden)]
pub use dispatch::*;
#[doc(hidden)]
pub use errors::*;
#[doc(hidden)]
pub use output::OutputWriter;
