// Copyright (c) The testplan-publish Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

#![warn(missing_docs)]

//! Machine-readable output and exit codes for `testplan-publish`.
//!
//! The types in this crate are what `testplan-publish --message-format json` writes to stdout.
//! They are kept in a separate crate so that pipelines consuming the output don't need to depend
//! on the correlation engine itself.

mod exit_codes;
mod summary;

pub use exit_codes::*;
pub use summary::*;
