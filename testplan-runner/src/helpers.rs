// Copyright (c) The testplan-publish Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! General support code for testplan-runner.

use swrite::{SWrite, swrite};

/// Utilities for pluralizing various words based on count or plurality.
pub mod plural {
    /// Returns "result" if `count` is 1, otherwise "results".
    pub fn results_str(count: usize) -> &'static str {
        if count == 1 { "result" } else { "results" }
    }

    /// Returns "test point" if `count` is 1, otherwise "test points".
    pub fn points_str(count: usize) -> &'static str {
        if count == 1 {
            "test point"
        } else {
            "test points"
        }
    }

    /// Returns "file" if `count` is 1, otherwise "files".
    pub fn files_str(count: usize) -> &'static str {
        if count == 1 { "file" } else { "files" }
    }

    /// Returns "attachment" if `count` is 1, otherwise "attachments".
    pub fn attachments_str(count: usize) -> &'static str {
        if count == 1 {
            "attachment"
        } else {
            "attachments"
        }
    }

    /// Returns "configuration" if `count` is 1, otherwise "configurations".
    pub fn configurations_str(count: usize) -> &'static str {
        if count == 1 {
            "configuration"
        } else {
            "configurations"
        }
    }
}

/// Percent-encodes a single URL path segment.
///
/// Project names are user-facing and may contain spaces or other reserved characters.
pub(crate) fn encode_path_segment(segment: &str) -> String {
    let mut out = String::with_capacity(segment.len());
    for byte in segment.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' => {
                out.push(byte as char)
            }
            _ => {
                swrite!(out, "%{byte:02X}");
            }
        }
    }
    out
}
