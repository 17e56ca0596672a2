// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Combined status query.

use crate::command::Command;

const SYSINFO_CLAUSE: &str = r#""system":{"get_sysinfo":null}"#;
const REALTIME_CLAUSE: &str = r#""emeter":{"get_realtime":{}}"#;

/// Query for the relay state and, optionally, realtime telemetry.
///
/// Both sub-resources travel in a single request so that one round trip
/// yields a consistent view of the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StatusQuery {
    emeter: bool,
}

impl StatusQuery {
    /// Creates a query for `get_sysinfo` only.
    #[must_use]
    pub const fn sysinfo() -> Self {
        Self { emeter: false }
    }

    /// Creates a query for `get_sysinfo` and `get_realtime`.
    #[must_use]
    pub const fn with_emeter() -> Self {
        Self { emeter: true }
    }

    /// Creates a query, including telemetry when `emeter` is set.
    #[must_use]
    pub const fn new(emeter: bool) -> Self {
        Self { emeter }
    }

    /// Returns whether the `emeter` clause is included.
    #[must_use]
    pub const fn includes_emeter(&self) -> bool {
        self.emeter
    }
}

impl Command for StatusQuery {
    fn name(&self) -> &'static str {
        if self.emeter {
            "get_sysinfo+get_realtime"
        } else {
            "get_sysinfo"
        }
    }

    fn to_request(&self) -> String {
        if self.emeter {
            format!("{{{SYSINFO_CLAUSE},{REALTIME_CLAUSE}}}")
        } else {
            format!("{{{SYSINFO_CLAUSE}}}")
        }
    }
}
