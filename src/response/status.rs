// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Combined status response parsing.

use serde_json::Value;

use crate::error::Error;
use crate::response::{RealtimeResponse, SysInfoResponse, section};
use crate::state::{DeviceSnapshot, Telemetry};
use crate::types::RelayState;

/// Reply to a [`StatusQuery`](crate::command::StatusQuery), split by
/// sub-resource.
///
/// Each half keeps its own outcome. A failing `emeter` section leaves
/// `relay` usable and the other way round.
///
/// # Examples
///
/// ```
/// use kasa_relay::response::StatusResponse;
/// use kasa_relay::types::RelayState;
///
/// let value = serde_json::json!({
///     "system": {"get_sysinfo": {"err_code": 0, "relay_state": 1}},
///     "emeter": {"get_realtime": {"err_code": -1, "err_msg": "module not support"}}
/// });
/// let status = StatusResponse::from_value(&value, true);
/// assert_eq!(status.relay.as_ref().unwrap(), &RelayState::On);
/// assert!(status.telemetry.unwrap().is_err());
/// ```
#[derive(Debug)]
pub struct StatusResponse {
    /// Outcome of `system.get_sysinfo`.
    pub relay: Result<RelayState, Error>,
    /// Outcome of `emeter.get_realtime`, `None` when not requested.
    pub telemetry: Option<Result<Telemetry, Error>>,
    /// Raw sysinfo section, when it could be parsed.
    pub sysinfo: Option<SysInfoResponse>,
}

impl StatusResponse {
    /// Splits a decoded reply into its sub-resource outcomes.
    #[must_use]
    pub fn from_value(value: &Value, emeter: bool) -> Self {
        let (relay, sysinfo) = match section::<SysInfoResponse>(value, "system", "get_sysinfo") {
            Ok(info) => (info.relay_state(), Some(info)),
            Err(e) => (Err(e.into()), None),
        };

        let telemetry = emeter.then(|| {
            section::<RealtimeResponse>(value, "emeter", "get_realtime")
                .map_err(Error::from)
                .and_then(|realtime| realtime.telemetry())
        });

        Self {
            relay,
            telemetry,
            sysinfo,
        }
    }

    /// Returns `true` if every requested sub-resource succeeded.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.relay.is_ok() && self.telemetry.as_ref().is_none_or(Result::is_ok)
    }

    /// Returns the errors of the failed sub-resources.
    pub fn errors(&self) -> impl Iterator<Item = &Error> {
        self.relay
            .as_ref()
            .err()
            .into_iter()
            .chain(self.telemetry.as_ref().and_then(|t| t.as_ref().err()))
    }

    /// Returns the successfully read values.
    #[must_use]
    pub fn snapshot(&self) -> DeviceSnapshot {
        DeviceSnapshot {
            relay_state: self.relay.as_ref().ok().copied(),
            telemetry: self
                .telemetry
                .as_ref()
                .and_then(|t| t.as_ref().ok().copied()),
        }
    }
}
