// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `system.get_sysinfo` response parsing.

use serde::Deserialize;

use crate::error::{Error, ParseError};
use crate::response::check_err_code;
use crate::types::RelayState;

const SECTION: &str = "system.get_sysinfo";

/// Result of `system.get_sysinfo`.
///
/// Only `err_code` and `relay_state` drive the reconciliation; the
/// identification fields are kept for logging and are absent on some
/// firmware.
///
/// # Examples
///
/// ```
/// use kasa_relay::response::SysInfoResponse;
/// use kasa_relay::types::RelayState;
///
/// let json = r#"{"err_code":0,"relay_state":1,"alias":"Bench supply","model":"HS110(EU)"}"#;
/// let sysinfo: SysInfoResponse = serde_json::from_str(json).unwrap();
/// assert_eq!(sysinfo.relay_state().unwrap(), RelayState::On);
/// assert_eq!(sysinfo.alias.as_deref(), Some("Bench supply"));
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SysInfoResponse {
    /// Error code, 0 on success.
    #[serde(default)]
    pub err_code: i64,

    /// Device-provided error description.
    #[serde(default)]
    pub err_msg: Option<String>,

    /// Relay position (0 or 1).
    #[serde(default)]
    pub relay_state: Option<RelayState>,

    /// User-assigned device name.
    #[serde(default)]
    pub alias: Option<String>,

    /// Model string, e.g. `HS110(EU)`.
    #[serde(default)]
    pub model: Option<String>,

    /// MAC address.
    #[serde(default)]
    pub mac: Option<String>,

    /// Firmware version.
    #[serde(default)]
    pub sw_ver: Option<String>,

    /// Hardware revision.
    #[serde(default)]
    pub hw_ver: Option<String>,

    /// Seconds since the relay was last switched on.
    #[serde(default)]
    pub on_time: Option<u64>,
}

impl SysInfoResponse {
    /// Returns the relay state if the section succeeded.
    ///
    /// # Errors
    ///
    /// Returns a [`DeviceError`](crate::error::DeviceError) for a non-zero
    /// `err_code`, or [`ParseError::MissingField`] if a successful reply
    /// carries no `relay_state`.
    pub fn relay_state(&self) -> Result<RelayState, Error> {
        check_err_code(SECTION, self.err_code, self.err_msg.as_deref())?;
        self.relay_state
            .ok_or_else(|| ParseError::MissingField(format!("{SECTION}.relay_state")).into())
    }
}
