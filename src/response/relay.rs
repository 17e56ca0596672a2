// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `system.set_relay_state` response parsing.

use serde::Deserialize;
use serde_json::Value;

use crate::error::Error;
use crate::response::{check_err_code, section};

/// Acknowledgement of `system.set_relay_state`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SetRelayStateResponse {
    /// Error code, 0 on success.
    #[serde(default)]
    pub err_code: i64,

    /// Device-provided error description.
    #[serde(default)]
    pub err_msg: Option<String>,
}

impl SetRelayStateResponse {
    /// Checks a full device reply to a relay command.
    ///
    /// # Errors
    ///
    /// Returns an error if the section is missing or reports a non-zero
    /// `err_code`.
    ///
    /// # Examples
    ///
    /// ```
    /// use kasa_relay::response::SetRelayStateResponse;
    ///
    /// let ok = serde_json::json!({"system": {"set_relay_state": {"err_code": 0}}});
    /// assert!(SetRelayStateResponse::check(&ok).is_ok());
    ///
    /// let failed = serde_json::json!({"system": {"set_relay_state": {"err_code": -2}}});
    /// assert!(SetRelayStateResponse::check(&failed).is_err());
    /// ```
    pub fn check(value: &Value) -> Result<(), Error> {
        let response: Self = section(value, "system", "set_relay_state")?;
        check_err_code(
            "system.set_relay_state",
            response.err_code,
            response.err_msg.as_deref(),
        )
    }
}
