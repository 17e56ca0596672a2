// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Response parsing for smart plug JSON responses.
//!
//! A response mirrors its request: `{"<module>":{"<method>":{...}}}`. Every
//! method result carries its own `err_code` (0 on success) and, on failure,
//! an optional `err_msg`. Sections are checked independently so that one
//! failing sub-resource does not hide the other.

mod realtime;
mod relay;
mod status;
mod sysinfo;

pub use realtime::RealtimeResponse;
pub use relay::SetRelayStateResponse;
pub use status::StatusResponse;
pub use sysinfo::SysInfoResponse;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{DeviceError, Error, ParseError};

/// Extracts and deserializes `value[module][method]`.
pub(crate) fn section<T: DeserializeOwned>(
    value: &Value,
    module: &str,
    method: &str,
) -> Result<T, ParseError> {
    let raw = value
        .get(module)
        .and_then(|m| m.get(method))
        .ok_or_else(|| ParseError::MissingField(format!("{module}.{method}")))?;
    T::deserialize(raw).map_err(ParseError::Json)
}

/// Turns a non-zero `err_code` into an error.
pub(crate) fn check_err_code(
    section: &'static str,
    err_code: i64,
    err_msg: Option<&str>,
) -> Result<(), Error> {
    if err_code == 0 {
        return Ok(());
    }
    Err(DeviceError::Reported {
        section,
        err_code,
        err_msg: err_msg.map(str::to_string),
    }
    .into())
}
