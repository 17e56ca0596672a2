// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Smart plug command definitions.
//!
//! Every request to the device is a JSON object keyed by sub-resource
//! (`system`, `emeter`) then by method name. Several methods may be batched
//! into one request; the device answers each one independently.
//!
//! # Available Commands
//!
//! | Command Type | Purpose | Request |
//! |-------------|---------|---------|
//! | [`StatusQuery`] | Relay state and optional telemetry | `get_sysinfo` (+ `get_realtime`) |
//! | [`SetRelayStateCommand`] | Switch the relay | `set_relay_state` |
//!
//! # Examples
//!
//! ```
//! use kasa_relay::command::{Command, SetRelayStateCommand, StatusQuery};
//! use kasa_relay::types::RelayState;
//!
//! let query = StatusQuery::with_emeter();
//! assert_eq!(
//!     query.to_request(),
//!     r#"{"system":{"get_sysinfo":null},"emeter":{"get_realtime":{}}}"#
//! );
//!
//! let on = SetRelayStateCommand::new(RelayState::On);
//! assert_eq!(on.to_request(), r#"{"system":{"set_relay_state":{"state":1}}}"#);
//! ```

mod relay;
mod status;

pub use relay::SetRelayStateCommand;
pub use status::StatusQuery;

/// A command that can be sent to a smart plug.
pub trait Command {
    /// Returns a short name for logging, e.g. `"get_sysinfo"`.
    fn name(&self) -> &'static str;

    /// Returns the JSON request body, before encryption.
    fn to_request(&self) -> String;
}
