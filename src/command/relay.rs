// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Relay control command.

use crate::command::Command;
use crate::types::RelayState;

/// Command to switch the plug relay.
///
/// # Examples
///
/// ```
/// use kasa_relay::command::{Command, SetRelayStateCommand};
/// use kasa_relay::types::RelayState;
///
/// let off = SetRelayStateCommand::off();
/// assert_eq!(off.state(), RelayState::Off);
/// assert_eq!(off.to_request(), r#"{"system":{"set_relay_state":{"state":0}}}"#);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetRelayStateCommand {
    state: RelayState,
}

impl SetRelayStateCommand {
    /// Creates a command for the given relay state.
    #[must_use]
    pub const fn new(state: RelayState) -> Self {
        Self { state }
    }

    /// Creates a command to turn the relay on.
    #[must_use]
    pub const fn on() -> Self {
        Self::new(RelayState::On)
    }

    /// Creates a command to turn the relay off.
    #[must_use]
    pub const fn off() -> Self {
        Self::new(RelayState::Off)
    }

    /// Returns the requested state.
    #[must_use]
    pub const fn state(&self) -> RelayState {
        self.state
    }
}

impl Command for SetRelayStateCommand {
    fn name(&self) -> &'static str {
        "set_relay_state"
    }

    fn to_request(&self) -> String {
        format!(
            r#"{{"system":{{"set_relay_state":{{"state":{}}}}}}}"#,
            self.state.as_num()
        )
    }
}
