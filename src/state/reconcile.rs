// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Desired vs observed relay state.
//!
//! Two sources can change the relay: the external enable signal (the
//! *desired* state) and the device itself, switched by its button or the
//! vendor app (the *observed* state). A fresh request on the signal wins
//! over a device-side change seen in the same cycle. Otherwise the device
//! state flows back into the signal.

use crate::types::RelayState;

/// Action chosen for one poll cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Send `set_relay_state` with this value.
    IssueCommand(RelayState),
    /// Write the device's value to the enable signal, send nothing.
    AdoptObserved(RelayState),
    /// Already converged.
    NoOp,
}

/// Compares the desired and observed relay states.
///
/// * `last_command` - last desired value the loop acted on or accepted
/// * `last_surfaced` - last device value written to the enable signal
#[must_use]
pub fn decide(
    desired: RelayState,
    observed: RelayState,
    last_command: RelayState,
    last_surfaced: RelayState,
) -> Decision {
    if desired != last_command && desired != observed {
        Decision::IssueCommand(desired)
    } else if observed != last_surfaced {
        Decision::AdoptObserved(observed)
    } else {
        Decision::NoOp
    }
}

/// Memory of the reconciliation loop between cycles.
///
/// Starts with the relay assumed off on both sides, which is also the
/// initial value of the enable signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReconciliationState {
    last_command: RelayState,
    last_surfaced: RelayState,
    observed: Option<RelayState>,
    error: bool,
}

impl ReconciliationState {
    /// Creates the initial state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Last desired value acted upon or accepted as matching the device.
    #[must_use]
    pub fn last_command(&self) -> RelayState {
        self.last_command
    }

    /// Last device value surfaced to the enable signal.
    #[must_use]
    pub fn last_surfaced(&self) -> RelayState {
        self.last_surfaced
    }

    /// Relay state from the most recent successful `system` read.
    #[must_use]
    pub fn observed(&self) -> Option<RelayState> {
        self.observed
    }

    /// Whether the current cycle has failed so far.
    #[must_use]
    pub fn error(&self) -> bool {
        self.error
    }

    /// Applies [`decide`] to this state.
    #[must_use]
    pub fn decide(&self, desired: RelayState, observed: RelayState) -> Decision {
        decide(desired, observed, self.last_command, self.last_surfaced)
    }

    /// Clears the error flag at the start of a cycle.
    pub fn begin_cycle(&mut self) {
        self.error = false;
    }

    /// Marks the current cycle as failed.
    pub fn raise_error(&mut self) {
        self.error = true;
    }

    /// Records the relay state the device just reported.
    pub fn observe(&mut self, state: RelayState) {
        self.observed = Some(state);
    }

    /// Records that the device accepted a relay command.
    pub fn command_succeeded(&mut self, state: RelayState) {
        self.last_command = state;
    }

    /// Records that the device state was written to the enable signal.
    pub fn adopt(&mut self, state: RelayState) {
        self.last_surfaced = state;
        self.last_command = state;
    }

    /// Records a converged cycle.
    ///
    /// A desired value that already matches the device counts as handled,
    /// so a later device-side change is adopted instead of reverted.
    pub fn settle(&mut self, desired: RelayState, observed: RelayState) {
        if desired == observed {
            self.last_command = desired;
        }
    }
}
