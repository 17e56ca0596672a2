// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device and reconciliation state types.
//!
//! [`DeviceSnapshot`] is what one status query returned. The
//! [`ReconciliationState`] is the loop's memory between cycles, and
//! [`decide`] is the rule that compares the desired relay state with the
//! observed one.
//!
//! # Examples
//!
//! ```
//! use kasa_relay::state::{Decision, ReconciliationState};
//! use kasa_relay::types::RelayState;
//!
//! let state = ReconciliationState::new();
//!
//! // The operator asks for ON while the plug is OFF: command it.
//! assert_eq!(
//!     state.decide(RelayState::On, RelayState::Off),
//!     Decision::IssueCommand(RelayState::On)
//! );
//!
//! // Nobody asked for anything but the plug was switched on by hand.
//! assert_eq!(
//!     state.decide(RelayState::Off, RelayState::On),
//!     Decision::AdoptObserved(RelayState::On)
//! );
//! ```

mod reconcile;
mod snapshot;

pub use reconcile::{Decision, ReconciliationState, decide};
pub use snapshot::{DeviceSnapshot, Telemetry};
