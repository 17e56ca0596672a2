// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Results of a single status query.

use serde::Serialize;

use crate::types::RelayState;

/// Realtime electrical measurements from the energy meter.
///
/// Values are in V, A, W and kWh regardless of the unit the device
/// reported them in.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Telemetry {
    /// Line voltage in Volts.
    pub voltage: f64,
    /// Load current in Amperes.
    pub current: f64,
    /// Active power in Watts.
    pub power: f64,
    /// Cumulative energy in kWh.
    pub energy: f64,
}

/// What one successful status query learned about the device.
///
/// The two sub-resources succeed or fail independently: `relay_state` is
/// `None` when `system` reported an error, `telemetry` is `None` when
/// `emeter` reported an error or was not requested.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct DeviceSnapshot {
    /// Relay position reported by `get_sysinfo`.
    pub relay_state: Option<RelayState>,
    /// Measurements reported by `get_realtime`.
    pub telemetry: Option<Telemetry>,
}
