// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `emeter.get_realtime` response parsing.

use serde::Deserialize;

use crate::error::{Error, ParseError};
use crate::response::check_err_code;
use crate::state::Telemetry;

const SECTION: &str = "emeter.get_realtime";

/// Result of `emeter.get_realtime`.
///
/// Hardware revision 1 reports V, A, W and kWh. Revision 2 reports mV, mA,
/// mW and Wh under suffixed names. Both layouts are accepted and
/// [`telemetry`](Self::telemetry) normalizes them.
///
/// # Examples
///
/// ```
/// use kasa_relay::response::RealtimeResponse;
///
/// let v2 = r#"{"voltage_mv":230120,"current_ma":412,"power_mw":87300,"total_wh":12345,"err_code":0}"#;
/// let realtime: RealtimeResponse = serde_json::from_str(v2).unwrap();
/// let telemetry = realtime.telemetry().unwrap();
/// assert!((telemetry.voltage - 230.12).abs() < 1e-9);
/// assert!((telemetry.energy - 12.345).abs() < 1e-9);
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RealtimeResponse {
    /// Error code, 0 on success.
    #[serde(default)]
    pub err_code: i64,

    /// Device-provided error description.
    #[serde(default)]
    pub err_msg: Option<String>,

    /// Voltage in Volts.
    #[serde(default)]
    pub voltage: Option<f64>,
    /// Current in Amperes.
    #[serde(default)]
    pub current: Option<f64>,
    /// Power in Watts.
    #[serde(default)]
    pub power: Option<f64>,
    /// Cumulative energy in kWh.
    #[serde(default)]
    pub total: Option<f64>,

    /// Voltage in millivolts.
    #[serde(default)]
    pub voltage_mv: Option<f64>,
    /// Current in milliamperes.
    #[serde(default)]
    pub current_ma: Option<f64>,
    /// Power in milliwatts.
    #[serde(default)]
    pub power_mw: Option<f64>,
    /// Cumulative energy in Wh.
    #[serde(default)]
    pub total_wh: Option<f64>,
}

impl RealtimeResponse {
    /// Returns the measurements if the section succeeded.
    ///
    /// # Errors
    ///
    /// Returns a [`DeviceError`](crate::error::DeviceError) for a non-zero
    /// `err_code`, or [`ParseError::MissingField`] if a measurement is
    /// absent in both unit layouts.
    pub fn telemetry(&self) -> Result<Telemetry, Error> {
        check_err_code(SECTION, self.err_code, self.err_msg.as_deref())?;
        Ok(Telemetry {
            voltage: pick("voltage", self.voltage, self.voltage_mv)?,
            current: pick("current", self.current, self.current_ma)?,
            power: pick("power", self.power, self.power_mw)?,
            energy: pick("total", self.total, self.total_wh)?,
        })
    }
}

fn pick(field: &str, base: Option<f64>, milli: Option<f64>) -> Result<f64, ParseError> {
    base.or_else(|| milli.map(|v| v / 1000.0))
        .ok_or_else(|| ParseError::MissingField(format!("{SECTION}.{field}")))
}
