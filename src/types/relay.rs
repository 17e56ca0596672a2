// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Relay state type.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValueError;

/// Position of the plug relay.
///
/// The device encodes the relay as an integer: `0` for off, `1` for on.
/// The external enable signal is a plain `bool`; conversions exist in
/// both directions.
///
/// # Examples
///
/// ```
/// use kasa_relay::types::RelayState;
///
/// assert_eq!(RelayState::from(true), RelayState::On);
/// assert_eq!(RelayState::Off.as_num(), 0);
/// assert!(RelayState::On.is_on());
/// assert_eq!("on".parse::<RelayState>().unwrap(), RelayState::On);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum RelayState {
    /// Relay is open, no power delivered.
    #[default]
    Off,
    /// Relay is closed.
    On,
}

impl RelayState {
    /// Returns the numeric value used on the wire.
    #[must_use]
    pub const fn as_num(self) -> u8 {
        match self {
            Self::Off => 0,
            Self::On => 1,
        }
    }

    /// Returns `true` if the relay is on.
    #[must_use]
    pub const fn is_on(self) -> bool {
        matches!(self, Self::On)
    }

    /// Returns the opposite state.
    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::Off => Self::On,
            Self::On => Self::Off,
        }
    }

    /// Returns the display string.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Off => "OFF",
            Self::On => "ON",
        }
    }
}

impl fmt::Display for RelayState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RelayState {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "OFF" | "0" | "FALSE" => Ok(Self::Off),
            "ON" | "1" | "TRUE" => Ok(Self::On),
            _ => Err(ValueError::InvalidRelayState(s.to_string())),
        }
    }
}

impl From<bool> for RelayState {
    fn from(value: bool) -> Self {
        if value { Self::On } else { Self::Off }
    }
}

impl From<RelayState> for bool {
    fn from(value: RelayState) -> Self {
        value.is_on()
    }
}

impl From<RelayState> for u8 {
    fn from(value: RelayState) -> Self {
        value.as_num()
    }
}

impl TryFrom<u8> for RelayState {
    type Error = ValueError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Off),
            1 => Ok(Self::On),
            other => Err(ValueError::InvalidRelayState(other.to_string())),
        }
    }
}
