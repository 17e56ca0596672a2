// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Value types for smart plug control.
//!
//! - [`RelayState`] - On/Off position of the plug relay, carried as `0|1` on the wire

mod relay;

pub use relay::RelayState;
