// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Signals shared with the host process.
//!
//! The host exposes a read/write `enable` bit, a read-only `error` bit and
//! four numeric outputs that stay empty unless the plug is metered. [`Signals`] is the
//! interface the reconciliation loop drives; [`SignalTable`] is an
//! in-process implementation backed by a `tokio::sync::watch` channel so
//! any number of observers can follow the values.
//!
//! # Examples
//!
//! ```
//! use kasa_relay::signal::{SignalTable, Signals};
//!
//! let table = SignalTable::new();
//! let mut observer = table.subscribe();
//!
//! // The operator asks for the relay to be on.
//! table.request_enable(true);
//! assert!(table.enable());
//! assert!(observer.has_changed().unwrap());
//! ```

use std::sync::Arc;

use tokio::sync::watch;

use crate::state::Telemetry;

/// Interface between the reconciliation loop and the host.
pub trait Signals {
    /// Reads the `enable` bit.
    fn enable(&self) -> bool;

    /// Writes the `enable` bit with the device's relay state.
    fn set_enable(&mut self, value: bool);

    /// Writes the `error` bit.
    fn set_error(&mut self, value: bool);

    /// Writes the telemetry outputs.
    fn set_telemetry(&mut self, telemetry: &Telemetry);

    /// Releases host resources. Called once when the loop stops.
    fn shutdown(&mut self) {}
}

/// Current values of the host signals.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SignalValues {
    /// Desired/observed relay state.
    pub enable: bool,
    /// Whether the last poll cycle failed.
    pub error: bool,
    /// Last telemetry read, `None` until the first one or without metering.
    pub telemetry: Option<Telemetry>,
    /// Set once the loop has shut down.
    pub closed: bool,
}

/// In-process signal table.
///
/// Cloning yields another handle to the same values.
#[derive(Debug, Clone)]
pub struct SignalTable {
    tx: Arc<watch::Sender<SignalValues>>,
}

impl SignalTable {
    /// Creates a table with all bits cleared.
    #[must_use]
    pub fn new() -> Self {
        let (tx, _) = watch::channel(SignalValues::default());
        Self { tx: Arc::new(tx) }
    }

    /// Writes the `enable` bit from the host side.
    pub fn request_enable(&self, value: bool) {
        self.tx.send_if_modified(|v| replace(&mut v.enable, value));
    }

    /// Returns a copy of the current values.
    #[must_use]
    pub fn values(&self) -> SignalValues {
        *self.tx.borrow()
    }

    /// Returns a receiver notified on every change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SignalValues> {
        self.tx.subscribe()
    }
}

/// Assigns `value` and reports whether it differed.
fn replace<T: PartialEq>(slot: &mut T, value: T) -> bool {
    if *slot == value {
        false
    } else {
        *slot = value;
        true
    }
}

impl Default for SignalTable {
    fn default() -> Self {
        Self::new()
    }
}

impl Signals for SignalTable {
    fn enable(&self) -> bool {
        self.tx.borrow().enable
    }

    fn set_enable(&mut self, value: bool) {
        self.request_enable(value);
    }

    fn set_error(&mut self, value: bool) {
        self.tx.send_if_modified(|v| replace(&mut v.error, value));
    }

    fn set_telemetry(&mut self, telemetry: &Telemetry) {
        self.tx
            .send_if_modified(|v| replace(&mut v.telemetry, Some(*telemetry)));
    }

    fn shutdown(&mut self) {
        self.tx.send_if_modified(|v| replace(&mut v.closed, true));
    }
}
