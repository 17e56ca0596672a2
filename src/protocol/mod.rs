// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Protocol implementation for communicating with smart plugs.
//!
//! The device speaks JSON over TCP port 9999. Every message is encrypted
//! with an autokey XOR cipher ([`cipher`]) and prefixed with a 4-byte
//! header ([`frame`]). [`TcpClient`] performs one request per connection.
//!
//! The [`Protocol`] trait is the seam between the reconciliation loop and
//! the network; tests substitute scripted implementations.

pub mod cipher;
pub mod frame;
mod tcp;

pub use frame::HeaderMode;
pub use tcp::{DeviceTarget, TcpClient};

use serde_json::Value;

use crate::command::Command;
use crate::error::ProtocolError;

/// Trait for transports that can send commands to a smart plug.
#[allow(async_fn_in_trait)]
pub trait Protocol {
    /// Sends a command to the device and returns the decoded response.
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError` if the command fails to send or receive, or
    /// the response is not JSON.
    async fn send_command<C: Command + Sync>(&self, command: &C) -> Result<Value, ProtocolError> {
        tracing::debug!(command = command.name(), "Sending command");
        self.send_raw(&command.to_request()).await
    }

    /// Sends a raw JSON request to the device.
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError` if the request fails.
    async fn send_raw(&self, request: &str) -> Result<Value, ProtocolError>;

    /// Returns whether status queries should include the energy meter.
    fn emeter(&self) -> bool {
        false
    }
}
