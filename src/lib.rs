// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `kasa_relay` - Keep a TP-Link smart plug relay in sync with an enable signal.
//!
//! This library talks to HS100/HS110 plugs over their local TCP protocol
//! (port 9999, autokey XOR cipher, 4-byte framed JSON) and runs a polling
//! loop that reconciles the plug's relay with an external `enable` bit.
//!
//! # Supported Features
//!
//! - **Relay control**: read and switch the relay with `get_sysinfo` / `set_relay_state`
//! - **Energy monitoring**: voltage, current, power and total energy (HS110)
//! - **Reconciliation**: host requests win over device-side changes seen in
//!   the same cycle; device-side changes otherwise flow back to the host
//! - **Partial failures**: `system` and `emeter` error codes are handled
//!   independently
//!
//! # Quick Start
//!
//! ## One-shot status query
//!
//! ```no_run
//! use kasa_relay::command::StatusQuery;
//! use kasa_relay::protocol::{DeviceTarget, Protocol};
//! use kasa_relay::response::StatusResponse;
//!
//! #[tokio::main]
//! async fn main() -> kasa_relay::Result<()> {
//!     let client = DeviceTarget::new("192.168.1.42")?.into_client();
//!     let value = client.send_command(&StatusQuery::with_emeter()).await?;
//!     let status = StatusResponse::from_value(&value, true);
//!     println!("{:?}", status.snapshot());
//!     Ok(())
//! }
//! ```
//!
//! ## Reconciliation loop
//!
//! ```no_run
//! use kasa_relay::protocol::DeviceTarget;
//! use kasa_relay::reconciler::Reconciler;
//! use kasa_relay::signal::SignalTable;
//!
//! #[tokio::main]
//! async fn main() -> kasa_relay::Result<()> {
//!     let target = DeviceTarget::new("192.168.1.42")?;
//!     let signals = SignalTable::new();
//!     let mut reconciler = Reconciler::new(target.into_client(), signals.clone());
//!
//!     signals.request_enable(true);
//!     reconciler
//!         .run(async {
//!             let _ = tokio::signal::ctrl_c().await;
//!         })
//!         .await;
//!     Ok(())
//! }
//! ```

pub mod command;
pub mod error;
pub mod protocol;
pub mod reconciler;
pub mod response;
pub mod signal;
pub mod state;
pub mod types;

pub use command::{Command, SetRelayStateCommand, StatusQuery};
pub use error::{DeviceError, Error, ParseError, ProtocolError, Result, ValueError};
pub use protocol::{DeviceTarget, HeaderMode, Protocol, TcpClient};
pub use reconciler::{CycleReport, Reconciler};
pub use response::{RealtimeResponse, SetRelayStateResponse, StatusResponse, SysInfoResponse};
pub use signal::{SignalTable, SignalValues, Signals};
pub use state::{Decision, DeviceSnapshot, ReconciliationState, Telemetry};
pub use types::RelayState;
