// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Polling loop that keeps the plug relay and the host signals in sync.
//!
//! Each cycle queries the device once, optionally sends one relay command,
//! and publishes the result to the host. Cycles never overlap. Failures are
//! level-triggered: they raise the `error` signal for the cycle in which
//! they happen and the next cycle simply tries again.
//!
//! # Examples
//!
//! ```no_run
//! use std::time::Duration;
//!
//! use kasa_relay::protocol::DeviceTarget;
//! use kasa_relay::reconciler::Reconciler;
//! use kasa_relay::signal::SignalTable;
//!
//! # async fn example() -> kasa_relay::Result<()> {
//! let target = DeviceTarget::new("192.168.1.42")?.with_emeter(true);
//! let signals = SignalTable::new();
//!
//! let mut reconciler = Reconciler::new(target.into_client(), signals.clone())
//!     .with_period(Duration::from_millis(500));
//!
//! signals.request_enable(true);
//! reconciler.run(async { tokio::signal::ctrl_c().await.ok(); }).await;
//! # Ok(())
//! # }
//! ```

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;

use crate::command::{SetRelayStateCommand, StatusQuery};
use crate::error::Error;
use crate::protocol::Protocol;
use crate::response::{SetRelayStateResponse, StatusResponse, SysInfoResponse};
use crate::signal::Signals;
use crate::state::{Decision, DeviceSnapshot, ReconciliationState};
use crate::types::RelayState;

/// Outcome of one poll cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CycleReport {
    /// Values read from the device, `None` if the query itself failed.
    pub snapshot: Option<DeviceSnapshot>,
    /// Action taken, `None` if the cycle failed before the command phase.
    pub decision: Option<Decision>,
    /// Error flag published for this cycle.
    pub error: bool,
}

/// Reconciliation loop for one plug.
#[derive(Debug)]
pub struct Reconciler<P, S> {
    protocol: P,
    signals: S,
    query: StatusQuery,
    period: Duration,
    state: ReconciliationState,
    identified: bool,
}

impl<P: Protocol, S: Signals> Reconciler<P, S> {
    /// Default polling period.
    pub const DEFAULT_PERIOD: Duration = Duration::from_millis(500);

    /// Creates a loop polling through `protocol` and driving `signals`.
    ///
    /// Telemetry is queried when [`Protocol::emeter`] says so.
    #[must_use]
    pub fn new(protocol: P, signals: S) -> Self {
        let query = StatusQuery::new(protocol.emeter());
        Self {
            protocol,
            signals,
            query,
            period: Self::DEFAULT_PERIOD,
            state: ReconciliationState::new(),
            identified: false,
        }
    }

    /// Sets the target cycle period.
    #[must_use]
    pub fn with_period(mut self, period: Duration) -> Self {
        self.period = period;
        self
    }

    /// Returns the target cycle period.
    #[must_use]
    pub fn period(&self) -> Duration {
        self.period
    }

    /// Returns the reconciliation state.
    #[must_use]
    pub fn state(&self) -> &ReconciliationState {
        &self.state
    }

    /// Returns the transport.
    #[must_use]
    pub fn protocol(&self) -> &P {
        &self.protocol
    }

    /// Returns the host signals.
    #[must_use]
    pub fn signals(&self) -> &S {
        &self.signals
    }

    /// Returns the host signals mutably.
    pub fn signals_mut(&mut self) -> &mut S {
        &mut self.signals
    }

    /// Runs cycles until `shutdown` completes, then shuts the signals down.
    ///
    /// Cancellation is only observed between cycles; a request in flight
    /// runs to completion or to its own timeout first. Nothing is sent to
    /// the device on shutdown.
    pub async fn run(&mut self, shutdown: impl Future<Output = ()>) {
        tokio::pin!(shutdown);

        loop {
            let started = Instant::now();
            self.run_cycle().await;

            let pause = self.period.saturating_sub(started.elapsed());
            tokio::select! {
                biased;
                () = &mut shutdown => break,
                () = tokio::time::sleep(pause) => {}
            }
        }

        tracing::info!("Reconciliation loop stopped");
        self.signals.shutdown();
    }

    /// Runs a single poll cycle.
    pub async fn run_cycle(&mut self) -> CycleReport {
        self.state.begin_cycle();

        let snapshot = self.poll_status().await;

        let decision = match snapshot.and_then(|s| s.relay_state) {
            Some(observed) if !self.state.error() => Some(self.reconcile(observed).await),
            _ => None,
        };

        if let Some(telemetry) = snapshot.and_then(|s| s.telemetry) {
            self.signals.set_telemetry(&telemetry);
        }
        self.signals.set_error(self.state.error());

        tracing::debug!(
            decision = ?decision,
            error = self.state.error(),
            "Poll cycle complete"
        );

        CycleReport {
            snapshot,
            decision,
            error: self.state.error(),
        }
    }

    async fn poll_status(&mut self) -> Option<DeviceSnapshot> {
        let value = match self.protocol.send_command(&self.query).await {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(error = %e, "Status query failed");
                self.state.raise_error();
                return None;
            }
        };

        let status = StatusResponse::from_value(&value, self.query.includes_emeter());
        for e in status.errors() {
            tracing::warn!(error = %e, "Status section failed");
            self.state.raise_error();
        }

        if !self.identified
            && let Some(sysinfo) = &status.sysinfo
        {
            log_identity(sysinfo);
            self.identified = true;
        }

        let snapshot = status.snapshot();
        if let Some(observed) = snapshot.relay_state {
            self.state.observe(observed);
        }
        Some(snapshot)
    }

    async fn reconcile(&mut self, observed: RelayState) -> Decision {
        let desired = RelayState::from(self.signals.enable());
        let decision = self.state.decide(desired, observed);

        match decision {
            Decision::IssueCommand(target) => match self.set_relay_state(target).await {
                Ok(()) => {
                    tracing::info!(state = %target, "Relay switched");
                    self.state.command_succeeded(target);
                }
                Err(e) => {
                    tracing::warn!(
                        state = %target,
                        timeout = e.is_timeout(),
                        error = %e,
                        "Relay command failed"
                    );
                    self.state.raise_error();
                }
            },
            Decision::AdoptObserved(state) => {
                tracing::info!(state = %state, "Adopting relay state reported by device");
                self.signals.set_enable(state.is_on());
                self.state.adopt(state);
            }
            Decision::NoOp => self.state.settle(desired, observed),
        }

        decision
    }

    async fn set_relay_state(&self, state: RelayState) -> Result<(), Error> {
        let response = self
            .protocol
            .send_command(&SetRelayStateCommand::new(state))
            .await?;
        SetRelayStateResponse::check(&response)
    }
}

fn log_identity(sysinfo: &SysInfoResponse) {
    tracing::info!(
        alias = sysinfo.alias.as_deref().unwrap_or("-"),
        model = sysinfo.model.as_deref().unwrap_or("-"),
        mac = sysinfo.mac.as_deref().unwrap_or("-"),
        sw_ver = sysinfo.sw_ver.as_deref().unwrap_or("-"),
        hw_ver = sysinfo.hw_ver.as_deref().unwrap_or("-"),
        on_time = ?sysinfo.on_time,
        "Device identified"
    );
}
