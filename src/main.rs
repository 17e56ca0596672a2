// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Command-line host for a single smart plug.
//!
//! Keeps the plug relay in sync with an `enable` bit that the operator
//! drives by typing `on` or `off` on stdin. Surfaced changes, errors and
//! telemetry are logged. Stops on Ctrl-C.
//!
//! # Usage
//!
//! ```bash
//! kasa-relay -n bench -a 192.168.1.42 -e
//! kasa-relay -n bench -a 192.168.1.42 --once
//! ```

use std::io::BufRead;
use std::net::IpAddr;
use std::time::Duration;

use clap::Parser;
use kasa_relay::command::StatusQuery;
use kasa_relay::error::ValueError;
use kasa_relay::protocol::{DeviceTarget, HeaderMode, Protocol};
use kasa_relay::reconciler::Reconciler;
use kasa_relay::response::StatusResponse;
use kasa_relay::signal::{SignalTable, SignalValues};
use kasa_relay::types::RelayState;
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

/// Keep a TP-Link HS100/HS110 smart plug relay in sync with an enable signal.
#[derive(Parser, Debug)]
#[command(name = "kasa-relay")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Component name used in log output
    #[arg(short, long)]
    name: String,

    /// Target IP address
    #[arg(short, long, value_name = "IP")]
    address: IpAddr,

    /// Value update interval in seconds
    #[arg(short, long, default_value = "0.5", value_parser = parse_seconds)]
    interval: Duration,

    /// Allowed network delay before timeout, in seconds
    #[arg(short, long, default_value = "0.5", value_parser = parse_seconds)]
    timeout: Duration,

    /// Enable the energy meter (HS110 only)
    #[arg(short, long)]
    emeter: bool,

    /// Device TCP port
    #[arg(long, default_value_t = DeviceTarget::DEFAULT_PORT)]
    port: u16,

    /// Send zeroed frame headers instead of the payload length
    #[arg(long)]
    zero_header: bool,

    /// Query the device once, print the result as JSON and exit
    #[arg(long)]
    once: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn parse_seconds(s: &str) -> Result<Duration, ValueError> {
    s.trim()
        .parse::<f64>()
        .ok()
        .filter(|secs| *secs > 0.0)
        .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
        .ok_or_else(|| ValueError::InvalidDuration(s.to_string()))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let header_mode = if cli.zero_header {
        HeaderMode::Zeroed
    } else {
        HeaderMode::Length
    };
    let target = DeviceTarget::from_ip(cli.address)
        .with_port(cli.port)
        .with_timeout(cli.timeout)
        .with_emeter(cli.emeter)
        .with_header_mode(header_mode);

    if cli.once {
        return query_once(target).await;
    }

    let emeter = target.emeter();
    let signals = SignalTable::new();
    spawn_stdin_reader(signals.clone());
    tokio::spawn(log_changes(cli.name.clone(), signals.subscribe()));

    tracing::info!(
        component = %cli.name,
        device = %target.socket_addr(),
        interval = ?cli.interval,
        timeout = ?cli.timeout,
        emeter,
        "Starting component"
    );

    let mut reconciler =
        Reconciler::new(target.into_client(), signals).with_period(cli.interval);
    reconciler.run(wait_for_interrupt()).await;

    tracing::info!(component = %cli.name, "Exiting component");
    Ok(())
}

async fn query_once(target: DeviceTarget) -> Result<(), Box<dyn std::error::Error>> {
    let emeter = target.emeter();
    let client = target.into_client();
    let value = client.send_command(&StatusQuery::new(emeter)).await?;
    let status = StatusResponse::from_value(&value, emeter);
    for e in status.errors() {
        tracing::warn!(error = %e, "Status section failed");
    }
    println!("{}", serde_json::to_string_pretty(&status.snapshot())?);
    Ok(())
}

async fn wait_for_interrupt() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Cannot listen for Ctrl-C, running until killed");
        std::future::pending::<()>().await;
    }
}

/// Reads `on`/`off` lines from stdin on a plain thread so that a pending
/// read never holds the runtime open at exit.
fn spawn_stdin_reader(signals: SignalTable) {
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if line.trim().is_empty() {
                continue;
            }
            match line.parse::<RelayState>() {
                Ok(state) => signals.request_enable(state.is_on()),
                Err(e) => tracing::warn!(error = %e, "Expected on/off"),
            }
        }
    });
}

async fn log_changes(name: String, mut rx: watch::Receiver<SignalValues>) {
    while rx.changed().await.is_ok() {
        let values = *rx.borrow_and_update();
        match values.telemetry {
            Some(t) => tracing::info!(
                component = %name,
                enable = values.enable,
                error = values.error,
                voltage = t.voltage,
                current = t.current,
                power = t.power,
                energy = t.energy,
                "Signals updated"
            ),
            None => tracing::info!(
                component = %name,
                enable = values.enable,
                error = values.error,
                "Signals updated"
            ),
        }
        if values.closed {
            break;
        }
    }
}
