// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Integration tests for the TCP transport against a fake plug on localhost.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use kasa_relay::command::{SetRelayStateCommand, StatusQuery};
use kasa_relay::error::ProtocolError;
use kasa_relay::protocol::cipher::{INITIAL_KEY, decrypt, encrypt};
use kasa_relay::protocol::frame;
use kasa_relay::protocol::{DeviceTarget, HeaderMode, Protocol, TcpClient};
use kasa_relay::reconciler::Reconciler;
use kasa_relay::response::StatusResponse;
use kasa_relay::signal::{SignalTable, Signals};
use kasa_relay::state::{Decision, Telemetry};
use kasa_relay::types::RelayState;
use parking_lot::Mutex;
use serde_json::{Value, json};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

// ============================================================================
// Fixtures
// ============================================================================

/// Reply of an HS110 (hardware 1.0) to the combined status query,
/// length header included.
const HS110_STATUS_FRAME: &str = concat!(
    "0000012ad0f281f88bff9af7d5ef94b6d1b4c09fec95e68fe187e8caf08ba9daadf284e193b18ba998b684aa9fbffd88",
    "e18de9c9f8cffeccfdceeebcd9b59baa9aab9eac9fbd91b3dbacf385e092b08aa899b787a589abc6a9cda8c4e6dcfeb6",
    "e5d4e5d5fdb8edc4e6cae889e58ced9ebc86a4e683ed8ee6c6b5c0b0c0acd5f7dbf98bee82e39ac5b6c2a3d7b290aa9b",
    "b795fa94cbbfd6bbdefcc6f5c3f3c3efcda0c1a280ba98ad9da7e4d3e9abedd7e7d7edddedd7e7d6f4d8fa9fed9fc0a3",
    "cca8cdefd5e598e5c9eb8ee386f297e5c7fd86a4c3a6d28dff9afb97e38ae782a09ae1c3a0d5a7d5b0deaa88b282ac98",
    "a99bb795e38ce094f592f7d5efddefd6f8c0eccebed1a6c3b193a991a688bb97b5c1aedabbd7f5cffecce2d1e5d0fcde",
    "bbc9bbe487e88ce9cbf1c1bcc1bc",
);

fn from_hex(hex: &str) -> Vec<u8> {
    (0..hex.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&hex[i..i + 2], 16).unwrap())
        .collect()
}

fn length_frame(body: &[u8]) -> Vec<u8> {
    let mut frame = u32::try_from(body.len()).unwrap().to_be_bytes().to_vec();
    frame.extend_from_slice(body);
    frame
}

fn json_frame(value: &Value) -> Vec<u8> {
    length_frame(&encrypt(value.to_string().as_bytes(), INITIAL_KEY))
}

// ============================================================================
// Fake plug
// ============================================================================

/// What the fake plug sends back for one request.
enum Reply {
    /// Bytes written as-is, then the connection is closed.
    Bytes(Vec<u8>),
    /// Bytes written as-is, then the connection is held open.
    BytesThenHold(Vec<u8>),
    /// Nothing is written and the connection is held open.
    Silent,
}

/// A request as received by the fake plug.
#[derive(Debug, Clone)]
struct Received {
    header: [u8; 4],
    body: String,
}

type Handler = dyn Fn(&str, &mut u8) -> Reply + Send + Sync;

struct FakePlug {
    addr: SocketAddr,
    relay: Arc<Mutex<u8>>,
    received: Arc<Mutex<Vec<Received>>>,
}

impl FakePlug {
    async fn start(handler: impl Fn(&str, &mut u8) -> Reply + Send + Sync + 'static) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let relay = Arc::new(Mutex::new(0u8));
        let received = Arc::new(Mutex::new(Vec::new()));
        let handler: Arc<Handler> = Arc::new(handler);

        let (relay_task, received_task) = (relay.clone(), received.clone());
        tokio::spawn(async move {
            loop {
                let Ok((stream, _)) = listener.accept().await else {
                    return;
                };
                let handler = handler.clone();
                let relay = relay_task.clone();
                let received = received_task.clone();
                tokio::spawn(async move {
                    serve(stream, handler, relay, received).await;
                });
            }
        });

        Self {
            addr,
            relay,
            received,
        }
    }

    /// A plug that answers status queries and relay commands.
    async fn smart_plug() -> Self {
        Self::start(|request, relay| {
            let request: Value = serde_json::from_str(request).unwrap();
            if let Some(state) = request["system"]["set_relay_state"]["state"].as_u64() {
                *relay = u8::try_from(state).unwrap();
                return Reply::Bytes(json_frame(
                    &json!({"system": {"set_relay_state": {"err_code": 0}}}),
                ));
            }
            let mut reply = json!({
                "system": {"get_sysinfo": {"err_code": 0, "relay_state": *relay, "alias": "fake"}}
            });
            if request.get("emeter").is_some() {
                reply["emeter"] = json!({"get_realtime": {
                    "err_code": 0, "voltage_mv": 230_000, "current_ma": 100,
                    "power_mw": 23_000, "total_wh": 1_500
                }});
            }
            Reply::Bytes(json_frame(&reply))
        })
        .await
    }

    fn target(&self) -> DeviceTarget {
        DeviceTarget::from_ip(self.addr.ip())
            .with_port(self.addr.port())
            .with_timeout(Duration::from_millis(500))
    }

    fn client(&self) -> TcpClient {
        self.target().into_client()
    }

    fn relay(&self) -> u8 {
        *self.relay.lock()
    }

    fn set_relay(&self, state: u8) {
        *self.relay.lock() = state;
    }

    fn received(&self) -> Vec<Received> {
        self.received.lock().clone()
    }
}

async fn serve(
    mut stream: TcpStream,
    handler: Arc<Handler>,
    relay: Arc<Mutex<u8>>,
    received: Arc<Mutex<Vec<Received>>>,
) {
    let mut header = [0u8; 4];
    if stream.read_exact(&mut header).await.is_err() {
        return;
    }

    // Accumulate until the body decrypts to JSON; works for both header modes.
    let mut body = Vec::new();
    let mut chunk = [0u8; 1024];
    let request = loop {
        let Ok(n) = stream.read(&mut chunk).await else {
            return;
        };
        if n == 0 {
            return;
        }
        body.extend_from_slice(&chunk[..n]);
        let plain = String::from_utf8(decrypt(&body, INITIAL_KEY)).unwrap_or_default();
        if serde_json::from_str::<Value>(&plain).is_ok() {
            break plain;
        }
    };

    received.lock().push(Received {
        header,
        body: request.clone(),
    });

    let reply = {
        let mut relay = relay.lock();
        handler(&request, &mut *relay)
    };
    match reply {
        Reply::Bytes(bytes) => {
            let _ = stream.write_all(&bytes).await;
        }
        Reply::BytesThenHold(bytes) => {
            let _ = stream.write_all(&bytes).await;
            tokio::time::sleep(Duration::from_secs(10)).await;
        }
        Reply::Silent => {
            tokio::time::sleep(Duration::from_secs(10)).await;
        }
    }
}

// ============================================================================
// Transport tests
// ============================================================================

mod transport {
    use super::*;

    #[tokio::test]
    async fn decodes_recorded_device_response() {
        let plug = FakePlug::start(|_, _| Reply::Bytes(from_hex(HS110_STATUS_FRAME))).await;

        let value = plug
            .client()
            .send_command(&StatusQuery::with_emeter())
            .await
            .unwrap();
        let status = StatusResponse::from_value(&value, true);

        assert!(status.is_ok());
        let snapshot = status.snapshot();
        assert_eq!(snapshot.relay_state, Some(RelayState::On));
        let telemetry = snapshot.telemetry.unwrap();
        assert!((telemetry.voltage - 229.8).abs() < 1e-9);
        assert!((telemetry.current - 0.412).abs() < 1e-9);
        assert!((telemetry.power - 87.3).abs() < 1e-9);
        assert!((telemetry.energy - 12.345).abs() < 1e-9);
        assert_eq!(
            status.sysinfo.unwrap().model.as_deref(),
            Some("HS110(EU)")
        );
    }

    #[test]
    fn recorded_frame_decodes_offline() {
        let bytes = from_hex(HS110_STATUS_FRAME);
        assert_eq!(frame::declared_len([bytes[0], bytes[1], bytes[2], bytes[3]]), 298);

        let value = frame::decode(&bytes).unwrap();
        assert_eq!(value["system"]["get_sysinfo"]["alias"], "Bench supply");
        assert_eq!(value["emeter"]["get_realtime"]["total"], 12.345);
    }

    #[tokio::test]
    async fn sends_length_header_by_default() {
        let plug = FakePlug::smart_plug().await;

        plug.client()
            .send_command(&StatusQuery::sysinfo())
            .await
            .unwrap();

        let received = plug.received();
        assert_eq!(received.len(), 1);
        assert_eq!(received[0].body, r#"{"system":{"get_sysinfo":null}}"#);
        assert_eq!(received[0].header, [0, 0, 0, 31]);
    }

    #[tokio::test]
    async fn sends_zeroed_header_when_configured() {
        let plug = FakePlug::smart_plug().await;
        let client = plug
            .target()
            .with_header_mode(HeaderMode::Zeroed)
            .into_client();

        let value = client
            .send_command(&SetRelayStateCommand::on())
            .await
            .unwrap();

        assert_eq!(value["system"]["set_relay_state"]["err_code"], 0);
        assert_eq!(plug.received()[0].header, [0, 0, 0, 0]);
        assert_eq!(plug.relay(), 1);
    }

    #[tokio::test]
    async fn new_connection_per_request() {
        let plug = FakePlug::smart_plug().await;
        let client = plug.client();

        for _ in 0..3 {
            client.send_command(&StatusQuery::sysinfo()).await.unwrap();
        }

        assert_eq!(plug.received().len(), 3);
    }

    #[tokio::test]
    async fn reads_unframed_reply_until_close() {
        let body = encrypt(
            br#"{"system":{"get_sysinfo":{"err_code":0,"relay_state":0}}}"#,
            INITIAL_KEY,
        );
        let plug = FakePlug::start(move |_, _| {
            let mut bytes = vec![0, 0, 0, 0];
            bytes.extend_from_slice(&body);
            Reply::Bytes(bytes)
        })
        .await;

        let value = plug
            .client()
            .send_command(&StatusQuery::sysinfo())
            .await
            .unwrap();
        assert_eq!(value["system"]["get_sysinfo"]["relay_state"], 0);
    }

    #[tokio::test]
    async fn unframed_reply_completes_without_close() {
        let body = encrypt(
            br#"{"system":{"get_sysinfo":{"err_code":0,"relay_state":1}}}"#,
            INITIAL_KEY,
        );
        let plug = FakePlug::start(move |_, _| {
            let mut bytes = vec![0, 0, 0, 0];
            bytes.extend_from_slice(&body);
            Reply::BytesThenHold(bytes)
        })
        .await;

        let value = plug
            .client()
            .send_command(&StatusQuery::sysinfo())
            .await
            .unwrap();
        assert_eq!(value["system"]["get_sysinfo"]["relay_state"], 1);
    }

    #[tokio::test]
    async fn connection_refused() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = DeviceTarget::from_ip(addr.ip())
            .with_port(addr.port())
            .into_client();
        let err = client.send_raw("{}").await.unwrap_err();

        assert!(matches!(err, ProtocolError::ConnectionFailed(_)), "{err:?}");
    }

    #[tokio::test]
    async fn silent_device_times_out() {
        let plug = FakePlug::start(|_, _| Reply::Silent).await;
        let client = plug
            .target()
            .with_timeout(Duration::from_millis(100))
            .into_client();

        let err = client
            .send_command(&StatusQuery::sysinfo())
            .await
            .unwrap_err();

        assert!(matches!(err, ProtocolError::Timeout(100)), "{err:?}");
    }

    #[tokio::test]
    async fn garbage_is_malformed() {
        let plug = FakePlug::start(|_, _| {
            Reply::Bytes(length_frame(&encrypt(b"<html>", INITIAL_KEY)))
        })
        .await;

        let err = plug
            .client()
            .send_command(&StatusQuery::sysinfo())
            .await
            .unwrap_err();

        assert!(matches!(err, ProtocolError::MalformedResponse(_)), "{err:?}");
    }

    #[tokio::test]
    async fn truncated_frame_is_malformed() {
        let plug = FakePlug::start(|_, _| {
            let mut bytes = vec![0, 0, 0, 100];
            bytes.extend_from_slice(&encrypt(b"{\"sys", INITIAL_KEY));
            Reply::Bytes(bytes)
        })
        .await;

        let err = plug
            .client()
            .send_command(&StatusQuery::sysinfo())
            .await
            .unwrap_err();

        assert!(matches!(err, ProtocolError::MalformedResponse(_)), "{err:?}");
    }

    #[tokio::test]
    async fn oversized_declared_length_is_malformed() {
        let plug = FakePlug::start(|_, _| Reply::Bytes(vec![0x7f, 0xff, 0xff, 0xff, 0xd0])).await;

        let err = plug
            .client()
            .send_command(&StatusQuery::sysinfo())
            .await
            .unwrap_err();

        assert!(err.to_string().contains("exceeds"), "{err}");
    }
}

// ============================================================================
// Reconciliation against the fake plug
// ============================================================================

mod reconciliation {
    use super::*;

    #[tokio::test]
    async fn host_request_switches_plug() {
        let plug = FakePlug::smart_plug().await;
        let signals = SignalTable::new();
        let mut reconciler = Reconciler::new(plug.client(), signals.clone());

        signals.request_enable(true);
        let report = reconciler.run_cycle().await;

        assert_eq!(report.decision, Some(Decision::IssueCommand(RelayState::On)));
        assert!(!report.error);
        assert_eq!(plug.relay(), 1);
        assert!(!signals.values().error);
    }

    #[tokio::test]
    async fn hand_toggle_reflects_into_signal() {
        let plug = FakePlug::smart_plug().await;
        let signals = SignalTable::new();
        let client = plug.target().with_emeter(true).into_client();
        let mut reconciler = Reconciler::new(client, signals.clone());

        assert_eq!(reconciler.run_cycle().await.decision, Some(Decision::NoOp));

        plug.set_relay(1);
        let report = reconciler.run_cycle().await;

        assert_eq!(report.decision, Some(Decision::AdoptObserved(RelayState::On)));
        assert!(signals.enable());
        assert_eq!(
            signals.values().telemetry,
            Some(Telemetry {
                voltage: 230.0,
                current: 0.1,
                power: 23.0,
                energy: 1.5,
            })
        );
        // Adoption never writes to the device.
        assert!(
            plug.received()
                .iter()
                .all(|r| !r.body.contains("set_relay_state"))
        );
    }

    #[tokio::test]
    async fn telemetry_query_follows_target() {
        let plug = FakePlug::smart_plug().await;
        let signals = SignalTable::new();

        let mut plain = Reconciler::new(plug.client(), signals.clone());
        plain.run_cycle().await;
        assert!(signals.values().telemetry.is_none());

        let client = plug.target().with_emeter(true).into_client();
        let mut metered = Reconciler::new(client, signals.clone());
        let report = metered.run_cycle().await;

        assert!(report.snapshot.unwrap().telemetry.is_some());
        assert!(signals.values().telemetry.is_some());
        let received = plug.received();
        assert!(!received[0].body.contains("emeter"));
        assert!(received[1].body.contains("get_realtime"));
    }

    #[tokio::test]
    async fn unreachable_plug_raises_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = DeviceTarget::from_ip(addr.ip())
            .with_port(addr.port())
            .into_client();
        let signals = SignalTable::new();
        let mut reconciler = Reconciler::new(client, signals.clone());

        let report = reconciler.run_cycle().await;

        assert!(report.error);
        assert!(signals.values().error);
        assert_eq!(report.decision, None);
    }

    #[tokio::test]
    async fn run_stops_on_shutdown_and_closes_signals() {
        let plug = FakePlug::smart_plug().await;
        let signals = SignalTable::new();
        let mut reconciler = Reconciler::new(plug.client(), signals.clone())
            .with_period(Duration::from_millis(20));

        signals.request_enable(true);
        reconciler
            .run(tokio::time::sleep(Duration::from_millis(100)))
            .await;

        assert_eq!(plug.relay(), 1);
        assert!(signals.values().closed);
        let commands = plug
            .received()
            .iter()
            .filter(|r| r.body.contains("set_relay_state"))
            .count();
        assert_eq!(commands, 1);
    }
}
