// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! TCP transport for the smart home protocol.

use std::future::Future;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use serde_json::Value;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use crate::error::{ProtocolError, ValueError};
use crate::protocol::Protocol;
use crate::protocol::frame::{self, HEADER_LEN, HeaderMode, MAX_PAYLOAD_LEN};

// ============================================================================
// DeviceTarget - Configuration for one plug
// ============================================================================

/// Configuration for a smart plug.
///
/// Holds everything needed to reach the device. The transport opens a new
/// connection for every request, so there is no connection state here.
///
/// # Examples
///
/// ```
/// use kasa_relay::protocol::{DeviceTarget, HeaderMode};
/// use std::time::Duration;
///
/// // Simple configuration
/// let target = DeviceTarget::new("192.168.1.42").unwrap();
/// assert_eq!(target.port(), 9999);
///
/// // With all options
/// let target = DeviceTarget::new("192.168.1.42")
///     .unwrap()
///     .with_port(10000)
///     .with_timeout(Duration::from_millis(250))
///     .with_emeter(true)
///     .with_header_mode(HeaderMode::Zeroed);
/// assert!(target.emeter());
///
/// // Malformed addresses are rejected
/// assert!(DeviceTarget::new("plug.local").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceTarget {
    address: IpAddr,
    port: u16,
    timeout: Duration,
    emeter: bool,
    header_mode: HeaderMode,
}

impl DeviceTarget {
    /// Port the device listens on.
    pub const DEFAULT_PORT: u16 = 9999;
    /// Default per-call timeout.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(500);

    /// Creates a configuration for the device at `address`.
    ///
    /// # Errors
    ///
    /// Returns [`ValueError::InvalidAddress`] if `address` is not an IPv4
    /// or IPv6 literal.
    pub fn new(address: &str) -> Result<Self, ValueError> {
        let ip = address
            .trim()
            .parse::<IpAddr>()
            .map_err(|_| ValueError::InvalidAddress(address.to_string()))?;
        Ok(Self::from_ip(ip))
    }

    /// Creates a configuration from an already parsed address.
    #[must_use]
    pub fn from_ip(address: IpAddr) -> Self {
        Self {
            address,
            port: Self::DEFAULT_PORT,
            timeout: Self::DEFAULT_TIMEOUT,
            emeter: false,
            header_mode: HeaderMode::default(),
        }
    }

    /// Sets a custom port.
    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Sets the per-call timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Enables or disables the telemetry query.
    #[must_use]
    pub fn with_emeter(mut self, emeter: bool) -> Self {
        self.emeter = emeter;
        self
    }

    /// Sets the outbound header mode.
    #[must_use]
    pub fn with_header_mode(mut self, mode: HeaderMode) -> Self {
        self.header_mode = mode;
        self
    }

    /// Returns the device address.
    #[must_use]
    pub fn address(&self) -> IpAddr {
        self.address
    }

    /// Returns the port.
    #[must_use]
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Returns the socket address to connect to.
    #[must_use]
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.address, self.port)
    }

    /// Returns the timeout.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Returns whether telemetry is requested.
    #[must_use]
    pub fn emeter(&self) -> bool {
        self.emeter
    }

    /// Returns the outbound header mode.
    #[must_use]
    pub fn header_mode(&self) -> HeaderMode {
        self.header_mode
    }

    /// Creates a `TcpClient` from this configuration.
    #[must_use]
    pub fn into_client(self) -> TcpClient {
        TcpClient::new(self)
    }
}

// ============================================================================
// TcpClient
// ============================================================================

/// TCP client for a single smart plug.
///
/// Each request opens a fresh connection, writes one frame, reads one
/// frame and drops the socket, whatever the outcome.
///
/// # Examples
///
/// ```no_run
/// use kasa_relay::command::StatusQuery;
/// use kasa_relay::protocol::{DeviceTarget, Protocol};
///
/// # async fn example() -> kasa_relay::Result<()> {
/// let client = DeviceTarget::new("192.168.1.42")?.into_client();
/// let response = client.send_command(&StatusQuery::sysinfo()).await?;
/// println!("{}", response["system"]["get_sysinfo"]["relay_state"]);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct TcpClient {
    target: DeviceTarget,
}

impl TcpClient {
    /// Creates a client for the given target.
    #[must_use]
    pub fn new(target: DeviceTarget) -> Self {
        Self { target }
    }

    /// Returns the target configuration.
    #[must_use]
    pub fn target(&self) -> &DeviceTarget {
        &self.target
    }

    fn timeout_ms(&self) -> u64 {
        u64::try_from(self.target.timeout.as_millis()).unwrap_or(u64::MAX)
    }

    /// Runs `future` under the configured timeout.
    async fn bounded<T>(
        &self,
        future: impl Future<Output = std::io::Result<T>>,
    ) -> Result<T, ProtocolError> {
        match tokio::time::timeout(self.target.timeout, future).await {
            Ok(result) => result.map_err(map_read_error),
            Err(_) => Err(ProtocolError::Timeout(self.timeout_ms())),
        }
    }

    async fn connect(&self) -> Result<TcpStream, ProtocolError> {
        let addr = self.target.socket_addr();
        match tokio::time::timeout(self.target.timeout, TcpStream::connect(addr)).await {
            Ok(Ok(stream)) => Ok(stream),
            Ok(Err(e)) => Err(ProtocolError::ConnectionFailed(format!("{addr}: {e}"))),
            Err(_) => Err(ProtocolError::Timeout(self.timeout_ms())),
        }
    }

    async fn read_frame(&self, stream: &mut TcpStream) -> Result<Vec<u8>, ProtocolError> {
        let mut header = [0u8; HEADER_LEN];
        self.bounded(stream.read_exact(&mut header)).await?;

        let len = frame::declared_len(header);
        if len > MAX_PAYLOAD_LEN {
            return Err(ProtocolError::MalformedResponse(format!(
                "declared payload of {len} bytes exceeds {MAX_PAYLOAD_LEN}"
            )));
        }

        if len == 0 {
            // Zeroed header: the payload ends once it decodes or the device closes.
            let payload = self.bounded(read_unframed(stream)).await?;
            if payload.len() > MAX_PAYLOAD_LEN {
                return Err(ProtocolError::MalformedResponse(format!(
                    "unframed payload exceeds {MAX_PAYLOAD_LEN} bytes"
                )));
            }
            return Ok(payload);
        }

        let mut payload = vec![0u8; len];
        self.bounded(stream.read_exact(&mut payload)).await?;
        Ok(payload)
    }
}

/// Reads until the bytes so far decode to JSON, the peer closes, or the
/// payload grows past the cap.
async fn read_unframed(stream: &mut TcpStream) -> std::io::Result<Vec<u8>> {
    let mut payload = Vec::new();
    let mut chunk = [0u8; 2048];
    loop {
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            return Ok(payload);
        }
        payload.extend_from_slice(&chunk[..n]);
        if payload.len() > MAX_PAYLOAD_LEN || frame::decode_payload(&payload).is_ok() {
            return Ok(payload);
        }
    }
}

fn map_read_error(e: std::io::Error) -> ProtocolError {
    if e.kind() == std::io::ErrorKind::UnexpectedEof {
        ProtocolError::MalformedResponse("connection closed mid-frame".to_string())
    } else {
        ProtocolError::Io(e)
    }
}

impl Protocol for TcpClient {
    async fn send_raw(&self, request: &str) -> Result<Value, ProtocolError> {
        let outbound = frame::encode(request, self.target.header_mode)?;

        tracing::debug!(host = %self.target.socket_addr(), request = %request, "Sending request");

        let mut stream = self.connect().await?;
        self.bounded(stream.write_all(&outbound)).await?;
        let payload = self.read_frame(&mut stream).await?;
        drop(stream);

        let response = frame::decode_payload(&payload)?;

        tracing::debug!(response = %response, "Received response");

        Ok(response)
    }

    fn emeter(&self) -> bool {
        self.target.emeter
    }
}
