// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for the `kasa_relay` library.
//!
//! This module provides the error hierarchy for every way a poll cycle can
//! fail: configuration validation, transport communication, response
//! parsing, and error codes reported by the device itself.

use thiserror::Error;

/// The main error type for this library.
///
/// This enum encompasses all possible errors that can occur when talking
/// to a smart plug.
#[derive(Debug, Error)]
pub enum Error {
    /// Error occurred during value validation.
    #[error("value error: {0}")]
    Value(#[from] ValueError),

    /// Error occurred during transport communication.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Error occurred while interpreting a decrypted response.
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// The device answered but reported a failure.
    #[error("device error: {0}")]
    Device(#[from] DeviceError),
}

impl Error {
    /// Returns `true` if the error is a transport timeout.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Protocol(ProtocolError::Timeout(_)))
    }
}

/// Errors related to configuration values.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValueError {
    /// The device address is not a well-formed IP address.
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    /// A relay state value other than 0 or 1 was provided.
    #[error("invalid relay state: {0}")]
    InvalidRelayState(String),

    /// A duration argument is negative, NaN, or zero where not allowed.
    #[error("invalid duration: {0}")]
    InvalidDuration(String),
}

/// Errors related to the TCP transport and wire framing.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Connection to the device failed.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// Request timed out.
    #[error("request timed out after {0} ms")]
    Timeout(u64),

    /// Writing the request or reading the response failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The response could not be decoded into JSON.
    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

/// Errors related to interpreting a decoded response.
#[derive(Debug, Error)]
pub enum ParseError {
    /// JSON does not match the expected structure.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// Expected section is missing from the response.
    #[error("missing field in response: {0}")]
    MissingField(String),
}

/// Errors reported by the device for one sub-resource.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DeviceError {
    /// A non-zero `err_code` was returned.
    #[error("{section} reported err_code {err_code}{}", message_suffix(.err_msg))]
    Reported {
        /// The sub-resource method that failed, e.g. `system.get_sysinfo`.
        section: &'static str,
        /// The code returned by the device.
        err_code: i64,
        /// Optional human-readable message from the device.
        err_msg: Option<String>,
    },
}

fn message_suffix(err_msg: &Option<String>) -> String {
    err_msg
        .as_deref()
        .map(|m| format!(" ({m})"))
        .unwrap_or_default()
}

/// A specialized Result type for this library.
pub type Result<T> = std::result::Result<T, Error>;
