// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Wire framing: a 4-byte header followed by the encrypted JSON body.

use serde_json::Value;

use crate::error::ProtocolError;
use crate::protocol::cipher::{self, INITIAL_KEY};

/// Size of the frame header in bytes.
pub const HEADER_LEN: usize = 4;

/// Largest payload the client accepts from a device.
pub const MAX_PAYLOAD_LEN: usize = 64 * 1024;

/// Content of the 4 header bytes on outbound frames.
///
/// The header carries the big-endian payload length. Some clients send
/// zeros instead, which plugs on older firmware tolerate. Both are
/// available; [`HeaderMode::Length`] is the default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HeaderMode {
    /// Big-endian `u32` payload length.
    #[default]
    Length,
    /// Four zero bytes.
    Zeroed,
}

/// Encrypts `request` and prefixes it with a header.
///
/// # Errors
///
/// Returns [`ProtocolError::MalformedResponse`] if the request is too large
/// to describe in a `u32` header.
///
/// # Examples
///
/// ```
/// use kasa_relay::protocol::frame::{encode, HeaderMode};
///
/// let frame = encode("{}", HeaderMode::Length).unwrap();
/// assert_eq!(frame, [0, 0, 0, 2, 0xd0, 0xad]);
///
/// let zeroed = encode("{}", HeaderMode::Zeroed).unwrap();
/// assert_eq!(&zeroed[..4], &[0, 0, 0, 0]);
/// ```
pub fn encode(request: &str, mode: HeaderMode) -> Result<Vec<u8>, ProtocolError> {
    let body = cipher::encrypt(request.as_bytes(), INITIAL_KEY);
    let header = match mode {
        HeaderMode::Length => u32::try_from(body.len())
            .map_err(|_| {
                ProtocolError::MalformedResponse(format!(
                    "request of {} bytes does not fit a frame",
                    body.len()
                ))
            })?
            .to_be_bytes(),
        HeaderMode::Zeroed => [0; HEADER_LEN],
    };

    let mut frame = Vec::with_capacity(HEADER_LEN + body.len());
    frame.extend_from_slice(&header);
    frame.extend_from_slice(&body);
    Ok(frame)
}

/// Reads the payload length from a header.
#[must_use]
pub fn declared_len(header: [u8; HEADER_LEN]) -> usize {
    // u32 always fits in usize on supported targets
    u32::from_be_bytes(header) as usize
}

/// Decrypts and parses a payload with the header already removed.
///
/// # Errors
///
/// Returns [`ProtocolError::MalformedResponse`] if the payload is empty,
/// not UTF-8, or not JSON.
pub fn decode_payload(payload: &[u8]) -> Result<Value, ProtocolError> {
    if payload.is_empty() {
        return Err(ProtocolError::MalformedResponse("empty payload".to_string()));
    }

    let plain = cipher::decrypt(payload, INITIAL_KEY);
    let text = String::from_utf8(plain)
        .map_err(|e| ProtocolError::MalformedResponse(format!("payload is not UTF-8: {e}")))?;

    serde_json::from_str(&text)
        .map_err(|e| ProtocolError::MalformedResponse(format!("payload is not JSON: {e}")))
}

/// Strips the header from a complete frame and decodes the remainder.
///
/// The header content is not checked; only its presence is.
///
/// # Errors
///
/// Returns [`ProtocolError::MalformedResponse`] if the frame is shorter
/// than its header or the payload cannot be decoded.
pub fn decode(frame: &[u8]) -> Result<Value, ProtocolError> {
    let payload = frame.get(HEADER_LEN..).ok_or_else(|| {
        ProtocolError::MalformedResponse(format!(
            "frame of {} bytes is shorter than its header",
            frame.len()
        ))
    })?;
    decode_payload(payload)
}
