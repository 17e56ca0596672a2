// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Autokey XOR stream cipher used by the smart home protocol.
//!
//! Each byte is XORed with a running key that starts at [`INITIAL_KEY`].
//! After every byte the key becomes the ciphertext byte, in both
//! directions: the encrypter sets it to the byte it just emitted, the
//! decrypter to the byte it just consumed. Feeding plaintext back into the
//! key on the decrypt side desynchronizes the stream after one byte.

/// Initial key value (`0xAB`).
pub const INITIAL_KEY: u8 = 171;

/// Encrypts `plaintext` starting from `key`.
///
/// # Examples
///
/// ```
/// use kasa_relay::protocol::cipher::{encrypt, INITIAL_KEY};
///
/// assert_eq!(encrypt(b"{}", INITIAL_KEY), vec![0xd0, 0xad]);
/// ```
#[must_use]
pub fn encrypt(plaintext: &[u8], mut key: u8) -> Vec<u8> {
    plaintext
        .iter()
        .map(|&b| {
            key ^= b;
            key
        })
        .collect()
}

/// Decrypts `ciphertext` starting from `key`.
#[must_use]
pub fn decrypt(ciphertext: &[u8], mut key: u8) -> Vec<u8> {
    ciphertext
        .iter()
        .map(|&c| {
            let plain = key ^ c;
            key = c;
            plain
        })
        .collect()
}
