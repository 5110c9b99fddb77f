//
// Copyright 2026 Hans W. Uhlig. All Rights Reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//

//! Server greeting parsing.
//!
//! The first bytes a Tarantool server sends are a fixed 128-byte greeting:
//! a 64-byte banner line `Tarantool <version> (<mode>) <uuid>` and a
//! 64-byte line holding the base64-encoded random salt used by the
//! chap-sha1 challenge-response scheme.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use std::io;

/// Total greeting length in bytes, fixed by the protocol.
pub const GREETING_SIZE: usize = 128;

/// Bytes of decoded salt the scramble uses.
pub const SALT_SIZE: usize = 20;

/// Parsed server greeting.
///
/// # Example
///
/// ```rust
/// use tarantool_client::protocol::{GREETING_SIZE, Greeting};
/// use base64::Engine as _;
///
/// let mut raw = [b' '; GREETING_SIZE];
/// raw[..30].copy_from_slice(b"Tarantool 2.11.0 (Binary) abcd");
/// raw[63] = b'\n';
/// let salt = base64::engine::general_purpose::STANDARD.encode([7u8; 32]);
/// raw[64..64 + salt.len()].copy_from_slice(salt.as_bytes());
/// raw[127] = b'\n';
///
/// let greeting = Greeting::parse(&raw).unwrap();
/// assert_eq!(greeting.server_version(), "2.11.0");
/// assert_eq!(greeting.salt(), &[7u8; 20]);
/// ```
#[derive(Debug, Clone)]
pub struct Greeting {
    server_version: String,
    salt: [u8; SALT_SIZE],
}

impl Greeting {
    /// Parses the 128-byte greeting block.
    ///
    /// # Errors
    ///
    /// Returns an [`io::Error`] of kind `InvalidData` if the banner is not
    /// a Tarantool banner or the salt line does not decode. The caller
    /// (the connection handshake) reports this as a connection failure:
    /// the peer is not speaking IPROTO.
    pub fn parse(raw: &[u8; GREETING_SIZE]) -> io::Result<Self> {
        let banner = std::str::from_utf8(&raw[..64])
            .map_err(|_| invalid("greeting banner is not UTF-8"))?
            .trim_end();
        let mut words = banner.split_whitespace();
        if words.next() != Some("Tarantool") {
            return Err(invalid("peer did not send a Tarantool greeting"));
        }
        let server_version = words
            .next()
            .ok_or_else(|| invalid("greeting banner is missing the server version"))?
            .to_owned();

        let salt_line = std::str::from_utf8(&raw[64..])
            .map_err(|_| invalid("salt line is not UTF-8"))?
            .trim_end();
        let decoded = BASE64
            .decode(salt_line)
            .map_err(|_| invalid("salt line is not valid base64"))?;
        if decoded.len() < SALT_SIZE {
            return Err(invalid("decoded salt is shorter than 20 bytes"));
        }
        let mut salt = [0u8; SALT_SIZE];
        salt.copy_from_slice(&decoded[..SALT_SIZE]);

        Ok(Self {
            server_version,
            salt,
        })
    }

    /// Server version string from the banner, e.g. `2.11.0`.
    #[must_use]
    pub fn server_version(&self) -> &str {
        &self.server_version
    }

    /// The 20-byte challenge salt.
    #[must_use]
    pub fn salt(&self) -> &[u8; SALT_SIZE] {
        &self.salt
    }
}

fn invalid(msg: &str) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, msg.to_owned())
}
