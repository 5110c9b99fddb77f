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

//! The chap-sha1 challenge-response scramble.
//!
//! No plaintext password ever crosses the wire. The client proves
//! knowledge of the password by combining it with the random salt from the
//! greeting:
//!
//! ```text
//! step1    = sha1(password)
//! step2    = sha1(step1)
//! step3    = sha1(salt[..20] ++ step2)
//! scramble = step1 xor step3
//! ```
//!
//! The construction must match this exactly for interoperability; the
//! server computes the same value from its stored `sha1(sha1(password))`.

use super::greeting::SALT_SIZE;
use sha1::{Digest, Sha1};

/// Size of the scramble in bytes (one SHA-1 digest).
pub const SCRAMBLE_SIZE: usize = 20;

/// Computes the chap-sha1 scramble for `password` under `salt`.
#[must_use]
pub fn scramble(salt: &[u8; SALT_SIZE], password: &str) -> [u8; SCRAMBLE_SIZE] {
    let step1: [u8; SCRAMBLE_SIZE] = Sha1::digest(password.as_bytes()).into();
    let step2: [u8; SCRAMBLE_SIZE] = Sha1::digest(step1).into();

    let mut hasher = Sha1::new();
    hasher.update(salt);
    hasher.update(step2);
    let step3: [u8; SCRAMBLE_SIZE] = hasher.finalize().into();

    let mut out = step1;
    for (byte, mask) in out.iter_mut().zip(step3) {
        *byte ^= mask;
    }
    out
}
