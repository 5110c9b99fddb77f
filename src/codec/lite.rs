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

//! Lightweight MessagePack codec restricted to core types.
//!
//! [`LiteCodec`] is a strict subset of [`super::FullCodec`]: scalars,
//! strings, blobs, arrays and maps. It trades extension support for lower
//! overhead. Encoding an extension value fails with
//! [`EncodeError::UnsupportedType`]; extension payloads met during decoding
//! are handled per the caller-selected [`ExtensionPolicy`].

use super::full::{ExtHandling, Reader, write_value};
use super::{Codec, DecodeError, EncodeError, ExtensionPolicy};
use crate::value::Value;

/// Codec supporting only the core scalar and container types.
#[derive(Debug, Clone, Copy, Default)]
pub struct LiteCodec {
    policy: ExtensionPolicy,
}

impl LiteCodec {
    /// Creates a lite codec with the given extension policy.
    #[must_use]
    pub fn new(policy: ExtensionPolicy) -> Self {
        Self { policy }
    }

    /// The extension policy this codec applies on decode.
    #[must_use]
    pub fn policy(&self) -> ExtensionPolicy {
        self.policy
    }
}

impl Codec for LiteCodec {
    fn encode(&self, value: &Value, out: &mut Vec<u8>) -> Result<(), EncodeError> {
        ensure_core(value)?;
        write_value(value, out);
        Ok(())
    }

    fn decode(&self, bytes: &[u8]) -> Result<(Value, usize), DecodeError> {
        let handling = match self.policy {
            ExtensionPolicy::Opaque => ExtHandling::Opaque,
            ExtensionPolicy::Strict => ExtHandling::Strict,
        };
        let mut reader = Reader::new(bytes);
        let value = reader.read_value(handling)?;
        Ok((value, reader.position()))
    }

    fn name(&self) -> &'static str {
        "lite"
    }
}

/// Verifies the tree contains no extension values before any byte is
/// written, so a failed encode leaves the output untouched.
fn ensure_core(value: &Value) -> Result<(), EncodeError> {
    match value {
        Value::Ext(..) => Err(EncodeError::UnsupportedType {
            codec: "lite",
            what: "msgpack extension values",
        }),
        Value::Array(items) => items.iter().try_for_each(ensure_core),
        Value::Map(pairs) => pairs
            .iter()
            .try_for_each(|(k, v)| ensure_core(k).and_then(|()| ensure_core(v))),
        _ => Ok(()),
    }
}
