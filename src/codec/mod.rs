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

//! MessagePack codecs for the IPROTO wire format.
//!
//! This module defines the pluggable [`Codec`] abstraction and two
//! interchangeable implementations:
//!
//! - [`FullCodec`]: the complete type system, including the known
//!   Tarantool extension kinds (decimal, UUID, error, datetime, interval).
//! - [`LiteCodec`]: core scalars and containers only. Values it cannot
//!   encode fail with [`EncodeError::UnsupportedType`]; extension payloads
//!   it meets on decode are handled per [`ExtensionPolicy`].
//!
//! The codec is selected once, at connection construction, and used for
//! every header and body on that connection.
//!
//! # Encoding discipline
//!
//! Encoding always picks the shortest MessagePack representation that
//! round-trips the value (a `7` is one byte, never five). Decoding accepts
//! every valid width for the same logical value: decode liberally, encode
//! minimally.
//!
//! # Examples
//!
//! ```rust
//! use tarantool_client::codec::{Codec, FullCodec};
//! use tarantool_client::Value;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let codec = FullCodec;
//! let mut buf = Vec::new();
//! codec.encode(&Value::Int(7), &mut buf)?;
//! assert_eq!(buf, [0x07]); // positive fixint, minimal width
//!
//! let (value, consumed) = codec.decode(&buf)?;
//! assert_eq!(value, Value::Int(7));
//! assert_eq!(consumed, 1);
//! # Ok(())
//! # }
//! ```

mod full;
mod lite;

pub use full::FullCodec;
pub use lite::LiteCodec;

use crate::value::Value;

/// Tarantool MessagePack extension kinds this client knows about.
///
/// The set is open and versioned on the server side; these are the kinds
/// the [`FullCodec`] accepts.
pub mod ext_kind {
    /// Arbitrary-precision decimal.
    pub const DECIMAL: i8 = 1;
    /// RFC 4122 UUID, 16 bytes.
    pub const UUID: i8 = 2;
    /// Stacked error (Tarantool >= 2.4.1).
    pub const ERROR: i8 = 3;
    /// Datetime with optional timezone.
    pub const DATETIME: i8 = 4;
    /// Calendar interval.
    pub const INTERVAL: i8 = 6;
}

/// How a codec treats extension payloads it does not interpret.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExtensionPolicy {
    /// Surface the extension undecoded as [`Value::Ext`]. Default.
    #[default]
    Opaque,
    /// Fail decoding with [`DecodeError::UnsupportedExtension`].
    Strict,
}

/// Error produced when a value cannot be encoded.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EncodeError {
    /// The selected codec cannot represent this value on the wire.
    #[error("{codec} codec cannot encode {what}")]
    UnsupportedType {
        /// Codec name, as reported by [`Codec::name`].
        codec: &'static str,
        /// Human-readable description of the offending value.
        what: &'static str,
    },
}

/// Error produced when bytes cannot be decoded into a [`Value`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    /// The input ended in the middle of a value.
    #[error("input ended before the value was complete")]
    UnexpectedEof,
    /// A reserved or invalid marker byte was met.
    #[error("invalid msgpack marker 0x{0:02x}")]
    InvalidMarker(u8),
    /// A string payload was not valid UTF-8.
    #[error("string payload is not valid UTF-8")]
    InvalidUtf8,
    /// An extension kind the codec does not support.
    #[error("msgpack extension kind {0} is not supported")]
    UnsupportedExtension(i8),
    /// A decoded body did not have the shape the operation requires.
    #[error("unexpected response shape: {0}")]
    UnexpectedShape(&'static str),
}

/// Strategy interface for encoding and decoding [`Value`]s.
///
/// Implementations must be cheap to share (`Send + Sync`) because one codec
/// instance serves every request on a connection, from many tasks at once.
pub trait Codec: Send + Sync + 'static {
    /// Appends the minimal encoding of `value` to `out`.
    ///
    /// # Errors
    ///
    /// Returns [`EncodeError::UnsupportedType`] if this codec cannot
    /// represent the value.
    fn encode(&self, value: &Value, out: &mut Vec<u8>) -> Result<(), EncodeError>;

    /// Decodes one value from the front of `bytes`.
    ///
    /// Returns the value together with the number of bytes consumed, so a
    /// caller can decode several values from one bounded slice (the frame
    /// codec decodes header then body this way).
    ///
    /// # Errors
    ///
    /// Returns a [`DecodeError`] on malformed or unsupported input. The
    /// input slice is never consumed past a failed value.
    fn decode(&self, bytes: &[u8]) -> Result<(Value, usize), DecodeError>;

    /// Stable identifier for this codec, used in configuration and logs.
    fn name(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(codec: &dyn Codec, value: Value) {
        let mut buf = Vec::new();
        codec.encode(&value, &mut buf).unwrap();
        let (decoded, consumed) = codec.decode(&buf).unwrap();
        assert_eq!(decoded, value);
        assert_eq!(consumed, buf.len());
    }

    fn sample_values() -> Vec<Value> {
        vec![
            Value::Nil,
            Value::Bool(true),
            Value::Bool(false),
            Value::Int(0),
            Value::Int(127),
            Value::Int(128),
            Value::Int(-32),
            Value::Int(-33),
            Value::Int(i64::MIN),
            Value::Int(i64::MAX),
            Value::UInt(u64::MAX),
            Value::Float(1.5),
            Value::Double(-2.25),
            Value::Str(String::new()),
            Value::Str("hello".into()),
            Value::Str("x".repeat(300)),
            Value::Bin(vec![0, 1, 2, 255]),
            Value::Array(vec![Value::Int(1), Value::Str("two".into()), Value::Nil]),
            Value::Map(vec![
                (Value::Int(0), Value::Int(64)),
                (Value::Str("key".into()), Value::Array(vec![Value::Nil])),
            ]),
        ]
    }

    #[test]
    fn full_codec_roundtrips_core_values() {
        for value in sample_values() {
            roundtrip(&FullCodec, value);
        }
    }

    #[test]
    fn lite_codec_roundtrips_core_values() {
        for value in sample_values() {
            roundtrip(&LiteCodec::default(), value);
        }
    }

    #[test]
    fn full_codec_roundtrips_known_extensions() {
        roundtrip(&FullCodec, Value::Ext(ext_kind::UUID, vec![0xab; 16]));
        roundtrip(&FullCodec, Value::Ext(ext_kind::DECIMAL, vec![0x01, 0x5c]));
    }

    #[test]
    fn decoding_accepts_every_width_for_the_same_integer() {
        // 7 as fixint, uint8, uint16, uint32 and uint64.
        let encodings: [&[u8]; 5] = [
            &[0x07],
            &[0xcc, 0x07],
            &[0xcd, 0x00, 0x07],
            &[0xce, 0x00, 0x00, 0x00, 0x07],
            &[0xcf, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x07],
        ];
        for bytes in encodings {
            let (value, consumed) = FullCodec.decode(bytes).unwrap();
            assert_eq!(value, Value::Int(7));
            assert_eq!(consumed, bytes.len());
        }
    }

    #[test]
    fn encoding_is_minimal_width() {
        let cases: [(Value, &[u8]); 6] = [
            (Value::Int(127), &[0x7f]),
            (Value::Int(128), &[0xcc, 0x80]),
            (Value::Int(-32), &[0xe0]),
            (Value::Int(-33), &[0xd0, 0xdf]),
            (Value::Int(65535), &[0xcd, 0xff, 0xff]),
            (Value::Int(65536), &[0xce, 0x00, 0x01, 0x00, 0x00]),
        ];
        for (value, expected) in cases {
            let mut buf = Vec::new();
            FullCodec.encode(&value, &mut buf).unwrap();
            assert_eq!(buf, expected, "non-minimal encoding for {value:?}");
        }
    }

    #[test]
    fn lite_codec_rejects_extension_encode() {
        let mut buf = Vec::new();
        let err = LiteCodec::default()
            .encode(&Value::Ext(ext_kind::UUID, vec![0; 16]), &mut buf)
            .unwrap_err();
        assert!(matches!(err, EncodeError::UnsupportedType { codec: "lite", .. }));
        assert!(buf.is_empty());
    }

    #[test]
    fn lite_codec_extension_policy_is_caller_selectable() {
        let mut buf = Vec::new();
        FullCodec
            .encode(&Value::Ext(ext_kind::UUID, vec![0xcd; 16]), &mut buf)
            .unwrap();

        // Opaque: surfaced undecoded.
        let (value, _) = LiteCodec::default().decode(&buf).unwrap();
        assert_eq!(value, Value::Ext(ext_kind::UUID, vec![0xcd; 16]));

        // Strict: typed decoding required, so the payload is an error.
        let err = LiteCodec::new(ExtensionPolicy::Strict).decode(&buf).unwrap_err();
        assert_eq!(err, DecodeError::UnsupportedExtension(ext_kind::UUID));
    }

    #[test]
    fn full_codec_rejects_unknown_extension_kind() {
        // fixext1, kind 100.
        let err = FullCodec.decode(&[0xd4, 100, 0x00]).unwrap_err();
        assert_eq!(err, DecodeError::UnsupportedExtension(100));
    }

    #[test]
    fn truncated_input_is_an_error_not_a_panic() {
        let mut buf = Vec::new();
        FullCodec
            .encode(&Value::Str("truncate me".into()), &mut buf)
            .unwrap();
        for len in 0..buf.len() {
            let err = FullCodec.decode(&buf[..len]).unwrap_err();
            assert_eq!(err, DecodeError::UnexpectedEof, "prefix of {len} bytes");
        }
    }

    #[test]
    fn reserved_marker_is_rejected() {
        assert_eq!(
            FullCodec.decode(&[0xc1]).unwrap_err(),
            DecodeError::InvalidMarker(0xc1)
        );
    }
}
