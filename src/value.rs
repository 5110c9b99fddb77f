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

//! In-memory model for MessagePack values.
//!
//! [`Value`] is the self-describing value tree that the codecs in
//! [`crate::codec`] encode and decode. It mirrors the MessagePack type
//! system: nil, booleans, integers, floats, strings, binary blobs, arrays,
//! maps and extension values.
//!
//! # Integer canonicalization
//!
//! A logical integer has exactly one representation in the tree: anything
//! that fits `i64` is a [`Value::Int`], and [`Value::UInt`] is used only for
//! values above `i64::MAX`. Constructors and the decoder both maintain this,
//! so `decode(encode(v)) == v` holds structurally regardless of which wire
//! width the encoder picked.
//!
//! # Maps
//!
//! Maps are kept as ordered `(key, value)` pairs. IPROTO headers and bodies
//! key maps with small integers, not strings, so keys are full [`Value`]s
//! and insertion order is preserved rather than normalized.
//!
//! # Example
//!
//! ```rust
//! use tarantool_client::Value;
//!
//! let row = Value::Array(vec![Value::from(42), Value::from("name_42")]);
//! assert_eq!(row.as_array().unwrap()[0].as_i64(), Some(42));
//! ```

/// A decoded MessagePack value.
///
/// The variants cover the full MessagePack type system. Extension values
/// are carried as `(kind, payload)` pairs; interpreting a payload is the
/// codec's job (see [`crate::codec::ExtensionPolicy`]).
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Nil.
    Nil,
    /// Boolean.
    Bool(bool),
    /// Signed integer. Canonical variant for every value that fits `i64`.
    Int(i64),
    /// Unsigned integer above `i64::MAX`.
    UInt(u64),
    /// Single-precision float.
    Float(f32),
    /// Double-precision float.
    Double(f64),
    /// UTF-8 string.
    Str(String),
    /// Raw binary blob.
    Bin(Vec<u8>),
    /// Ordered array of values.
    Array(Vec<Value>),
    /// Ordered key/value pairs. Keys are arbitrary values.
    Map(Vec<(Value, Value)>),
    /// Extension value: a signed kind tag and an opaque payload.
    Ext(i8, Vec<u8>),
}

impl Value {
    /// Builds a canonical integer value from an unsigned integer.
    #[must_use]
    pub fn uint(v: u64) -> Self {
        if v <= i64::MAX as u64 {
            Value::Int(v as i64)
        } else {
            Value::UInt(v)
        }
    }

    /// Returns `true` if this value is nil.
    #[must_use]
    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    /// Returns the boolean payload, if this is a boolean.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the value as `i64` if it is an integer in range.
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the value as `u64` if it is a non-negative integer.
    #[must_use]
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Value::Int(v) if *v >= 0 => Some(*v as u64),
            Value::UInt(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the value as `f64` if it is a float of either width.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(v) => Some(f64::from(*v)),
            Value::Double(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the string payload, if this is a string.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the binary payload, if this is a blob.
    #[must_use]
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bin(b) => Some(b),
            _ => None,
        }
    }

    /// Returns the elements, if this is an array.
    #[must_use]
    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Returns the key/value pairs, if this is a map.
    #[must_use]
    pub fn as_map(&self) -> Option<&[(Value, Value)]> {
        match self {
            Value::Map(pairs) => Some(pairs),
            _ => None,
        }
    }

    /// Looks up a map entry by unsigned-integer key.
    ///
    /// IPROTO headers and bodies are maps keyed by small integers; this is
    /// the lookup every response decoder uses.
    #[must_use]
    pub fn get(&self, key: u64) -> Option<&Value> {
        self.as_map()?
            .iter()
            .find(|(k, _)| k.as_u64() == Some(key))
            .map(|(_, v)| v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(i64::from(v))
    }
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        Value::uint(v)
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Value::Int(i64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Double(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_owned())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Bin(v)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::Array(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(inner) => inner.into(),
            None => Value::Nil,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uint_canonicalizes_into_int_range() {
        assert_eq!(Value::uint(7), Value::Int(7));
        assert_eq!(Value::uint(u64::MAX), Value::UInt(u64::MAX));
        assert_eq!(Value::from(i64::MAX as u64), Value::Int(i64::MAX));
    }

    #[test]
    fn map_lookup_by_integer_key() {
        let map = Value::Map(vec![
            (Value::Int(0x30), Value::from("data")),
            (Value::Int(0x42), Value::Int(5)),
        ]);
        assert_eq!(map.get(0x42).and_then(Value::as_i64), Some(5));
        assert!(map.get(0x99).is_none());
    }

    #[test]
    fn accessors_reject_other_variants() {
        assert_eq!(Value::Str("x".into()).as_i64(), None);
        assert_eq!(Value::Int(-1).as_u64(), None);
        assert_eq!(Value::Int(1).as_u64(), Some(1));
        assert!(Value::Nil.is_nil());
    }
}
