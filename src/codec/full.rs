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

//! Full-featured MessagePack codec.
//!
//! [`FullCodec`] implements the complete wire format, including the
//! Tarantool extension kinds listed in [`super::ext_kind`]. The byte-level
//! reader and writer live here and are shared with [`super::LiteCodec`],
//! which layers its restrictions on top.

use super::{Codec, DecodeError, EncodeError, ext_kind};
use crate::value::Value;

/// Codec supporting the complete value model, extensions included.
///
/// Extension payloads with a known kind tag decode to [`Value::Ext`];
/// an unknown tag fails with [`DecodeError::UnsupportedExtension`] rather
/// than being silently dropped or coerced.
#[derive(Debug, Clone, Copy, Default)]
pub struct FullCodec;

impl Codec for FullCodec {
    fn encode(&self, value: &Value, out: &mut Vec<u8>) -> Result<(), EncodeError> {
        write_value(value, out);
        Ok(())
    }

    fn decode(&self, bytes: &[u8]) -> Result<(Value, usize), DecodeError> {
        let mut reader = Reader::new(bytes);
        let value = reader.read_value(ExtHandling::KnownKinds)?;
        Ok((value, reader.position()))
    }

    fn name(&self) -> &'static str {
        "full"
    }
}

/// Extension-decoding behavior, chosen by the owning codec.
#[derive(Debug, Clone, Copy)]
pub(super) enum ExtHandling {
    /// Accept the kinds in [`ext_kind`], reject everything else.
    KnownKinds,
    /// Surface any extension undecoded.
    Opaque,
    /// Reject every extension.
    Strict,
}

/// Appends the minimal-width encoding of `value` to `out`.
///
/// Total: every [`Value`] has a representation in the full format.
pub(super) fn write_value(value: &Value, out: &mut Vec<u8>) {
    match value {
        Value::Nil => out.push(0xc0),
        Value::Bool(false) => out.push(0xc2),
        Value::Bool(true) => out.push(0xc3),
        Value::Int(v) => write_int(*v, out),
        // Canonical UInt is always above i64::MAX, which only uint64 holds.
        Value::UInt(v) => {
            out.push(0xcf);
            out.extend_from_slice(&v.to_be_bytes());
        }
        Value::Float(v) => {
            out.push(0xca);
            out.extend_from_slice(&v.to_be_bytes());
        }
        Value::Double(v) => {
            out.push(0xcb);
            out.extend_from_slice(&v.to_be_bytes());
        }
        Value::Str(s) => {
            let len = s.len();
            if len < 32 {
                out.push(0xa0 | len as u8);
            } else if len <= u8::MAX as usize {
                out.push(0xd9);
                out.push(len as u8);
            } else if len <= u16::MAX as usize {
                out.push(0xda);
                out.extend_from_slice(&(len as u16).to_be_bytes());
            } else {
                out.push(0xdb);
                out.extend_from_slice(&(len as u32).to_be_bytes());
            }
            out.extend_from_slice(s.as_bytes());
        }
        Value::Bin(b) => {
            let len = b.len();
            if len <= u8::MAX as usize {
                out.push(0xc4);
                out.push(len as u8);
            } else if len <= u16::MAX as usize {
                out.push(0xc5);
                out.extend_from_slice(&(len as u16).to_be_bytes());
            } else {
                out.push(0xc6);
                out.extend_from_slice(&(len as u32).to_be_bytes());
            }
            out.extend_from_slice(b);
        }
        Value::Array(items) => {
            let len = items.len();
            if len < 16 {
                out.push(0x90 | len as u8);
            } else if len <= u16::MAX as usize {
                out.push(0xdc);
                out.extend_from_slice(&(len as u16).to_be_bytes());
            } else {
                out.push(0xdd);
                out.extend_from_slice(&(len as u32).to_be_bytes());
            }
            for item in items {
                write_value(item, out);
            }
        }
        Value::Map(pairs) => {
            let len = pairs.len();
            if len < 16 {
                out.push(0x80 | len as u8);
            } else if len <= u16::MAX as usize {
                out.push(0xde);
                out.extend_from_slice(&(len as u16).to_be_bytes());
            } else {
                out.push(0xdf);
                out.extend_from_slice(&(len as u32).to_be_bytes());
            }
            for (key, val) in pairs {
                write_value(key, out);
                write_value(val, out);
            }
        }
        Value::Ext(kind, data) => {
            match data.len() {
                1 => out.push(0xd4),
                2 => out.push(0xd5),
                4 => out.push(0xd6),
                8 => out.push(0xd7),
                16 => out.push(0xd8),
                len if len <= u8::MAX as usize => {
                    out.push(0xc7);
                    out.push(len as u8);
                }
                len if len <= u16::MAX as usize => {
                    out.push(0xc8);
                    out.extend_from_slice(&(len as u16).to_be_bytes());
                }
                len => {
                    out.push(0xc9);
                    out.extend_from_slice(&(len as u32).to_be_bytes());
                }
            }
            out.push(*kind as u8);
            out.extend_from_slice(data);
        }
    }
}

fn write_int(v: i64, out: &mut Vec<u8>) {
    if v >= 0 {
        // Non-negative integers use the unsigned family, matching what
        // the server emits.
        let v = v as u64;
        if v < 0x80 {
            out.push(v as u8);
        } else if v <= u8::MAX as u64 {
            out.push(0xcc);
            out.push(v as u8);
        } else if v <= u16::MAX as u64 {
            out.push(0xcd);
            out.extend_from_slice(&(v as u16).to_be_bytes());
        } else if v <= u32::MAX as u64 {
            out.push(0xce);
            out.extend_from_slice(&(v as u32).to_be_bytes());
        } else {
            out.push(0xcf);
            out.extend_from_slice(&v.to_be_bytes());
        }
    } else if v >= -32 {
        out.push(v as u8);
    } else if v >= i8::MIN as i64 {
        out.push(0xd0);
        out.push(v as u8);
    } else if v >= i16::MIN as i64 {
        out.push(0xd1);
        out.extend_from_slice(&(v as i16).to_be_bytes());
    } else if v >= i32::MIN as i64 {
        out.push(0xd2);
        out.extend_from_slice(&(v as i32).to_be_bytes());
    } else {
        out.push(0xd3);
        out.extend_from_slice(&v.to_be_bytes());
    }
}

/// Incremental MessagePack reader over a byte slice.
///
/// Never reads past a failed value; [`Reader::position`] reports exactly
/// how many bytes a successful value consumed.
pub(super) struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    pub(super) fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub(super) fn position(&self) -> usize {
        self.pos
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], DecodeError> {
        if self.buf.len() - self.pos < n {
            return Err(DecodeError::UnexpectedEof);
        }
        let slice = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn take_u8(&mut self) -> Result<u8, DecodeError> {
        Ok(self.take(1)?[0])
    }

    fn take_u16(&mut self) -> Result<u16, DecodeError> {
        Ok(u16::from_be_bytes(self.take(2)?.try_into().unwrap()))
    }

    fn take_u32(&mut self) -> Result<u32, DecodeError> {
        Ok(u32::from_be_bytes(self.take(4)?.try_into().unwrap()))
    }

    fn take_u64(&mut self) -> Result<u64, DecodeError> {
        Ok(u64::from_be_bytes(self.take(8)?.try_into().unwrap()))
    }

    fn read_str(&mut self, len: usize) -> Result<Value, DecodeError> {
        let bytes = self.take(len)?;
        let s = std::str::from_utf8(bytes).map_err(|_| DecodeError::InvalidUtf8)?;
        Ok(Value::Str(s.to_owned()))
    }

    fn read_array(&mut self, len: usize, ext: ExtHandling) -> Result<Value, DecodeError> {
        let mut items = Vec::with_capacity(len.min(4096));
        for _ in 0..len {
            items.push(self.read_value(ext)?);
        }
        Ok(Value::Array(items))
    }

    fn read_map(&mut self, len: usize, ext: ExtHandling) -> Result<Value, DecodeError> {
        let mut pairs = Vec::with_capacity(len.min(4096));
        for _ in 0..len {
            let key = self.read_value(ext)?;
            let val = self.read_value(ext)?;
            pairs.push((key, val));
        }
        Ok(Value::Map(pairs))
    }

    fn read_ext(&mut self, len: usize, handling: ExtHandling) -> Result<Value, DecodeError> {
        let kind = self.take_u8()? as i8;
        let data = self.take(len)?.to_vec();
        match handling {
            ExtHandling::Opaque => Ok(Value::Ext(kind, data)),
            ExtHandling::Strict => Err(DecodeError::UnsupportedExtension(kind)),
            ExtHandling::KnownKinds => match kind {
                ext_kind::DECIMAL
                | ext_kind::UUID
                | ext_kind::ERROR
                | ext_kind::DATETIME
                | ext_kind::INTERVAL => Ok(Value::Ext(kind, data)),
                other => Err(DecodeError::UnsupportedExtension(other)),
            },
        }
    }

    /// Decodes one value, accepting any valid width for scalars and
    /// lengths.
    pub(super) fn read_value(&mut self, ext: ExtHandling) -> Result<Value, DecodeError> {
        let marker = self.take_u8()?;
        match marker {
            0x00..=0x7f => Ok(Value::Int(i64::from(marker))),
            0xe0..=0xff => Ok(Value::Int(i64::from(marker as i8))),
            0x80..=0x8f => self.read_map((marker & 0x0f) as usize, ext),
            0x90..=0x9f => self.read_array((marker & 0x0f) as usize, ext),
            0xa0..=0xbf => {
                let len = (marker & 0x1f) as usize;
                self.read_str(len)
            }
            0xc0 => Ok(Value::Nil),
            0xc2 => Ok(Value::Bool(false)),
            0xc3 => Ok(Value::Bool(true)),
            0xc4 => {
                let len = self.take_u8()? as usize;
                Ok(Value::Bin(self.take(len)?.to_vec()))
            }
            0xc5 => {
                let len = self.take_u16()? as usize;
                Ok(Value::Bin(self.take(len)?.to_vec()))
            }
            0xc6 => {
                let len = self.take_u32()? as usize;
                Ok(Value::Bin(self.take(len)?.to_vec()))
            }
            0xc7 => {
                let len = self.take_u8()? as usize;
                self.read_ext(len, ext)
            }
            0xc8 => {
                let len = self.take_u16()? as usize;
                self.read_ext(len, ext)
            }
            0xc9 => {
                let len = self.take_u32()? as usize;
                self.read_ext(len, ext)
            }
            0xca => Ok(Value::Float(f32::from_be_bytes(
                self.take(4)?.try_into().unwrap(),
            ))),
            0xcb => Ok(Value::Double(f64::from_be_bytes(
                self.take(8)?.try_into().unwrap(),
            ))),
            0xcc => Ok(Value::uint(u64::from(self.take_u8()?))),
            0xcd => Ok(Value::uint(u64::from(self.take_u16()?))),
            0xce => Ok(Value::uint(u64::from(self.take_u32()?))),
            0xcf => Ok(Value::uint(self.take_u64()?)),
            0xd0 => Ok(Value::Int(i64::from(self.take_u8()? as i8))),
            0xd1 => Ok(Value::Int(i64::from(self.take_u16()? as i16))),
            0xd2 => Ok(Value::Int(i64::from(self.take_u32()? as i32))),
            0xd3 => Ok(Value::Int(self.take_u64()? as i64)),
            0xd4 => self.read_ext(1, ext),
            0xd5 => self.read_ext(2, ext),
            0xd6 => self.read_ext(4, ext),
            0xd7 => self.read_ext(8, ext),
            0xd8 => self.read_ext(16, ext),
            0xd9 => {
                let len = self.take_u8()? as usize;
                self.read_str(len)
            }
            0xda => {
                let len = self.take_u16()? as usize;
                self.read_str(len)
            }
            0xdb => {
                let len = self.take_u32()? as usize;
                self.read_str(len)
            }
            0xdc => {
                let len = self.take_u16()? as usize;
                self.read_array(len, ext)
            }
            0xdd => {
                let len = self.take_u32()? as usize;
                self.read_array(len, ext)
            }
            0xde => {
                let len = self.take_u16()? as usize;
                self.read_map(len, ext)
            }
            0xdf => {
                let len = self.take_u32()? as usize;
                self.read_map(len, ext)
            }
            0xc1 => Err(DecodeError::InvalidMarker(0xc1)),
        }
    }
}
