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

//! Length-prefixed frame codec.
//!
//! One IPROTO frame on the wire is:
//!
//! ```text
//! +--------------------+---------------+---------------+
//! | Length (mp uint)   | Header (map)  | Body (map)    |
//! +--------------------+---------------+---------------+
//! ```
//!
//! - **Length**: a MessagePack unsigned integer covering the encoded
//!   header plus body. Written as the five-byte `0xce` + u32 form every
//!   Tarantool connector emits; any uint width is accepted on read.
//! - **Header**: map with the sync id and request type / response code.
//! - **Body**: map of operation fields, possibly empty.
//!
//! Reading first decodes the length, then reads exactly that many further
//! bytes and decodes header and body from that bounded slice. The bound is
//! what keeps a malformed or hostile length field from causing unbounded
//! buffering: a length above the configured maximum fails with
//! [`Error::FrameTooLarge`] without consuming anything past the prefix,
//! after which the stream position is untrustworthy and the connection
//! must be closed.

use crate::codec::Codec;
use crate::error::{Error, Result};
use crate::value::Value;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Default maximum frame size (16 MB), matching the server default.
pub const DEFAULT_MAX_FRAME_SIZE: usize = 16 * 1024 * 1024;

/// Encodes one frame into its full wire form: length prefix, header map,
/// body map.
///
/// # Errors
///
/// Returns [`Error::FrameTooLarge`] if the encoded payload exceeds
/// `max_size` or [`Error::UnsupportedType`] if the codec cannot encode a
/// value. Nothing is emitted on failure, so an oversized or unencodable
/// request never tears a frame on the stream.
pub fn encode_frame(
    codec: &dyn Codec,
    header: &Value,
    body: &Value,
    max_size: usize,
) -> Result<Vec<u8>> {
    let mut frame = vec![0u8; 5];
    codec.encode(header, &mut frame)?;
    codec.encode(body, &mut frame)?;
    let length = frame.len() - 5;
    if length > max_size {
        return Err(Error::FrameTooLarge {
            length,
            limit: max_size,
        });
    }
    frame[0] = 0xce;
    frame[1..5].copy_from_slice(&(length as u32).to_be_bytes());
    Ok(frame)
}

/// Writes one frame: length prefix, header map, body map.
///
/// # Errors
///
/// Returns [`Error::FrameTooLarge`] if the encoded payload exceeds
/// `max_size`, [`Error::UnsupportedType`] if the codec cannot encode a
/// value, or [`Error::ConnectionFailed`] on I/O failure.
pub async fn write_frame<W>(
    writer: &mut W,
    codec: &dyn Codec,
    header: &Value,
    body: &Value,
    max_size: usize,
) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    let frame = encode_frame(codec, header, body, max_size)?;
    writer.write_all(&frame).await?;
    writer.flush().await?;
    Ok(())
}

/// Reads one frame, returning its decoded header and body maps.
///
/// A response without body bytes yields an empty body map.
///
/// # Errors
///
/// Returns [`Error::FrameTooLarge`] when the declared length exceeds
/// `max_size` (no payload bytes consumed), [`Error::MalformedResponse`]
/// when the payload does not decode, or [`Error::ConnectionFailed`] on
/// I/O failure, including the peer closing mid-frame.
pub async fn read_frame<R>(
    reader: &mut R,
    codec: &dyn Codec,
    max_size: usize,
) -> Result<(Value, Value)>
where
    R: AsyncRead + Unpin,
{
    let (header, body) = read_frame_parts(reader, codec, max_size).await?;
    Ok((header, body?))
}

/// Reads one frame, deferring body decode failures to the caller.
///
/// The whole payload is consumed before anything is decoded, so when only
/// the body fails to decode the stream position is still on a frame
/// boundary and the connection remains usable. The header must always
/// decode: without it there is no sync id to attribute the failure to.
///
/// # Errors
///
/// The outer error is terminal for the stream ([`Error::FrameTooLarge`],
/// an undecodable header, or [`Error::ConnectionFailed`]); the inner one
/// belongs to this frame only.
pub async fn read_frame_parts<R>(
    reader: &mut R,
    codec: &dyn Codec,
    max_size: usize,
) -> Result<(Value, Result<Value>)>
where
    R: AsyncRead + Unpin,
{
    let length = read_length(reader).await?;
    if length > max_size {
        return Err(Error::FrameTooLarge {
            length,
            limit: max_size,
        });
    }

    let mut payload = vec![0u8; length];
    reader.read_exact(&mut payload).await?;

    let (header, consumed) = codec.decode(&payload)?;
    let body = if consumed < payload.len() {
        codec
            .decode(&payload[consumed..])
            .map(|(body, _)| body)
            .map_err(Error::from)
    } else {
        Ok(Value::Map(Vec::new()))
    };
    Ok((header, body))
}

/// Reads the MessagePack uint length prefix, accepting every width.
async fn read_length<R>(reader: &mut R) -> Result<usize>
where
    R: AsyncRead + Unpin,
{
    let marker = reader.read_u8().await?;
    let length = match marker {
        0x00..=0x7f => u64::from(marker),
        0xcc => u64::from(reader.read_u8().await?),
        0xcd => u64::from(reader.read_u16().await?),
        0xce => u64::from(reader.read_u32().await?),
        0xcf => reader.read_u64().await?,
        other => {
            return Err(Error::MalformedResponse(
                crate::codec::DecodeError::InvalidMarker(other),
            ));
        }
    };
    Ok(length as usize)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::FullCodec;
    use crate::protocol::header_key;

    fn header(sync: u64, code: u64) -> Value {
        Value::Map(vec![
            (Value::uint(header_key::REQUEST_TYPE), Value::uint(code)),
            (Value::uint(header_key::SYNC), Value::uint(sync)),
        ])
    }

    #[tokio::test]
    async fn frame_roundtrips_header_and_body() {
        let body = Value::Map(vec![(Value::Int(0x40), Value::from("SELECT 1"))]);
        let mut buffer = Vec::new();
        write_frame(
            &mut buffer,
            &FullCodec,
            &header(3, 11),
            &body,
            DEFAULT_MAX_FRAME_SIZE,
        )
        .await
        .unwrap();

        // Fixed five-byte length prefix.
        assert_eq!(buffer[0], 0xce);
        let declared = u32::from_be_bytes(buffer[1..5].try_into().unwrap()) as usize;
        assert_eq!(declared, buffer.len() - 5);

        let mut reader = &buffer[..];
        let (decoded_header, decoded_body) =
            read_frame(&mut reader, &FullCodec, DEFAULT_MAX_FRAME_SIZE)
                .await
                .unwrap();
        assert_eq!(decoded_header, header(3, 11));
        assert_eq!(decoded_body, body);
        assert!(reader.is_empty());
    }

    #[tokio::test]
    async fn oversized_length_fails_without_reading_payload() {
        let mut buffer = Vec::new();
        buffer.push(0xce);
        buffer.extend_from_slice(&1024u32.to_be_bytes());
        buffer.extend_from_slice(&[0u8; 1024]);

        let mut reader = &buffer[..];
        let err = read_frame(&mut reader, &FullCodec, 100).await.unwrap_err();
        assert!(matches!(
            err,
            Error::FrameTooLarge {
                length: 1024,
                limit: 100
            }
        ));
        // Only the prefix was consumed.
        assert_eq!(reader.len(), 1024);
    }

    #[tokio::test]
    async fn any_length_prefix_width_is_accepted() {
        let mut framed = Vec::new();
        write_frame(
            &mut framed,
            &FullCodec,
            &header(1, 0),
            &Value::Map(vec![]),
            DEFAULT_MAX_FRAME_SIZE,
        )
        .await
        .unwrap();
        let payload = &framed[5..];

        // Re-frame the same payload with a fixint prefix.
        let mut compact = vec![payload.len() as u8];
        compact.extend_from_slice(payload);

        let mut reader = &compact[..];
        let (decoded_header, _) = read_frame(&mut reader, &FullCodec, DEFAULT_MAX_FRAME_SIZE)
            .await
            .unwrap();
        assert_eq!(decoded_header, header(1, 0));
    }

    #[tokio::test]
    async fn missing_body_decodes_as_empty_map() {
        let mut payload = Vec::new();
        FullCodec.encode(&header(9, 0), &mut payload).unwrap();
        let mut framed = vec![0xce];
        framed.extend_from_slice(&(payload.len() as u32).to_be_bytes());
        framed.extend_from_slice(&payload);

        let mut reader = &framed[..];
        let (_, body) = read_frame(&mut reader, &FullCodec, DEFAULT_MAX_FRAME_SIZE)
            .await
            .unwrap();
        assert_eq!(body, Value::Map(vec![]));
    }

    #[tokio::test]
    async fn body_decode_failure_is_contained_to_the_frame() {
        use crate::codec::{ExtensionPolicy, LiteCodec};

        let body = Value::Map(vec![(
            Value::Int(0x30),
            Value::Array(vec![Value::Ext(1, vec![0x00, 0x01])]),
        )]);
        let mut framed = Vec::new();
        write_frame(
            &mut framed,
            &FullCodec,
            &header(4, 0),
            &body,
            DEFAULT_MAX_FRAME_SIZE,
        )
        .await
        .unwrap();

        let strict = LiteCodec::new(ExtensionPolicy::Strict);
        let mut reader = &framed[..];
        let (decoded_header, decoded_body) =
            read_frame_parts(&mut reader, &strict, DEFAULT_MAX_FRAME_SIZE)
                .await
                .unwrap();
        assert_eq!(decoded_header, header(4, 0));
        assert!(matches!(decoded_body, Err(Error::UnsupportedType(_))));
        // The whole frame was consumed; the stream is still usable.
        assert!(reader.is_empty());
    }

    #[tokio::test]
    async fn truncated_payload_is_a_connection_failure() {
        let mut framed = Vec::new();
        write_frame(
            &mut framed,
            &FullCodec,
            &header(1, 0),
            &Value::Map(vec![]),
            DEFAULT_MAX_FRAME_SIZE,
        )
        .await
        .unwrap();
        framed.truncate(framed.len() - 1);

        let mut reader = &framed[..];
        let err = read_frame(&mut reader, &FullCodec, DEFAULT_MAX_FRAME_SIZE)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::ConnectionFailed(_)));
    }
}
