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

//! Decoding of server-reported errors.
//!
//! An error response carries code `0x8000 | errcode` in the header and at
//! minimum a message string under `ERROR_24` in the body. Servers from
//! 2.4.1 on additionally send a stacked error under `ERROR`: an array of
//! cause frames, each a map of numeric keys. The stack is preserved in
//! exactly the order the server sent it, and unknown fields are ignored
//! for forward compatibility — decoding a server error never fails.

use super::{RESPONSE_ERROR_FLAG, body_key};
use crate::value::Value;
use std::fmt;

/// Key of the cause array inside the `ERROR` body map.
const MP_ERROR_STACK: u64 = 0x00;

/// Keys inside one stacked cause frame.
const CAUSE_TYPE: u64 = 0x00;
const CAUSE_FILE: u64 = 0x01;
const CAUSE_LINE: u64 = 0x02;
const CAUSE_MESSAGE: u64 = 0x03;
const CAUSE_ERRCODE: u64 = 0x05;

/// One entry of a stacked server error.
///
/// `error_type`, `file` and `line` are preserved as opaque metadata; the
/// client does not interpret them further.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CauseFrame {
    /// Server error code of this cause.
    pub code: u32,
    /// Message of this cause.
    pub message: String,
    /// Server-side error type name, e.g. `ClientError`.
    pub error_type: Option<String>,
    /// Source file that raised the error.
    pub file: Option<String>,
    /// Source line that raised the error.
    pub line: Option<u64>,
}

/// A structured error reported by the server.
///
/// Immutable once decoded. The top-level `code`/`message` always come from
/// the response header and the plain `ERROR_24` message; `stack` holds the
/// extended cause chain when the server sent one, in server order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerError {
    code: u32,
    message: String,
    stack: Vec<CauseFrame>,
}

impl ServerError {
    /// Builds a server error from parts; mainly useful in tests.
    #[must_use]
    pub fn new(code: u32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            stack: Vec::new(),
        }
    }

    /// Decodes a server error from a response marked as failed.
    ///
    /// `response_code` is the header code with [`RESPONSE_ERROR_FLAG`]
    /// set. Total: malformed or missing error fields degrade to an empty
    /// message or stack, never to a decode failure.
    #[must_use]
    pub fn decode(response_code: u64, body: &Value) -> Self {
        let code = (response_code & !RESPONSE_ERROR_FLAG) as u32;
        let message = body
            .get(body_key::ERROR_24)
            .and_then(Value::as_str)
            .unwrap_or("unknown error")
            .to_owned();
        let stack = body
            .get(body_key::ERROR)
            .and_then(|ext| ext.get(MP_ERROR_STACK))
            .and_then(Value::as_array)
            .map(|frames| frames.iter().filter_map(decode_cause).collect())
            .unwrap_or_default();
        Self {
            code,
            message,
            stack,
        }
    }

    /// Server error code (without the error flag bit).
    #[must_use]
    pub fn code(&self) -> u32 {
        self.code
    }

    /// Top-level error message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Stacked cause chain in the order the server sent it. Empty on
    /// protocol versions without extended errors.
    #[must_use]
    pub fn stack(&self) -> &[CauseFrame] {
        &self.stack
    }
}

fn decode_cause(frame: &Value) -> Option<CauseFrame> {
    // A cause frame that is not a map is skipped, not fatal.
    frame.as_map()?;
    Some(CauseFrame {
        code: frame
            .get(CAUSE_ERRCODE)
            .and_then(Value::as_u64)
            .unwrap_or(0) as u32,
        message: frame
            .get(CAUSE_MESSAGE)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_owned(),
        error_type: frame
            .get(CAUSE_TYPE)
            .and_then(Value::as_str)
            .map(str::to_owned),
        file: frame
            .get(CAUSE_FILE)
            .and_then(Value::as_str)
            .map(str::to_owned),
        line: frame.get(CAUSE_LINE).and_then(Value::as_u64),
    })
}

impl fmt::Display for ServerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (error code {})", self.message, self.code)
    }
}

impl std::error::Error for ServerError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_plain_error_body() {
        let body = Value::Map(vec![(
            Value::uint(body_key::ERROR_24),
            Value::from("Prepared statement with id 42 does not exist"),
        )]);
        let err = ServerError::decode(RESPONSE_ERROR_FLAG | 48, &body);
        assert_eq!(err.code(), 48);
        assert_eq!(err.message(), "Prepared statement with id 42 does not exist");
        assert!(err.stack().is_empty());
    }

    #[test]
    fn decodes_stacked_error_preserving_server_order() {
        let frame = |code: u64, msg: &str| {
            Value::Map(vec![
                (Value::uint(CAUSE_TYPE), Value::from("ClientError")),
                (Value::uint(CAUSE_LINE), Value::Int(33)),
                (Value::uint(CAUSE_MESSAGE), Value::from(msg)),
                (Value::uint(CAUSE_ERRCODE), Value::uint(code)),
                // Unknown extended field: must be ignored.
                (Value::uint(0x7f), Value::from("future")),
            ])
        };
        let body = Value::Map(vec![
            (Value::uint(body_key::ERROR_24), Value::from("outer")),
            (
                Value::uint(body_key::ERROR),
                Value::Map(vec![(
                    Value::uint(MP_ERROR_STACK),
                    Value::Array(vec![frame(7, "outer"), frame(3, "inner cause")]),
                )]),
            ),
        ]);

        let err = ServerError::decode(RESPONSE_ERROR_FLAG | 7, &body);
        assert_eq!(err.stack().len(), 2);
        assert_eq!(err.stack()[0].message, "outer");
        assert_eq!(err.stack()[1].message, "inner cause");
        assert_eq!(err.stack()[1].code, 3);
        assert_eq!(err.stack()[0].error_type.as_deref(), Some("ClientError"));
    }

    #[test]
    fn missing_fields_do_not_fail_decoding() {
        let err = ServerError::decode(RESPONSE_ERROR_FLAG | 1, &Value::Map(vec![]));
        assert_eq!(err.code(), 1);
        assert_eq!(err.message(), "unknown error");
    }
}
