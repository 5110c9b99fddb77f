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

//! Error taxonomy for the client.
//!
//! Every failure mode is a distinct [`Error`] variant so calling code can
//! branch on kind: a [`Error::Timeout`] or [`Error::ConnectionFailed`] may
//! be worth retrying, a [`Error::RequestFailed`] caused by bad SQL is not.
//! The codec layer has its own error types ([`EncodeError`],
//! [`DecodeError`]) which convert into the top-level taxonomy at the
//! boundary, the same layering the connection and frame code uses for
//! transport failures.
//!
//! # Propagation rules
//!
//! - Transport failures are reported once and never retried here; every
//!   request pending at that moment resolves with
//!   [`Error::ConnectionClosed`] exactly once.
//! - Server-reported errors surface verbatim as [`Error::RequestFailed`]
//!   carrying the decoded [`ServerError`], cause chain included.
//! - Local validation ([`Error::InvalidArguments`],
//!   [`Error::AlreadyClosed`]) fails before any frame is written.

use crate::codec::{DecodeError, EncodeError};
use crate::protocol::ServerError;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Any error this client can produce.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// I/O failure while connecting, reading or writing the transport.
    #[error("connection failed: {0}")]
    ConnectionFailed(#[from] std::io::Error),

    /// The server rejected the authentication request.
    #[error("authentication failed: {0}")]
    AuthenticationFailed(ServerError),

    /// A frame declared a length beyond the configured limit. The stream
    /// position is no longer trustworthy, so the connection is closed.
    #[error("frame of {length} bytes exceeds the {limit} byte limit")]
    FrameTooLarge {
        /// Declared payload length.
        length: usize,
        /// Configured maximum.
        limit: usize,
    },

    /// A value or extension kind the selected codec cannot represent.
    #[error("unsupported type: {0}")]
    UnsupportedType(String),

    /// The peer sent bytes that do not decode as the protocol requires.
    #[error("malformed response: {0}")]
    MalformedResponse(DecodeError),

    /// A sync id was about to be reused while still in flight. This is an
    /// internal invariant violation; report it as a bug.
    #[error("sync id {0} is still pending; refusing to reuse it")]
    SyncIdCollision(u64),

    /// No response arrived within the caller's deadline. The sync id stays
    /// reserved and the late response, if any, is discarded on arrival.
    #[error("request timed out")]
    Timeout,

    /// The connection was torn down while the request was outstanding.
    #[error("connection closed")]
    ConnectionClosed,

    /// The server processed the request and returned an error body.
    #[error("request failed: {0}")]
    RequestFailed(ServerError),

    /// A locally closed prepared statement was used again.
    #[error("prepared statement {0} is already closed")]
    AlreadyClosed(u64),

    /// Arguments were rejected before any network I/O.
    #[error("invalid arguments: {0}")]
    InvalidArguments(String),
}

impl From<EncodeError> for Error {
    fn from(err: EncodeError) -> Self {
        match err {
            EncodeError::UnsupportedType { .. } => Error::UnsupportedType(err.to_string()),
        }
    }
}

impl From<DecodeError> for Error {
    fn from(err: DecodeError) -> Self {
        match err {
            DecodeError::UnsupportedExtension(_) => Error::UnsupportedType(err.to_string()),
            other => Error::MalformedResponse(other),
        }
    }
}

impl Error {
    /// Returns `true` for failures worth retrying on a fresh connection
    /// (transport-level and deadline failures, never server verdicts).
    #[must_use]
    pub fn is_retriable(&self) -> bool {
        matches!(
            self,
            Error::ConnectionFailed(_) | Error::ConnectionClosed | Error::Timeout
        )
    }

    /// Returns the server error, if this is a server-reported failure.
    #[must_use]
    pub fn server_error(&self) -> Option<&ServerError> {
        match self {
            Error::RequestFailed(err) | Error::AuthenticationFailed(err) => Some(err),
            _ => None,
        }
    }
}
