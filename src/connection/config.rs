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

//! Connection configuration.
//!
//! [`Config`] is an explicit, immutable description of every connection
//! option: server address, credentials, timeouts, frame-size limit and
//! codec variant. It is validated exactly once, when the connection is
//! constructed; invalid combinations fail there with
//! [`Error::InvalidArguments`] and nowhere else.
//!
//! # Example
//!
//! ```rust
//! use std::time::Duration;
//! use tarantool_client::{CodecKind, Config};
//!
//! let config = Config::tcp("127.0.0.1:3301")
//!     .with_credentials("appuser", "s3cret")
//!     .with_request_timeout(Duration::from_secs(5))
//!     .with_codec(CodecKind::Full);
//! ```

use crate::codec::{Codec, ExtensionPolicy, FullCodec, LiteCodec};
use crate::error::{Error, Result};
use crate::frame::DEFAULT_MAX_FRAME_SIZE;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Where the server lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerAddr {
    /// TCP host:port.
    Tcp(String),
    /// Local stream socket path.
    Unix(PathBuf),
}

/// Which codec strategy the connection uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CodecKind {
    /// Full codec, extension types included.
    #[default]
    Full,
    /// Lite codec with the given extension policy.
    Lite(ExtensionPolicy),
}

impl CodecKind {
    pub(crate) fn build(self) -> Arc<dyn Codec> {
        match self {
            CodecKind::Full => Arc::new(FullCodec),
            CodecKind::Lite(policy) => Arc::new(LiteCodec::new(policy)),
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct Credentials {
    pub username: String,
    pub password: String,
}

/// Immutable connection configuration.
#[derive(Debug, Clone)]
pub struct Config {
    addr: ServerAddr,
    credentials: Option<Credentials>,
    connect_timeout: Option<Duration>,
    request_timeout: Option<Duration>,
    max_frame_size: usize,
    codec: CodecKind,
}

impl Config {
    fn new(addr: ServerAddr) -> Self {
        Self {
            addr,
            credentials: None,
            connect_timeout: Some(Duration::from_secs(10)),
            request_timeout: None,
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
            codec: CodecKind::default(),
        }
    }

    /// Configuration for a TCP server at `addr` (`host:port`).
    #[must_use]
    pub fn tcp(addr: impl Into<String>) -> Self {
        Self::new(ServerAddr::Tcp(addr.into()))
    }

    /// Configuration for a server behind a local stream socket.
    #[must_use]
    pub fn unix(path: impl Into<PathBuf>) -> Self {
        Self::new(ServerAddr::Unix(path.into()))
    }

    /// Authenticates as `username` after the greeting.
    #[must_use]
    pub fn with_credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.credentials = Some(Credentials {
            username: username.into(),
            password: password.into(),
        });
        self
    }

    /// Deadline for establishing the transport. Default 10 seconds;
    /// `None` waits indefinitely.
    #[must_use]
    pub fn with_connect_timeout(mut self, timeout: impl Into<Option<Duration>>) -> Self {
        self.connect_timeout = timeout.into();
        self
    }

    /// Deadline for each request. `None` (the default) waits until the
    /// response arrives or the connection closes.
    #[must_use]
    pub fn with_request_timeout(mut self, timeout: impl Into<Option<Duration>>) -> Self {
        self.request_timeout = timeout.into();
        self
    }

    /// Upper bound on a single frame. Frames above it fail with
    /// [`Error::FrameTooLarge`].
    #[must_use]
    pub fn with_max_frame_size(mut self, bytes: usize) -> Self {
        self.max_frame_size = bytes;
        self
    }

    /// Selects the codec variant.
    #[must_use]
    pub fn with_codec(mut self, codec: CodecKind) -> Self {
        self.codec = codec;
        self
    }

    /// Checks the configuration; called once, at connection construction.
    pub(crate) fn validate(&self) -> Result<()> {
        if let ServerAddr::Tcp(addr) = &self.addr {
            if addr.is_empty() {
                return Err(Error::InvalidArguments("empty server address".into()));
            }
        }
        if let Some(creds) = &self.credentials {
            if creds.username.is_empty() {
                return Err(Error::InvalidArguments(
                    "credentials require a non-empty username".into(),
                ));
            }
        }
        if self.max_frame_size == 0 {
            return Err(Error::InvalidArguments(
                "max frame size must be positive".into(),
            ));
        }
        Ok(())
    }

    pub(crate) fn addr(&self) -> &ServerAddr {
        &self.addr
    }

    pub(crate) fn credentials(&self) -> Option<&Credentials> {
        self.credentials.as_ref()
    }

    pub(crate) fn connect_timeout(&self) -> Option<Duration> {
        self.connect_timeout
    }

    pub(crate) fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout
    }

    pub(crate) fn max_frame_size(&self) -> usize {
        self.max_frame_size
    }

    pub(crate) fn codec(&self) -> CodecKind {
        self.codec
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(Config::tcp("127.0.0.1:3301").validate().is_ok());
    }

    #[test]
    fn invalid_combinations_fail_at_the_single_validation_point() {
        assert!(matches!(
            Config::tcp("").validate().unwrap_err(),
            Error::InvalidArguments(_)
        ));
        assert!(matches!(
            Config::tcp("h:1").with_credentials("", "pw").validate().unwrap_err(),
            Error::InvalidArguments(_)
        ));
        assert!(matches!(
            Config::tcp("h:1").with_max_frame_size(0).validate().unwrap_err(),
            Error::InvalidArguments(_)
        ));
    }
}
