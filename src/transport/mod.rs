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

//! Byte-stream transports.
//!
//! A [`Transport`] is one raw, reliable, duplex byte stream: the protocol
//! engine performs the greeting, authentication and framing on top and
//! never cares which implementation is underneath. Provided:
//!
//! - [`TcpTransport`]: TCP/IP, the common case.
//! - [`UnixTransport`]: local stream socket (Unix platforms).
//! - [`MemoryTransport`]: in-process duplex pipe for tests.
//!
//! Transport security (TLS) is deliberately out of scope; a custom
//! implementation of the trait can layer it externally.

mod memory;
mod tcp;
#[cfg(unix)]
mod unix;

pub use memory::MemoryTransport;
pub use tcp::TcpTransport;
#[cfg(unix)]
pub use unix::UnixTransport;

use tokio::io::{AsyncRead, AsyncWrite};

/// A raw duplex byte stream the connection can run IPROTO over.
///
/// Implementations only need to be an async stream; the connection owns
/// exactly one reader and serializes writers above this interface.
pub trait Transport: AsyncRead + AsyncWrite + Send + Unpin + 'static {
    /// Human-readable endpoint description, used in connect/teardown logs.
    fn describe(&self) -> String;
}
