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

//! One server connection: handshake, request multiplexing and teardown.
//!
//! A [`Connection`] owns exactly one duplex byte stream. After the
//! greeting and (optional) authentication it splits the stream: a
//! dedicated writer task drains a frame queue so frames are never
//! interleaved or torn mid-write even when a caller is cancelled, and a
//! single background reader task correlates each incoming frame to the
//! caller waiting on its sync id. Responses may arrive in any order;
//! correlation never depends on arrival order.
//!
//! Any read or write failure is terminal. The connection transitions to
//! [`ConnectionState::Closed`] and every pending request resolves with
//! [`Error::ConnectionClosed`] exactly once. A failure that belongs to a
//! single frame — a response body the selected codec cannot decode —
//! resolves that request alone; the stream is still on a frame boundary
//! and the connection stays usable. Retry policy lives in the caller,
//! never here.

mod config;
mod pending;
mod sync;

pub use config::{CodecKind, Config, ServerAddr};

use crate::codec::Codec;
use crate::error::{Error, Result};
use crate::frame;
use crate::protocol::{
    Greeting, RawRequest, RESPONSE_ERROR_FLAG, ServerError, header_key, requests, scramble,
};
use crate::transport::{TcpTransport, Transport};
use crate::value::Value;
use parking_lot::Mutex;
use pending::PendingTable;
use std::sync::{Arc, Weak};
use std::time::Duration;
use sync::SyncAllocator;
use tokio::io::{AsyncReadExt, AsyncWriteExt, ReadHalf, WriteHalf};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Lifecycle of a connection. `Closed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Transport dialing and greeting exchange.
    Connecting,
    /// Greeting parsed, challenge-response in flight.
    Authenticating,
    /// Arbitrary request traffic permitted.
    Ready,
    /// Torn down by failure or explicit shutdown.
    Closed,
}

struct Shared {
    codec: Arc<dyn Codec>,
    writer_tx: mpsc::UnboundedSender<Vec<u8>>,
    pending: PendingTable,
    sync: SyncAllocator,
    state: Arc<Mutex<ConnectionState>>,
    reader_task: Mutex<Option<JoinHandle<()>>>,
    writer_task: Mutex<Option<JoinHandle<()>>>,
    max_frame_size: usize,
    request_timeout: Option<Duration>,
    greeting: Greeting,
}

impl Shared {
    /// Terminal transition: close, stop both tasks, fail every waiter.
    fn teardown(&self) {
        *self.state.lock() = ConnectionState::Closed;
        if let Some(task) = self.reader_task.lock().take() {
            task.abort();
        }
        if let Some(task) = self.writer_task.lock().take() {
            task.abort();
        }
        self.pending.fail_all();
    }
}

impl Drop for Shared {
    fn drop(&mut self) {
        if let Some(task) = self.reader_task.get_mut().take() {
            task.abort();
        }
        if let Some(task) = self.writer_task.get_mut().take() {
            task.abort();
        }
    }
}

/// A multiplexed connection to one server.
///
/// Cloning is cheap and shares the underlying stream; any number of
/// callers may have requests in flight concurrently.
#[derive(Clone)]
pub struct Connection {
    shared: Arc<Shared>,
}

impl Connection {
    /// Dials the configured address and performs the handshake.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArguments`] for an invalid configuration,
    /// [`Error::ConnectionFailed`] if the transport cannot be
    /// established or dies mid-handshake, [`Error::Timeout`] if dialing
    /// exceeds the connect timeout, and [`Error::AuthenticationFailed`]
    /// if the server rejects the credentials.
    pub async fn connect(config: Config) -> Result<Self> {
        config.validate()?;
        let dial = async {
            let transport: Box<dyn Transport> = match config.addr() {
                ServerAddr::Tcp(addr) => Box::new(TcpTransport::connect(addr.as_str()).await?),
                #[cfg(unix)]
                ServerAddr::Unix(path) => {
                    Box::new(crate::transport::UnixTransport::connect(path).await?)
                }
                #[cfg(not(unix))]
                ServerAddr::Unix(_) => {
                    return Err(Error::InvalidArguments(
                        "unix sockets are not supported on this platform".into(),
                    ));
                }
            };
            Ok::<_, Error>(transport)
        };
        let transport = match config.connect_timeout() {
            Some(limit) => tokio::time::timeout(limit, dial)
                .await
                .map_err(|_| Error::Timeout)??,
            None => dial.await?,
        };
        Self::establish_boxed(transport, &config).await
    }

    /// Performs the greeting and authentication handshake over an
    /// already-open transport, then starts the reader and writer tasks.
    ///
    /// [`connect`](Self::connect) delegates here; it is public so a
    /// connection can be driven over any [`Transport`], including an
    /// in-memory one.
    pub async fn establish<T: Transport>(transport: T, config: &Config) -> Result<Self> {
        Self::establish_boxed(Box::new(transport), config).await
    }

    async fn establish_boxed(mut transport: Box<dyn Transport>, config: &Config) -> Result<Self> {
        config.validate()?;
        let codec = config.codec().build();
        let state = Arc::new(Mutex::new(ConnectionState::Connecting));

        let mut raw_greeting = [0u8; crate::protocol::GREETING_SIZE];
        transport.read_exact(&mut raw_greeting).await?;
        let greeting = Greeting::parse(&raw_greeting)?;
        debug!(server = %greeting.server_version(), peer = %transport.describe(), "greeting received");

        if let Some(creds) = config.credentials() {
            *state.lock() = ConnectionState::Authenticating;
            let scramble = scramble(greeting.salt(), &creds.password);
            let request = requests::auth(&creds.username, &scramble);
            let header = request_header(request.request_type, 0);
            frame::write_frame(
                &mut transport,
                codec.as_ref(),
                &header,
                &request.body,
                config.max_frame_size(),
            )
            .await?;
            let (reply_header, reply_body) =
                frame::read_frame(&mut transport, codec.as_ref(), config.max_frame_size()).await?;
            let code = reply_header
                .get(header_key::REQUEST_TYPE)
                .and_then(Value::as_u64)
                .unwrap_or(0);
            if code & RESPONSE_ERROR_FLAG != 0 {
                return Err(Error::AuthenticationFailed(ServerError::decode(
                    code,
                    &reply_body,
                )));
            }
            debug!(user = %creds.username, "authenticated");
        }

        let (read_half, write_half) = tokio::io::split(transport);
        let (writer_tx, writer_rx) = mpsc::unbounded_channel();
        *state.lock() = ConnectionState::Ready;
        let shared = Arc::new(Shared {
            codec: codec.clone(),
            writer_tx,
            pending: PendingTable::new(),
            sync: SyncAllocator::new(),
            state,
            reader_task: Mutex::new(None),
            writer_task: Mutex::new(None),
            max_frame_size: config.max_frame_size(),
            request_timeout: config.request_timeout(),
            greeting,
        });
        let reader = tokio::spawn(reader_loop(
            read_half,
            codec,
            config.max_frame_size(),
            Arc::downgrade(&shared),
        ));
        let writer = tokio::spawn(writer_loop(write_half, writer_rx, Arc::downgrade(&shared)));
        *shared.reader_task.lock() = Some(reader);
        *shared.writer_task.lock() = Some(writer);
        Ok(Self { shared })
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ConnectionState {
        *self.shared.state.lock()
    }

    /// Whether request traffic is currently permitted.
    pub fn is_ready(&self) -> bool {
        self.state() == ConnectionState::Ready
    }

    /// Version string from the server greeting banner.
    pub fn server_version(&self) -> &str {
        self.shared.greeting.server_version()
    }

    /// Number of requests currently awaiting a response.
    pub fn pending_requests(&self) -> usize {
        self.shared.pending.len()
    }

    /// Shuts the connection down. Every pending request resolves with
    /// [`Error::ConnectionClosed`]; the call is idempotent.
    pub async fn close(&self) {
        self.shared.teardown();
    }

    /// Sends one request and waits for its correlated response body.
    ///
    /// The frame is encoded and queued to the writer task in one
    /// non-suspending step, so cancelling the returned future can never
    /// tear a frame on the stream or leak the sync id. After a timeout or
    /// abandoned wait the id stays reserved until the real response is
    /// read and discarded, so a stale frame can never be misattributed to
    /// a newer request.
    pub(crate) async fn request(&self, request: RawRequest) -> Result<Value> {
        if !self.is_ready() {
            return Err(Error::ConnectionClosed);
        }
        let sync = self.shared.sync.next();
        let rx = self.shared.pending.register(sync)?;
        let header = request_header(request.request_type, sync);
        let encoded = match frame::encode_frame(
            self.shared.codec.as_ref(),
            &header,
            &request.body,
            self.shared.max_frame_size,
        ) {
            Ok(encoded) => encoded,
            Err(err) => {
                // Nothing hit the wire; the id can be released.
                self.shared.pending.discard(sync);
                return Err(err);
            }
        };
        if self.shared.writer_tx.send(encoded).is_err() {
            self.shared.pending.discard(sync);
            return Err(Error::ConnectionClosed);
        }
        let outcome = match self.shared.request_timeout {
            Some(limit) => match tokio::time::timeout(limit, rx).await {
                Ok(received) => received,
                Err(_) => return Err(Error::Timeout),
            },
            None => rx.await,
        };
        match outcome {
            Ok(outcome) => outcome,
            Err(_) => Err(Error::ConnectionClosed),
        }
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("state", &self.state())
            .field("pending", &self.shared.pending.len())
            .finish()
    }
}

fn request_header(request_type: u64, sync: u64) -> Value {
    Value::Map(vec![
        (
            Value::uint(header_key::REQUEST_TYPE),
            Value::uint(request_type),
        ),
        (Value::uint(header_key::SYNC), Value::uint(sync)),
    ])
}

/// Single reader: decodes frames and resolves waiters by sync id.
///
/// Holds only a weak handle to the shared state so dropping the last
/// [`Connection`] reaps the task instead of leaking it. Stream-level
/// failures tear the connection down; a body the codec cannot decode
/// resolves only the request it belongs to.
async fn reader_loop(
    mut reader: ReadHalf<Box<dyn Transport>>,
    codec: Arc<dyn Codec>,
    max_frame_size: usize,
    shared: Weak<Shared>,
) {
    loop {
        match frame::read_frame_parts(&mut reader, codec.as_ref(), max_frame_size).await {
            Ok((header, body)) => {
                let Some(shared) = shared.upgrade() else {
                    break;
                };
                let Some(sync) = header.get(header_key::SYNC).and_then(Value::as_u64) else {
                    warn!("discarding response without a sync id");
                    continue;
                };
                let code = header
                    .get(header_key::REQUEST_TYPE)
                    .and_then(Value::as_u64)
                    .unwrap_or(0);
                let outcome = match body {
                    Ok(body) => {
                        if code & RESPONSE_ERROR_FLAG != 0 {
                            Err(Error::RequestFailed(ServerError::decode(code, &body)))
                        } else {
                            Ok(body)
                        }
                    }
                    Err(err) => Err(err),
                };
                if !shared.pending.complete(sync, outcome) {
                    warn!(sync, "discarding response with unknown sync id");
                }
            }
            Err(err) => {
                if let Some(shared) = shared.upgrade() {
                    debug!(error = %err, "connection reader stopping");
                    shared.teardown();
                }
                break;
            }
        }
    }
}

/// Single writer: drains the frame queue onto the stream.
///
/// Each queued element is one whole pre-encoded frame, so a write is
/// never interleaved with another and a cancelled caller cannot leave a
/// partial frame behind; the queue outlives every caller future.
async fn writer_loop(
    mut writer: WriteHalf<Box<dyn Transport>>,
    mut queue: mpsc::UnboundedReceiver<Vec<u8>>,
    shared: Weak<Shared>,
) {
    while let Some(encoded) = queue.recv().await {
        let result = async {
            writer.write_all(&encoded).await?;
            writer.flush().await
        }
        .await;
        if let Err(err) = result {
            if let Some(shared) = shared.upgrade() {
                debug!(error = %err, "connection writer stopping");
                shared.teardown();
            }
            break;
        }
    }
    let _ = writer.shutdown().await;
}
