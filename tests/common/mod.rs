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

//! Scripted in-memory server shared by the integration tests.
//!
//! [`ServerEnd`] drives the far side of a [`MemoryTransport`] pair: it
//! sends the greeting, decodes request frames and writes back whatever
//! response a test scripts, including deliberately broken ones.

#![allow(dead_code)]

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use tarantool_client::codec::FullCodec;
use tarantool_client::frame;
use tarantool_client::protocol::{RESPONSE_ERROR_FLAG, body_key, header_key};
use tarantool_client::transport::MemoryTransport;
use tarantool_client::{Client, Config, Result, Value};
use tokio::io::AsyncWriteExt;

/// Salt every scripted greeting advertises.
pub const SALT: [u8; 20] = [0x5a; 20];

const MAX_FRAME: usize = 16 * 1024 * 1024;

/// The server half of an in-memory connection.
pub struct ServerEnd {
    io: MemoryTransport,
}

/// A 128-byte greeting block advertising [`SALT`].
pub fn greeting_bytes() -> [u8; 128] {
    let mut raw = [b' '; 128];
    let banner = "Tarantool 2.10.5 (Binary) 8e0f3ecb-0000-4000-8000-000000000000";
    raw[..banner.len()].copy_from_slice(banner.as_bytes());
    raw[63] = b'\n';
    let salt = BASE64.encode(SALT);
    raw[64..64 + salt.len()].copy_from_slice(salt.as_bytes());
    raw[127] = b'\n';
    raw
}

/// Builds a body/header map keyed by protocol field numbers.
pub fn map(pairs: Vec<(u64, Value)>) -> Value {
    Value::Map(
        pairs
            .into_iter()
            .map(|(k, v)| (Value::uint(k), v))
            .collect(),
    )
}

impl ServerEnd {
    /// Reads one request frame, returning `(request_type, sync, body)`.
    pub async fn read_request(&mut self) -> (u64, u64, Value) {
        let (header, body) = frame::read_frame(&mut self.io, &FullCodec, MAX_FRAME)
            .await
            .expect("server failed to read a request frame");
        let request_type = header
            .get(header_key::REQUEST_TYPE)
            .and_then(Value::as_u64)
            .expect("request header is missing the request type");
        let sync = header
            .get(header_key::SYNC)
            .and_then(Value::as_u64)
            .expect("request header is missing the sync id");
        (request_type, sync, body)
    }

    /// Writes a success response carrying `body`.
    pub async fn respond_ok(&mut self, sync: u64, body: Value) {
        self.respond_raw(0, sync, body).await;
    }

    /// Writes an error response with the given server code and message.
    pub async fn respond_error(&mut self, sync: u64, code: u64, message: &str) {
        let body = map(vec![(body_key::ERROR_24, Value::from(message))]);
        self.respond_raw(RESPONSE_ERROR_FLAG | code, sync, body).await;
    }

    /// Writes a response frame with an arbitrary status code.
    pub async fn respond_raw(&mut self, status: u64, sync: u64, body: Value) {
        let header = map(vec![
            (header_key::REQUEST_TYPE, Value::uint(status)),
            (header_key::SYNC, Value::uint(sync)),
        ]);
        frame::write_frame(&mut self.io, &FullCodec, &header, &body, MAX_FRAME)
            .await
            .expect("server failed to write a response frame");
    }

    /// Writes raw bytes, bypassing the frame codec.
    pub async fn write_bytes(&mut self, bytes: &[u8]) {
        self.io
            .write_all(bytes)
            .await
            .expect("server failed to write raw bytes");
    }
}

/// Connects a client without credentials to a scripted server.
pub async fn connect(config: Config) -> (Client, ServerEnd) {
    connect_with_capacity(config, 64 * 1024).await
}

/// Same as [`connect`], over a duplex with the given buffer capacity.
/// Small capacities force writes to park mid-frame.
pub async fn connect_with_capacity(config: Config, capacity: usize) -> (Client, ServerEnd) {
    let (client_io, server_io) = MemoryTransport::pair(capacity);
    let mut server = ServerEnd { io: server_io };
    let establish = Client::establish(client_io, &config);
    let script = async {
        server.write_bytes(&greeting_bytes()).await;
        server
    };
    let (client, server) = tokio::join!(establish, script);
    (
        client.expect("handshake without credentials failed"),
        server,
    )
}

/// Connects a client with credentials; the server accepts or rejects the
/// authentication request and hands back the auth body it received.
pub async fn connect_auth(config: Config, accept: bool) -> (Result<Client>, ServerEnd, Value) {
    let (client_io, server_io) = MemoryTransport::pair(64 * 1024);
    let mut server = ServerEnd { io: server_io };
    let establish = Client::establish(client_io, &config);
    let script = async {
        server.write_bytes(&greeting_bytes()).await;
        let (request_type, sync, body) = server.read_request().await;
        assert_eq!(request_type, 7, "expected an auth request");
        if accept {
            server.respond_ok(sync, Value::Map(vec![])).await;
        } else {
            server
                .respond_error(sync, 47, "User not found or supplied credentials are invalid")
                .await;
        }
        (server, body)
    };
    let (client, (server, auth_body)) = tokio::join!(establish, script);
    (client, server, auth_body)
}
