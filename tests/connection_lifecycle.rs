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

//! Integration tests for the connection lifecycle.
//!
//! These tests cover the handshake (greeting and challenge-response
//! auth), teardown semantics for pending requests, timeouts, and the
//! frame-size limit on both directions.

mod common;

use std::time::Duration;
use tarantool_client::protocol::{body_key, scramble};
use tarantool_client::transport::MemoryTransport;
use tarantool_client::{Client, Config, ConnectionState, Error, Value};

#[tokio::test]
async fn handshake_scrambles_the_password() {
    let config = Config::tcp("test").with_credentials("appuser", "s3cret");
    let (client, _server, auth_body) = common::connect_auth(config, true).await;
    let client = client.unwrap();
    assert!(client.is_ready());
    assert_eq!(client.server_version(), "2.10.5");

    assert_eq!(
        auth_body.get(body_key::USER_NAME).and_then(Value::as_str),
        Some("appuser")
    );
    let tuple = auth_body
        .get(body_key::TUPLE)
        .and_then(Value::as_array)
        .expect("auth body carries the mechanism tuple");
    assert_eq!(tuple[0].as_str(), Some("chap-sha1"));
    let expected = scramble(&common::SALT, "s3cret");
    assert_eq!(tuple[1].as_bytes(), Some(&expected[..]));
}

#[tokio::test]
async fn rejected_credentials_surface_as_authentication_failed() {
    let config = Config::tcp("test").with_credentials("appuser", "wrong");
    let (client, _server, _body) = common::connect_auth(config, false).await;
    match client.unwrap_err() {
        Error::AuthenticationFailed(err) => assert_eq!(err.code(), 47),
        other => panic!("expected AuthenticationFailed, got {other:?}"),
    }
}

#[tokio::test]
async fn invalid_config_fails_before_any_io() {
    let (client_io, _server_io) = MemoryTransport::pair(1024);
    let err = Client::establish(client_io, &Config::tcp(""))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidArguments(_)));
}

#[tokio::test]
async fn teardown_fails_every_pending_request_exactly_once() {
    let (client, mut server) = common::connect(Config::tcp("test")).await;

    let script = async move {
        for _ in 0..5 {
            server.read_request().await;
        }
        drop(server);
    };

    let pings = async {
        tokio::join!(
            client.ping(),
            client.ping(),
            client.ping(),
            client.ping(),
            client.ping(),
        )
    };

    let ((a, b, c, d, e), ()) = tokio::join!(pings, script);
    for result in [a, b, c, d, e] {
        assert!(matches!(result.unwrap_err(), Error::ConnectionClosed));
    }
    assert!(!client.is_ready());
    // Requests after teardown fail without touching the wire.
    assert!(matches!(
        client.ping().await.unwrap_err(),
        Error::ConnectionClosed
    ));
}

#[tokio::test]
async fn explicit_close_is_terminal_and_idempotent() {
    let (client, mut server) = common::connect(Config::tcp("test")).await;

    let pinger = client.clone();
    let pending = tokio::spawn(async move { pinger.ping().await });
    server.read_request().await;

    client.close().await;
    assert!(matches!(
        pending.await.unwrap().unwrap_err(),
        Error::ConnectionClosed
    ));
    assert_eq!(client.state(), ConnectionState::Closed);
    client.close().await;
    assert_eq!(client.state(), ConnectionState::Closed);
}

#[tokio::test]
async fn timeout_resolves_locally_and_the_late_response_is_discarded() {
    let config = Config::tcp("test").with_request_timeout(Duration::from_millis(40));
    let (client, mut server) = common::connect(config).await;

    let script = async move {
        let (_, first_sync, _) = server.read_request().await;
        // The second request only arrives after the first timed out.
        let (_, second_sync, _) = server.read_request().await;
        server.respond_ok(first_sync, Value::Map(vec![])).await;
        server.respond_ok(second_sync, Value::Map(vec![])).await;
        server
    };

    let calls = async {
        let first = client.ping().await;
        assert!(matches!(first.unwrap_err(), Error::Timeout));
        // The abandoned sync id stays reserved until its response arrives.
        assert_eq!(client.connection().pending_requests(), 1);
        client.ping().await
    };

    let (second, _server) = tokio::join!(calls, script);
    second.unwrap();
    assert!(client.is_ready());
    assert_eq!(client.connection().pending_requests(), 0);
}

#[tokio::test]
async fn oversized_outgoing_frame_fails_locally() {
    let config = Config::tcp("test").with_max_frame_size(256);
    let (client, mut server) = common::connect(config).await;

    let big = "x".repeat(1024);
    match client.call("echo", vec![Value::from(big)]).await.unwrap_err() {
        Error::FrameTooLarge { length, limit } => {
            assert!(length > limit);
            assert_eq!(limit, 256);
        }
        other => panic!("expected FrameTooLarge, got {other:?}"),
    }

    // Nothing hit the wire; the connection is still usable.
    let script = async move {
        let (_, sync, _) = server.read_request().await;
        server.respond_ok(sync, Value::Map(vec![])).await;
        server
    };
    let (ping, _server) = tokio::join!(client.ping(), script);
    ping.unwrap();
}

#[tokio::test]
async fn cancelled_caller_never_tears_a_frame() {
    // A 64-byte duplex parks the writer mid-frame on a 4 KB request.
    let (client, mut server) =
        common::connect_with_capacity(Config::tcp("test"), 64).await;

    let caller = client.clone();
    let abandoned = tokio::time::timeout(
        Duration::from_millis(50),
        caller.call("echo", vec![Value::from("x".repeat(4096))]),
    )
    .await;
    assert!(abandoned.is_err());
    assert!(client.is_ready());

    // The queued frame still reaches the server whole.
    let (request_type, sync, _body) = server.read_request().await;
    assert_eq!(request_type, 10);
    // Its late response lands in the abandoned slot and is discarded.
    server.respond_ok(sync, Value::Map(vec![])).await;

    let script = async move {
        let (_, sync, _) = server.read_request().await;
        server.respond_ok(sync, Value::Map(vec![])).await;
        server
    };
    let (ping, _server) = tokio::join!(client.ping(), script);
    ping.unwrap();
    assert_eq!(client.connection().pending_requests(), 0);
}

#[tokio::test]
async fn oversized_incoming_frame_closes_the_connection() {
    let config = Config::tcp("test").with_max_frame_size(256);
    let (client, mut server) = common::connect(config).await;

    let script = async move {
        server.read_request().await;
        // A length prefix far past the configured limit.
        server.write_bytes(&[0xce, 0x01, 0x00, 0x00, 0x00]).await;
        server
    };

    let (ping, _server) = tokio::join!(client.ping(), script);
    assert!(matches!(ping.unwrap_err(), Error::ConnectionClosed));
    assert_eq!(client.state(), ConnectionState::Closed);
}
