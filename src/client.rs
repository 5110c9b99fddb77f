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

//! The typed request surface.
//!
//! [`Client`] wraps a [`Connection`] with one method per protocol
//! operation: ping, call/eval, SQL execution (direct and prepared) and
//! the tuple-space CRUD requests. It is `Clone`; every clone shares the
//! same connection and requests from any clone are pipelined together.

use crate::connection::{Config, Connection, ConnectionState};
use crate::error::Result;
use crate::protocol::{
    BindParam, PreparedReply, SelectOptions, SqlQueryResult, SqlUpdateResult, decode_data,
    decode_prepare, decode_query, decode_update, requests, RawRequest,
};
use crate::statement::PreparedStatement;
use crate::transport::Transport;
use crate::value::Value;

/// Typed client over one multiplexed connection.
///
/// # Example
///
/// ```rust,no_run
/// use tarantool_client::{Client, Config};
/// use tarantool_client::protocol::BindParam;
///
/// # async fn example() -> tarantool_client::Result<()> {
/// let client = Client::connect(
///     Config::tcp("127.0.0.1:3301").with_credentials("appuser", "s3cret"),
/// )
/// .await?;
///
/// client.ping().await?;
/// let rows = client
///     .execute_query("SELECT id, name FROM users WHERE id = ?", &[BindParam::pos(1)])
///     .await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Client {
    conn: Connection,
}

impl Client {
    /// Connects and authenticates per `config`.
    pub async fn connect(config: Config) -> Result<Self> {
        Ok(Self {
            conn: Connection::connect(config).await?,
        })
    }

    /// Runs the handshake over an already-open transport.
    pub async fn establish<T: Transport>(transport: T, config: &Config) -> Result<Self> {
        Ok(Self {
            conn: Connection::establish(transport, config).await?,
        })
    }

    /// The underlying connection.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Current lifecycle state of the connection.
    pub fn state(&self) -> ConnectionState {
        self.conn.state()
    }

    /// Whether the connection currently accepts requests.
    pub fn is_ready(&self) -> bool {
        self.conn.is_ready()
    }

    /// Version string from the server greeting.
    pub fn server_version(&self) -> &str {
        self.conn.server_version()
    }

    /// Closes the connection; all pending requests fail.
    pub async fn close(&self) {
        self.conn.close().await;
    }

    /// Sends a raw request and decodes the response body with `decoder`.
    ///
    /// Escape hatch for operations without a dedicated method; the typed
    /// methods below all route through the same path.
    pub async fn send<T>(
        &self,
        request_type: u64,
        body: Value,
        decoder: impl FnOnce(Value) -> Result<T>,
    ) -> Result<T> {
        let body = self.conn.request(RawRequest { request_type, body }).await?;
        decoder(body)
    }

    /// Round-trip liveness probe.
    pub async fn ping(&self) -> Result<()> {
        self.conn.request(requests::ping()).await?;
        Ok(())
    }

    /// Calls a stored function, returning its result tuples.
    pub async fn call(&self, function: &str, args: Vec<Value>) -> Result<Vec<Value>> {
        let body = self.conn.request(requests::call(function, args)).await?;
        decode_data(body)
    }

    /// Evaluates a Lua expression server-side.
    pub async fn evaluate(&self, expression: &str, args: Vec<Value>) -> Result<Vec<Value>> {
        let body = self.conn.request(requests::eval(expression, args)).await?;
        decode_data(body)
    }

    /// Executes SQL text directly and decodes a row-returning response.
    pub async fn execute_query(&self, sql: &str, params: &[BindParam]) -> Result<SqlQueryResult> {
        let request = requests::execute_sql(sql, params)?;
        let body = self.conn.request(request).await?;
        decode_query(body)
    }

    /// Executes SQL text directly and decodes a row-count response.
    pub async fn execute_update(&self, sql: &str, params: &[BindParam]) -> Result<SqlUpdateResult> {
        let request = requests::execute_sql(sql, params)?;
        let body = self.conn.request(request).await?;
        decode_update(body)
    }

    /// Compiles `sql` server-side and returns a reusable handle.
    pub async fn prepare(&self, sql: &str) -> Result<PreparedStatement> {
        let body = self.conn.request(requests::prepare(sql)).await?;
        let reply: PreparedReply = decode_prepare(body)?;
        Ok(PreparedStatement::new(self.conn.clone(), reply))
    }

    /// Reads tuples from a space by index key.
    pub async fn select(
        &self,
        space_id: u64,
        index_id: u64,
        key: Vec<Value>,
        options: SelectOptions,
    ) -> Result<Vec<Value>> {
        let body = self
            .conn
            .request(requests::select(space_id, index_id, key, options))
            .await?;
        decode_data(body)
    }

    /// Inserts a tuple; fails if the primary key already exists.
    pub async fn insert(&self, space_id: u64, tuple: Vec<Value>) -> Result<Vec<Value>> {
        let body = self.conn.request(requests::insert(space_id, tuple)).await?;
        decode_data(body)
    }

    /// Inserts or overwrites a tuple.
    pub async fn replace(&self, space_id: u64, tuple: Vec<Value>) -> Result<Vec<Value>> {
        let body = self
            .conn
            .request(requests::replace(space_id, tuple))
            .await?;
        decode_data(body)
    }

    /// Applies update operations to the tuple matching `key`.
    pub async fn update(
        &self,
        space_id: u64,
        index_id: u64,
        key: Vec<Value>,
        ops: Vec<Value>,
    ) -> Result<Vec<Value>> {
        let body = self
            .conn
            .request(requests::update(space_id, index_id, key, ops))
            .await?;
        decode_data(body)
    }

    /// Deletes the tuple matching `key`.
    pub async fn delete(
        &self,
        space_id: u64,
        index_id: u64,
        key: Vec<Value>,
    ) -> Result<Vec<Value>> {
        let body = self
            .conn
            .request(requests::delete(space_id, index_id, key))
            .await?;
        decode_data(body)
    }

    /// Updates the matching tuple, or inserts `tuple` if none matches.
    pub async fn upsert(&self, space_id: u64, tuple: Vec<Value>, ops: Vec<Value>) -> Result<()> {
        self.conn
            .request(requests::upsert(space_id, tuple, ops))
            .await?;
        Ok(())
    }
}
