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

//! Prepared statement handles.
//!
//! A [`PreparedStatement`] is a client-side handle to a server-side
//! compiled statement id. The server tracks the same id independently,
//! so the two can diverge: the server may evict the statement out of
//! band, and any operation on an id it no longer recognizes comes back
//! as [`Error::RequestFailed`] naming the missing id. The handle only
//! tracks its own `closed` flag, and once set, every further use fails
//! fast with [`Error::AlreadyClosed`] without touching the network.

use crate::connection::Connection;
use crate::error::{Error, Result};
use crate::protocol::{
    BindParam, ColumnMeta, PreparedReply, SqlQueryResult, SqlUpdateResult, decode_query,
    decode_update, requests,
};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::debug;

/// Handle to a server-side prepared statement.
///
/// Created by [`Client::prepare`](crate::Client::prepare). Executing is
/// safe from any number of callers concurrently; `close` is a one-shot
/// transition and must not race a concurrent `execute` on the same
/// handle without external synchronization.
pub struct PreparedStatement {
    conn: Connection,
    statement_id: u64,
    bind_count: u32,
    bind_metadata: Vec<ColumnMeta>,
    result_metadata: Vec<ColumnMeta>,
    closed: AtomicBool,
}

impl PreparedStatement {
    pub(crate) fn new(conn: Connection, reply: PreparedReply) -> Self {
        Self {
            conn,
            statement_id: reply.statement_id,
            bind_count: reply.bind_count,
            bind_metadata: reply.bind_metadata,
            result_metadata: reply.result_metadata,
            closed: AtomicBool::new(false),
        }
    }

    /// Server-assigned statement id.
    pub fn statement_id(&self) -> u64 {
        self.statement_id
    }

    /// Number of bind parameter slots in the statement text.
    pub fn bind_count(&self) -> u32 {
        self.bind_count
    }

    /// Metadata for the bind parameter slots, in slot order.
    pub fn bind_metadata(&self) -> &[ColumnMeta] {
        &self.bind_metadata
    }

    /// Metadata for the result columns, in column order.
    pub fn result_metadata(&self) -> &[ColumnMeta] {
        &self.result_metadata
    }

    /// Whether [`close`](Self::close) has already run on this handle.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    fn ensure_open(&self) -> Result<()> {
        if self.is_closed() {
            return Err(Error::AlreadyClosed(self.statement_id));
        }
        Ok(())
    }

    /// Executes the statement and decodes a row-returning response.
    ///
    /// # Errors
    ///
    /// Fails locally with [`Error::AlreadyClosed`] on a closed handle or
    /// [`Error::InvalidArguments`] for mixed positional/named parameters,
    /// before anything is sent.
    pub async fn execute_query(&self, params: &[BindParam]) -> Result<SqlQueryResult> {
        self.ensure_open()?;
        let request = requests::execute_prepared(self.statement_id, params)?;
        let body = self.conn.request(request).await?;
        decode_query(body)
    }

    /// Executes the statement and decodes a row-count response.
    ///
    /// Use this for INSERT/UPDATE/DELETE statements; the result carries
    /// the affected row count and any autoincrement ids.
    pub async fn execute_update(&self, params: &[BindParam]) -> Result<SqlUpdateResult> {
        self.ensure_open()?;
        let request = requests::execute_prepared(self.statement_id, params)?;
        let body = self.conn.request(request).await?;
        decode_update(body)
    }

    /// Deallocates the server-side statement.
    ///
    /// The local handle is marked closed before the request is sent, so
    /// the transition is irreversible even if the deallocation itself
    /// fails. A second `close` fails with [`Error::AlreadyClosed`]
    /// without a round trip.
    pub async fn close(&self) -> Result<()> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Err(Error::AlreadyClosed(self.statement_id));
        }
        debug!(statement_id = self.statement_id, "deallocating statement");
        self.conn
            .request(requests::deallocate(self.statement_id))
            .await?;
        Ok(())
    }
}

impl std::fmt::Debug for PreparedStatement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreparedStatement")
            .field("statement_id", &self.statement_id)
            .field("bind_count", &self.bind_count)
            .field("closed", &self.is_closed())
            .finish()
    }
}
