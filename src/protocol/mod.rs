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

//! IPROTO protocol definitions.
//!
//! Numeric constants, the greeting parser, the chap-sha1 scramble, request
//! builders and response decoders. The constants are the documented wire
//! values and must stay bit-for-bit compatible with what a conforming
//! server expects and emits.

mod auth;
mod greeting;
mod request;
mod response;
mod server_error;

pub use auth::scramble;
pub use greeting::{GREETING_SIZE, Greeting, SALT_SIZE};
pub use request::{BindParam, IteratorType, SelectOptions, bind_params_to_value};
pub(crate) use request::{RawRequest, requests};
pub use response::{ColumnMeta, PreparedReply, Row, SqlQueryResult, SqlUpdateResult};
pub(crate) use response::{decode_data, decode_prepare, decode_query, decode_update};
pub use server_error::{CauseFrame, ServerError};

/// Request type codes (header key [`header_key::REQUEST_TYPE`]).
pub mod request_type {
    /// Select tuples from a space.
    pub const SELECT: u64 = 1;
    /// Insert a tuple.
    pub const INSERT: u64 = 2;
    /// Replace a tuple.
    pub const REPLACE: u64 = 3;
    /// Update a tuple with an operations list.
    pub const UPDATE: u64 = 4;
    /// Delete a tuple.
    pub const DELETE: u64 = 5;
    /// Authenticate with a chap-sha1 scramble.
    pub const AUTH: u64 = 7;
    /// Evaluate a Lua expression.
    pub const EVAL: u64 = 8;
    /// Update-or-insert.
    pub const UPSERT: u64 = 9;
    /// Call a stored function.
    pub const CALL: u64 = 10;
    /// Execute SQL, either direct text or a prepared statement id.
    pub const EXECUTE: u64 = 11;
    /// Prepare (or deallocate, when re-sent with a statement id) SQL.
    pub const PREPARE: u64 = 13;
    /// Ping.
    pub const PING: u64 = 64;
}

/// Header map keys.
pub mod header_key {
    /// Request type on requests; response code on responses.
    pub const REQUEST_TYPE: u64 = 0x00;
    /// Per-request correlation identifier.
    pub const SYNC: u64 = 0x01;
    /// Schema version, attached by the server.
    pub const SCHEMA_VERSION: u64 = 0x05;
}

/// Body map keys.
pub mod body_key {
    /// Target space id.
    pub const SPACE_ID: u64 = 0x10;
    /// Target index id.
    pub const INDEX_ID: u64 = 0x11;
    /// Select limit.
    pub const LIMIT: u64 = 0x12;
    /// Select offset.
    pub const OFFSET: u64 = 0x13;
    /// Select iterator type.
    pub const ITERATOR: u64 = 0x14;
    /// Key tuple.
    pub const KEY: u64 = 0x20;
    /// Data tuple / auth tuple / call arguments.
    pub const TUPLE: u64 = 0x21;
    /// Stored function name.
    pub const FUNCTION_NAME: u64 = 0x22;
    /// User name for auth.
    pub const USER_NAME: u64 = 0x23;
    /// Lua expression text.
    pub const EXPR: u64 = 0x27;
    /// Update/upsert operations array.
    pub const OPS: u64 = 0x28;
    /// Response payload rows/tuples.
    pub const DATA: u64 = 0x30;
    /// Plain error message (pre-2.4 format, always present).
    pub const ERROR_24: u64 = 0x31;
    /// Result-set column metadata.
    pub const METADATA: u64 = 0x32;
    /// Bind parameter metadata of a prepared statement.
    pub const BIND_METADATA: u64 = 0x33;
    /// Bind parameter count of a prepared statement.
    pub const BIND_COUNT: u64 = 0x34;
    /// SQL statement text.
    pub const SQL_TEXT: u64 = 0x40;
    /// SQL bind parameters.
    pub const SQL_BIND: u64 = 0x41;
    /// SQL execution info map.
    pub const SQL_INFO: u64 = 0x42;
    /// Prepared statement id.
    pub const STMT_ID: u64 = 0x43;
    /// Extended stacked error (Tarantool >= 2.4.1).
    pub const ERROR: u64 = 0x52;
}

/// Keys inside the [`body_key::SQL_INFO`] map.
pub mod sql_info_key {
    /// Number of affected rows.
    pub const ROW_COUNT: u64 = 0x00;
    /// Ids generated by autoincrement columns.
    pub const AUTOINCREMENT_IDS: u64 = 0x01;
}

/// Keys inside one [`body_key::METADATA`] column map.
pub mod field_key {
    /// Column name.
    pub const NAME: u64 = 0x00;
    /// Declared column type.
    pub const TYPE: u64 = 0x01;
}

/// Response code of a successful request.
pub const RESPONSE_OK: u64 = 0x00;

/// Bit set on the response code of a failed request; the remaining bits
/// are the server error code.
pub const RESPONSE_ERROR_FLAG: u64 = 0x8000;
