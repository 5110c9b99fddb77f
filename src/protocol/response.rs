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

//! Response body decoding.
//!
//! Decoders interpret success bodies into typed results: tuple arrays for
//! CRUD and call/eval, row sets with column metadata for SQL queries,
//! affected-row info for SQL updates, and statement descriptors for
//! prepare. Rows preserve the column order declared by the result
//! metadata; the positional and the by-name view of a row always agree on
//! that order.

use super::{body_key, field_key, sql_info_key};
use crate::codec::DecodeError;
use crate::error::{Error, Result};
use crate::value::Value;

fn shape(what: &'static str) -> Error {
    Error::MalformedResponse(DecodeError::UnexpectedShape(what))
}

/// One column of a result set or one bind parameter slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMeta {
    /// Column or parameter name.
    pub name: String,
    /// Declared type, e.g. `integer`, `string`, `ANY`.
    pub field_type: String,
}

fn decode_metadata(value: Option<&Value>) -> Result<Vec<ColumnMeta>> {
    let Some(value) = value else {
        return Ok(Vec::new());
    };
    let entries = value.as_array().ok_or_else(|| shape("metadata array"))?;
    entries
        .iter()
        .map(|entry| {
            entry.as_map().ok_or_else(|| shape("metadata column map"))?;
            Ok(ColumnMeta {
                name: entry
                    .get(field_key::NAME)
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_owned(),
                field_type: entry
                    .get(field_key::TYPE)
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_owned(),
            })
        })
        .collect()
}

/// One row of a [`SqlQueryResult`], viewable positionally or by column
/// name.
#[derive(Debug, Clone, Copy)]
pub struct Row<'a> {
    columns: &'a [ColumnMeta],
    values: &'a [Value],
}

impl<'a> Row<'a> {
    /// Value at `index`, in declared column order.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&'a Value> {
        self.values.get(index)
    }

    /// Value of the column named `name`, per the result metadata.
    #[must_use]
    pub fn by_name(&self, name: &str) -> Option<&'a Value> {
        let index = self.columns.iter().position(|c| c.name == name)?;
        self.values.get(index)
    }

    /// All values of the row in column order.
    #[must_use]
    pub fn values(&self) -> &'a [Value] {
        self.values
    }
}

/// Decoded result of a query-type SQL execution.
#[derive(Debug, Clone, PartialEq)]
pub struct SqlQueryResult {
    columns: Vec<ColumnMeta>,
    rows: Vec<Vec<Value>>,
}

impl SqlQueryResult {
    /// Declared result columns, in order.
    #[must_use]
    pub fn columns(&self) -> &[ColumnMeta] {
        &self.columns
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns `true` when the result set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Row at `index`, preserving server row order.
    #[must_use]
    pub fn row(&self, index: usize) -> Option<Row<'_>> {
        self.rows.get(index).map(|values| Row {
            columns: &self.columns,
            values,
        })
    }

    /// Iterates rows in server order.
    pub fn rows(&self) -> impl Iterator<Item = Row<'_>> {
        self.rows.iter().map(|values| Row {
            columns: &self.columns,
            values,
        })
    }

    /// Consumes the result into plain positional rows.
    #[must_use]
    pub fn into_rows(self) -> Vec<Vec<Value>> {
        self.rows
    }
}

/// Decoded result of an update-type SQL execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlUpdateResult {
    /// Number of rows the statement affected.
    pub row_count: u64,
    /// Ids generated by autoincrement columns, in insertion order.
    pub autoincrement_ids: Vec<i64>,
}

/// Decoded body of a successful prepare request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedReply {
    /// Server-side compiled statement id.
    pub statement_id: u64,
    /// Number of bind parameter slots.
    pub bind_count: u32,
    /// Metadata of the bind parameter slots.
    pub bind_metadata: Vec<ColumnMeta>,
    /// Metadata of the result columns.
    pub result_metadata: Vec<ColumnMeta>,
}

/// Decodes the `DATA` tuple array of CRUD and call/eval responses.
///
/// Calls and evaluations may return zero values; a missing `DATA` field
/// decodes as an empty array.
pub(crate) fn decode_data(body: Value) -> Result<Vec<Value>> {
    match body.get(body_key::DATA) {
        None => Ok(Vec::new()),
        Some(data) => Ok(data
            .as_array()
            .ok_or_else(|| shape("DATA array"))?
            .to_vec()),
    }
}

/// Decodes a query-type SQL response: metadata plus rows.
pub(crate) fn decode_query(body: Value) -> Result<SqlQueryResult> {
    let columns = decode_metadata(body.get(body_key::METADATA))?;
    let rows = body
        .get(body_key::DATA)
        .map(|data| {
            data.as_array()
                .ok_or_else(|| shape("DATA array"))?
                .iter()
                .map(|row| {
                    row.as_array()
                        .map(<[Value]>::to_vec)
                        .ok_or_else(|| shape("row array"))
                })
                .collect::<Result<Vec<_>>>()
        })
        .transpose()?
        .unwrap_or_default();
    Ok(SqlQueryResult { columns, rows })
}

/// Decodes an update-type SQL response from its `SQL_INFO` map.
pub(crate) fn decode_update(body: Value) -> Result<SqlUpdateResult> {
    let info = body
        .get(body_key::SQL_INFO)
        .ok_or_else(|| shape("SQL_INFO map"))?;
    let row_count = info
        .get(sql_info_key::ROW_COUNT)
        .and_then(Value::as_u64)
        .ok_or_else(|| shape("SQL_INFO row count"))?;
    let autoincrement_ids = info
        .get(sql_info_key::AUTOINCREMENT_IDS)
        .and_then(Value::as_array)
        .map(|ids| ids.iter().filter_map(Value::as_i64).collect())
        .unwrap_or_default();
    Ok(SqlUpdateResult {
        row_count,
        autoincrement_ids,
    })
}

/// Decodes a prepare response into a statement descriptor.
pub(crate) fn decode_prepare(body: Value) -> Result<PreparedReply> {
    let statement_id = body
        .get(body_key::STMT_ID)
        .and_then(Value::as_u64)
        .ok_or_else(|| shape("STMT_ID"))?;
    let bind_count = body
        .get(body_key::BIND_COUNT)
        .and_then(Value::as_u64)
        .unwrap_or(0) as u32;
    let bind_metadata = decode_metadata(body.get(body_key::BIND_METADATA))?;
    let result_metadata = decode_metadata(body.get(body_key::METADATA))?;
    Ok(PreparedReply {
        statement_id,
        bind_count,
        bind_metadata,
        result_metadata,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta_entry(name: &str, ty: &str) -> Value {
        Value::Map(vec![
            (Value::uint(field_key::NAME), Value::from(name)),
            (Value::uint(field_key::TYPE), Value::from(ty)),
        ])
    }

    fn query_body() -> Value {
        Value::Map(vec![
            (
                Value::uint(body_key::METADATA),
                Value::Array(vec![
                    meta_entry("id", "integer"),
                    meta_entry("name", "string"),
                ]),
            ),
            (
                Value::uint(body_key::DATA),
                Value::Array(vec![
                    Value::Array(vec![Value::Int(1), Value::from("foo")]),
                    Value::Array(vec![Value::Int(2), Value::from("bar")]),
                ]),
            ),
        ])
    }

    #[test]
    fn positional_and_named_views_agree_on_row_order() {
        let result = decode_query(query_body()).unwrap();
        assert_eq!(result.len(), 2);
        let row = result.row(1).unwrap();
        assert_eq!(row.get(0), Some(&Value::Int(2)));
        assert_eq!(row.by_name("id"), Some(&Value::Int(2)));
        assert_eq!(row.by_name("name"), Some(&Value::from("bar")));
        assert_eq!(row.by_name("missing"), None);
    }

    #[test]
    fn update_info_decodes_row_count_and_autoincrement_ids() {
        let body = Value::Map(vec![(
            Value::uint(body_key::SQL_INFO),
            Value::Map(vec![
                (Value::uint(sql_info_key::ROW_COUNT), Value::Int(1)),
                (
                    Value::uint(sql_info_key::AUTOINCREMENT_IDS),
                    Value::Array(vec![Value::Int(101)]),
                ),
            ]),
        )]);
        let result = decode_update(body).unwrap();
        assert_eq!(result.row_count, 1);
        assert_eq!(result.autoincrement_ids, vec![101]);
    }

    #[test]
    fn prepare_reply_decodes_descriptor_fields() {
        let body = Value::Map(vec![
            (Value::uint(body_key::STMT_ID), Value::Int(77)),
            (Value::uint(body_key::BIND_COUNT), Value::Int(1)),
            (
                Value::uint(body_key::BIND_METADATA),
                Value::Array(vec![meta_entry("?", "ANY")]),
            ),
            (
                Value::uint(body_key::METADATA),
                Value::Array(vec![meta_entry("COLUMN_1", "boolean")]),
            ),
        ]);
        let reply = decode_prepare(body).unwrap();
        assert_eq!(reply.statement_id, 77);
        assert_eq!(reply.bind_count, 1);
        assert_eq!(reply.bind_metadata[0].name, "?");
        assert_eq!(reply.result_metadata[0].field_type, "boolean");
    }

    #[test]
    fn missing_data_decodes_as_zero_returned_values() {
        assert!(decode_data(Value::Map(vec![])).unwrap().is_empty());
    }
}
