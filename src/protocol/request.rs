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

//! Request builders.
//!
//! One builder per operation, each producing the numeric request type and
//! the body map with the documented field keys. Builders perform the local
//! validation that must happen before any network I/O: in particular,
//! mixing positional and named SQL bind parameters in one call is rejected
//! with an invalid-arguments error, no frame sent.

use super::{body_key, request_type};
use crate::error::{Error, Result};
use crate::value::Value;

/// A fully built request: type code plus body map.
#[derive(Debug, Clone)]
pub(crate) struct RawRequest {
    pub request_type: u64,
    pub body: Value,
}

/// One SQL bind parameter, positional or named.
///
/// Positional parameters bind `?` placeholders in order; named parameters
/// bind `:name` placeholders by key. A single execution must use one style
/// only. Every execution is fully parameterized from its own arguments:
/// named parameters omitted in a call bind to null, never to a previously
/// bound value.
///
/// # Examples
///
/// ```rust
/// use tarantool_client::protocol::BindParam;
///
/// let positional = BindParam::pos(42);
/// let named = BindParam::named("a", 1); // ":a" and "a" are equivalent
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum BindParam {
    /// Bind the next `?` placeholder.
    Positional(Value),
    /// Bind the `:name` placeholder.
    Named(String, Value),
}

impl BindParam {
    /// Creates a positional parameter.
    pub fn pos(value: impl Into<Value>) -> Self {
        BindParam::Positional(value.into())
    }

    /// Creates a named parameter. A leading `:` is optional.
    pub fn named(name: impl AsRef<str>, value: impl Into<Value>) -> Self {
        let name = name.as_ref();
        let key = if name.starts_with(':') {
            name.to_owned()
        } else {
            format!(":{name}")
        };
        BindParam::Named(key, value.into())
    }
}

/// Encodes bind parameters into the `SQL_BIND` array.
///
/// Positional values are carried directly; each named parameter becomes a
/// single-entry map `{":name": value}`, which is what the server expects.
///
/// # Errors
///
/// Returns [`Error::InvalidArguments`] when both styles appear in one
/// parameter list.
pub fn bind_params_to_value(params: &[BindParam]) -> Result<Value> {
    let has_positional = params
        .iter()
        .any(|p| matches!(p, BindParam::Positional(_)));
    let has_named = params.iter().any(|p| matches!(p, BindParam::Named(..)));
    if has_positional && has_named {
        return Err(Error::InvalidArguments(
            "cannot mix positional and named bind parameters in one execution".into(),
        ));
    }
    let items = params
        .iter()
        .map(|p| match p {
            BindParam::Positional(value) => value.clone(),
            BindParam::Named(name, value) => {
                Value::Map(vec![(Value::Str(name.clone()), value.clone())])
            }
        })
        .collect();
    Ok(Value::Array(items))
}

/// Iterator types for select requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[allow(missing_docs)]
pub enum IteratorType {
    #[default]
    Eq,
    ReverseEq,
    All,
    Lt,
    Le,
    Ge,
    Gt,
}

impl IteratorType {
    fn code(self) -> u64 {
        match self {
            IteratorType::Eq => 0,
            IteratorType::ReverseEq => 1,
            IteratorType::All => 2,
            IteratorType::Lt => 3,
            IteratorType::Le => 4,
            IteratorType::Ge => 5,
            IteratorType::Gt => 6,
        }
    }
}

/// Options of a select request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectOptions {
    /// Maximum number of tuples to return.
    pub limit: u32,
    /// Number of tuples to skip.
    pub offset: u32,
    /// Iteration order relative to the key.
    pub iterator: IteratorType,
}

impl Default for SelectOptions {
    fn default() -> Self {
        Self {
            limit: u32::MAX,
            offset: 0,
            iterator: IteratorType::default(),
        }
    }
}

fn body(pairs: Vec<(u64, Value)>) -> Value {
    Value::Map(pairs.into_iter().map(|(k, v)| (Value::uint(k), v)).collect())
}

/// The per-operation builders.
pub(crate) mod requests {
    use super::*;

    pub fn ping() -> RawRequest {
        RawRequest {
            request_type: request_type::PING,
            body: body(vec![]),
        }
    }

    pub fn auth(username: &str, scramble: &[u8]) -> RawRequest {
        RawRequest {
            request_type: request_type::AUTH,
            body: body(vec![
                (body_key::USER_NAME, Value::from(username)),
                (
                    body_key::TUPLE,
                    Value::Array(vec![
                        Value::from("chap-sha1"),
                        Value::Bin(scramble.to_vec()),
                    ]),
                ),
            ]),
        }
    }

    pub fn call(function: &str, args: Vec<Value>) -> RawRequest {
        RawRequest {
            request_type: request_type::CALL,
            body: body(vec![
                (body_key::FUNCTION_NAME, Value::from(function)),
                (body_key::TUPLE, Value::Array(args)),
            ]),
        }
    }

    pub fn eval(expression: &str, args: Vec<Value>) -> RawRequest {
        RawRequest {
            request_type: request_type::EVAL,
            body: body(vec![
                (body_key::EXPR, Value::from(expression)),
                (body_key::TUPLE, Value::Array(args)),
            ]),
        }
    }

    pub fn prepare(sql: &str) -> RawRequest {
        RawRequest {
            request_type: request_type::PREPARE,
            body: body(vec![(body_key::SQL_TEXT, Value::from(sql))]),
        }
    }

    /// Deallocation is a prepare request keyed by statement id instead of
    /// SQL text.
    pub fn deallocate(statement_id: u64) -> RawRequest {
        RawRequest {
            request_type: request_type::PREPARE,
            body: body(vec![(body_key::STMT_ID, Value::uint(statement_id))]),
        }
    }

    pub fn execute_prepared(statement_id: u64, params: &[BindParam]) -> Result<RawRequest> {
        Ok(RawRequest {
            request_type: request_type::EXECUTE,
            body: body(vec![
                (body_key::STMT_ID, Value::uint(statement_id)),
                (body_key::SQL_BIND, bind_params_to_value(params)?),
            ]),
        })
    }

    /// One-shot, non-prepared execution carrying the raw SQL text.
    pub fn execute_sql(sql: &str, params: &[BindParam]) -> Result<RawRequest> {
        Ok(RawRequest {
            request_type: request_type::EXECUTE,
            body: body(vec![
                (body_key::SQL_TEXT, Value::from(sql)),
                (body_key::SQL_BIND, bind_params_to_value(params)?),
            ]),
        })
    }

    pub fn select(
        space_id: u64,
        index_id: u64,
        key: Vec<Value>,
        options: SelectOptions,
    ) -> RawRequest {
        RawRequest {
            request_type: request_type::SELECT,
            body: body(vec![
                (body_key::SPACE_ID, Value::uint(space_id)),
                (body_key::INDEX_ID, Value::uint(index_id)),
                (body_key::LIMIT, Value::from(options.limit)),
                (body_key::OFFSET, Value::from(options.offset)),
                (body_key::ITERATOR, Value::uint(options.iterator.code())),
                (body_key::KEY, Value::Array(key)),
            ]),
        }
    }

    pub fn insert(space_id: u64, tuple: Vec<Value>) -> RawRequest {
        RawRequest {
            request_type: request_type::INSERT,
            body: body(vec![
                (body_key::SPACE_ID, Value::uint(space_id)),
                (body_key::TUPLE, Value::Array(tuple)),
            ]),
        }
    }

    pub fn replace(space_id: u64, tuple: Vec<Value>) -> RawRequest {
        RawRequest {
            request_type: request_type::REPLACE,
            body: body(vec![
                (body_key::SPACE_ID, Value::uint(space_id)),
                (body_key::TUPLE, Value::Array(tuple)),
            ]),
        }
    }

    pub fn update(space_id: u64, index_id: u64, key: Vec<Value>, ops: Vec<Value>) -> RawRequest {
        RawRequest {
            request_type: request_type::UPDATE,
            body: body(vec![
                (body_key::SPACE_ID, Value::uint(space_id)),
                (body_key::INDEX_ID, Value::uint(index_id)),
                (body_key::KEY, Value::Array(key)),
                (body_key::OPS, Value::Array(ops)),
            ]),
        }
    }

    pub fn delete(space_id: u64, index_id: u64, key: Vec<Value>) -> RawRequest {
        RawRequest {
            request_type: request_type::DELETE,
            body: body(vec![
                (body_key::SPACE_ID, Value::uint(space_id)),
                (body_key::INDEX_ID, Value::uint(index_id)),
                (body_key::KEY, Value::Array(key)),
            ]),
        }
    }

    pub fn upsert(space_id: u64, tuple: Vec<Value>, ops: Vec<Value>) -> RawRequest {
        RawRequest {
            request_type: request_type::UPSERT,
            body: body(vec![
                (body_key::SPACE_ID, Value::uint(space_id)),
                (body_key::TUPLE, Value::Array(tuple)),
                (body_key::OPS, Value::Array(ops)),
            ]),
        }
    }
}
