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

#![doc = include_str!("../README.md")]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

//! # Architecture
//!
//! The crate is organized in layers, lowest first:
//!
//! - **[`value`]**: the self-describing value model exchanged with the
//!   server
//! - **[`codec`]**: MessagePack encoding strategies for values
//! - **[`frame`]**: length-prefixed frames carrying a header and body map
//! - **[`transport`]**: raw duplex byte streams (TCP, unix, in-memory)
//! - **[`connection`]**: handshake, authentication and the request
//!   multiplexer
//! - **[`protocol`]**: request builders, response decoders and server
//!   error decoding
//! - **[`client`]** / **[`statement`]**: the typed surface callers use
//!
//! Most callers only need [`Client`], [`Config`] and [`Value`].

pub mod client;
pub mod codec;
pub mod connection;
pub mod error;
pub mod frame;
pub mod protocol;
pub mod statement;
pub mod transport;
pub mod value;

pub use client::Client;
pub use connection::{CodecKind, Config, Connection, ConnectionState, ServerAddr};
pub use error::{Error, Result};
pub use statement::PreparedStatement;
pub use value::Value;
