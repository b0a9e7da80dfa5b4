// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! es-gateway: the `ExecutorClient` and `CIServer` RPC gateway abstractions
//! (§4.4, §4.5) — cached/serialized connections and typed error surfaces.
//! The wire encoding (Thrift/JSON-over-HTTP) is an adapter's concern and is
//! deliberately not implemented here.

pub mod ci_server;
pub mod connection_cache;
pub mod executor_client;

#[cfg(any(test, feature = "test-support"))]
pub mod fakes;

pub use ci_server::{CIServer, CIServerError, ServerInfo};
pub use connection_cache::{Connection, ExecutorGateway};
pub use executor_client::{ExecutorClient, ExecutorClientFactory, ExecutorError, ExecutorErrorCode, TaskDescriptor, TaskEvent};
