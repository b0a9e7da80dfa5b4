// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The request/response framing boundary (§1, §6). Bytes in, bytes out: how
//! the embedding process receives a request name and body from the CI
//! server's plugin ABI, and how it writes the response and status code
//! back, is explicitly out of scope — left here as a trait with no
//! implementation.

use async_trait::async_trait;

/// One inbound RPC as the transport decoded it: a request-name string and a
/// raw JSON body, plus whatever status code the transport wants to send back
/// for a given outcome.
#[async_trait]
pub trait PluginTransport: Send + Sync {
    async fn recv(&mut self) -> Option<(String, String)>;

    async fn send(&mut self, status_code: u16, body: String);
}
