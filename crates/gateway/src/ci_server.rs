// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The CI-server RPC surface (§4.5). Safe for concurrent use — the CI
//! server multiplexes; unlike [`crate::executor_client::ExecutorClient`]
//! there is no per-instance exclusive lock.

use async_trait::async_trait;
use es_core::{AgentId, CIAgentInfo};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("CI server error: {}", messages.join("; "))]
pub struct CIServerError {
    pub messages: Vec<String>,
}

impl CIServerError {
    pub fn new(message: impl Into<String>) -> Self {
        Self { messages: vec![message.into()] }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerInfo {
    pub version: String,
}

/// Four blocking operations the CI server exposes to the plugin (§4.5).
#[async_trait]
pub trait CIServer: Send + Sync {
    async fn get_server_info(&self) -> Result<ServerInfo, CIServerError>;

    /// All agent registrations tagged to this plugin.
    async fn list_agents(&self) -> Result<Vec<CIAgentInfo>, CIServerError>;

    async fn disable_agents(&self, ids: &[AgentId]) -> Result<(), CIServerError>;

    /// Requires each agent to already be `Disabled` — the CI server rejects
    /// otherwise; the state machine guarantees that ordering (§4.5).
    async fn delete_agents(&self, ids: &[AgentId]) -> Result<(), CIServerError>;
}
