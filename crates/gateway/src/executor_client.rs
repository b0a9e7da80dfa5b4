// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The executor RPC surface (§4.4). Every operation returns `{responseCode,
//! details}`; any non-OK code raises [`ExecutorError`]. Each [`ExecutorClient`]
//! instance is **not** safe for concurrent use — callers must hold an
//! exclusive lock per instance (enforced by [`crate::connection_cache`]).

use async_trait::async_trait;
use es_core::{AgentId, AgentProfile, ClusterProfile, ExecutorJobSummary, Quota};
use es_core::bootstrap::TaskSpec;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Typed non-OK response from the executor (§4.4).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("executor error {code:?}: {}", messages.join("; "))]
pub struct ExecutorError {
    pub code: ExecutorErrorCode,
    pub messages: Vec<String>,
}

impl ExecutorError {
    pub fn new(code: ExecutorErrorCode, message: impl Into<String>) -> Self {
        Self { code, messages: vec![message.into()] }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExecutorErrorCode {
    InvalidRequest,
    Conflict,
    NotFound,
    Unavailable,
    Internal,
}

/// The latest task descriptor for an agent id (`getTaskHistory`, §4.4).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskDescriptor {
    pub status: String,
    pub events: Vec<TaskEvent>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskEvent {
    pub time_ms: u64,
    pub status: String,
    pub message: String,
}

/// One open connection to an executor instance. Not `Sync` by contract —
/// callers serialize access via a per-connection lock.
#[async_trait]
pub trait ExecutorClient: Send {
    /// `listJobs(role, env)`: ordered jobs matching the §4.1 name regex, filtered by `env`.
    async fn list_jobs(&mut self, role: &str, env: &str) -> Result<Vec<ExecutorJobSummary>, ExecutorError>;

    /// `getTaskHistory(id)`: fails if `id` is not found.
    async fn get_task_history(&mut self, id: &AgentId) -> Result<TaskDescriptor, ExecutorError>;

    /// `createJob(profile, agent, name, spec)`: idempotent w.r.t. (role, env, name);
    /// creating while one is alive fails with [`ExecutorErrorCode::Conflict`].
    async fn create_job(
        &mut self,
        cluster: &ClusterProfile,
        profile: &AgentProfile,
        agent_id: &AgentId,
        spec: &TaskSpec,
    ) -> Result<(), ExecutorError>;

    /// `killTasks(key, reason)`: accepted — does not imply tasks are dead yet.
    async fn kill_tasks(&mut self, agent_id: &AgentId, reason: &str) -> Result<(), ExecutorError>;

    /// `getQuota(role)`.
    async fn get_quota(&mut self, role: &str) -> Result<Quota, ExecutorError>;

    /// Whether the underlying connection is still usable.
    fn is_open(&self) -> bool;

    /// Mark this connection unusable after a raised RPC error (§4.4: "on any
    /// raised error the caller marks the connection dirty"). `is_open` must
    /// return `false` afterward so the gateway reopens on next use.
    fn mark_dirty(&mut self);
}

/// Opens connections for a given `executorUrl` (§4.4 connection cache).
#[async_trait]
pub trait ExecutorClientFactory: Send + Sync {
    async fn connect(&self, executor_url: &str) -> Result<Box<dyn ExecutorClient>, ExecutorError>;
}
