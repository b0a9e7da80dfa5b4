// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Test builders shared across crates (gated behind `test-support`).

use crate::agent_record::{AgentRecord, AgentState};
use crate::clock::Clock;
use crate::id::AgentId;
use crate::profile::{AgentProfile, ClusterProfile};
use crate::scheduler_info::{AgentConfigState, CIAgentInfo, CIAgentState, ExecutorJobSummary};

/// Builds a [`ClusterProfile`] with sane test defaults.
pub struct ClusterProfileBuilder {
    executor_url: String,
    cluster_name: String,
    role: String,
    env: String,
    server_api_url: String,
    agent_source_url: Option<String>,
}

impl Default for ClusterProfileBuilder {
    fn default() -> Self {
        Self {
            executor_url: "http://executor.test/api".into(),
            cluster_name: "aws-dev".into(),
            role: "www".into(),
            env: "prod".into(),
            server_api_url: "http://ci.test/go".into(),
            agent_source_url: Some("http://ci.test/agent.zip".into()),
        }
    }
}

impl ClusterProfileBuilder {
    pub fn cluster_name(mut self, v: impl Into<String>) -> Self {
        self.cluster_name = v.into();
        self
    }

    pub fn build(self) -> ClusterProfile {
        ClusterProfile {
            executor_url: self.executor_url,
            cluster_name: self.cluster_name,
            role: self.role,
            env: self.env,
            server_api_url: self.server_api_url,
            agent_source_url: self.agent_source_url,
        }
    }
}

/// Builds an [`AgentProfile`] with sane test defaults.
pub struct AgentProfileBuilder {
    id: String,
    tag: String,
    environments: Option<Vec<String>>,
    cpu: Option<String>,
    ram: Option<String>,
    disk: Option<String>,
    init_script: Option<String>,
}

impl Default for AgentProfileBuilder {
    fn default() -> Self {
        Self {
            id: "build".into(),
            tag: "build".into(),
            environments: Some(vec!["prod".into()]),
            cpu: Some("1.0".into()),
            ram: Some("1024".into()),
            disk: Some("1024".into()),
            init_script: None,
        }
    }
}

impl AgentProfileBuilder {
    pub fn tag(mut self, v: impl Into<String>) -> Self {
        self.tag = v.into();
        self
    }

    pub fn build(self) -> AgentProfile {
        AgentProfile {
            id: self.id,
            tag: self.tag,
            environments: self.environments,
            cpu: self.cpu,
            ram: self.ram,
            disk: self.disk,
            init_script: self.init_script,
        }
    }
}

/// Build an [`AgentRecord`] in the given state with test defaults.
pub fn agent_record(agent_id: AgentId, state: AgentState, clock: &impl Clock) -> AgentRecord {
    AgentRecord::init(agent_id, state, &AgentProfileBuilder::default().build(), "prod", None, clock, "test fixture")
}

/// Build an [`ExecutorJobSummary`] with the given pending/active counts.
pub fn executor_job(agent_id: AgentId, pending: u32, active: u32) -> ExecutorJobSummary {
    ExecutorJobSummary { agent_id, pending, active, failed: 0, finished: 0 }
}

/// Build a [`CIAgentInfo`] in the given config/agent state.
pub fn ci_agent(agent_id: AgentId, config_state: AgentConfigState, agent_state: CIAgentState) -> CIAgentInfo {
    CIAgentInfo { agent_id, config_state, agent_state }
}
