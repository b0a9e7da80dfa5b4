// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Read-only views sourced from the executor and CI server, plus the mutable
//! per-cluster entry the store keeps alongside them (§3).

use crate::id::AgentId;
use crate::resources::Quota;
use serde::{Deserialize, Serialize};

/// Per-cluster mutable entry (§3). Created when a profile is first seen,
/// updated by quota probes, destroyed when the profile disappears.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterState {
    pub executor_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quota: Option<Quota>,
}

impl ClusterState {
    pub fn new(executor_url: impl Into<String>) -> Self {
        Self { executor_url: executor_url.into(), quota: None }
    }
}

/// Read-only summary of a job as reported by the executor (§3).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutorJobSummary {
    pub agent_id: AgentId,
    pub pending: u32,
    pub active: u32,
    pub failed: u32,
    pub finished: u32,
}

impl ExecutorJobSummary {
    /// `alive(j) = j.pending + j.active > 0`.
    pub fn alive(&self) -> bool {
        self.pending + self.active > 0
    }

    /// `active(j) = j.active > 0`.
    pub fn is_active(&self) -> bool {
        self.active > 0
    }

    /// `pending(j) = j.pending > 0`.
    pub fn is_pending(&self) -> bool {
        self.pending > 0
    }
}

/// CI-server `configState` for an agent registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum AgentConfigState {
    Enabled,
    Disabled,
}

/// CI-server `agentState` for an agent registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum CIAgentState {
    Idle,
    Building,
    Missing,
    LostContact,
    Disabled,
}

/// Read-only view of an agent's registration as reported by the CI server (§3).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CIAgentInfo {
    pub agent_id: AgentId,
    pub config_state: AgentConfigState,
    pub agent_state: CIAgentState,
}

impl CIAgentInfo {
    /// `registered(c) = c.configState=Enabled ∧ c.agentState ∉ {Missing, LostContact}`.
    pub fn registered(&self) -> bool {
        self.config_state == AgentConfigState::Enabled
            && !matches!(self.agent_state, CIAgentState::Missing | CIAgentState::LostContact)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id() -> AgentId {
        AgentId::form("c", "r", "e", "build-agent-0").unwrap()
    }

    #[test]
    fn job_alive_iff_pending_or_active() {
        let job = ExecutorJobSummary { agent_id: id(), pending: 0, active: 0, failed: 0, finished: 1 };
        assert!(!job.alive());
        let job = ExecutorJobSummary { agent_id: id(), pending: 1, active: 0, failed: 0, finished: 0 };
        assert!(job.alive());
    }

    #[test]
    fn registered_requires_enabled_and_not_missing() {
        let info = CIAgentInfo { agent_id: id(), config_state: AgentConfigState::Enabled, agent_state: CIAgentState::Idle };
        assert!(info.registered());
        let info = CIAgentInfo { agent_id: id(), config_state: AgentConfigState::Enabled, agent_state: CIAgentState::Missing };
        assert!(!info.registered());
        let info = CIAgentInfo { agent_id: id(), config_state: AgentConfigState::Disabled, agent_state: CIAgentState::Idle };
        assert!(!info.registered());
    }
}
