// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Admission logic (§4.10): should a new agent be launched, and can an
//! existing one take a job.

use crate::agent_record::{AgentRecord, AgentState};
use crate::clock::Clock;
use crate::id::AgentId;
use crate::resources::ResourceVector;
use crate::scheduler_info::ClusterState;
use std::collections::BTreeMap;
use std::time::Duration;

const LAUNCH_DEDUP_WINDOW: Duration = Duration::from_secs(600);

/// Inputs to `requestNewAgent` (§4.10, §6 `create-agent`).
#[derive(Debug, Clone)]
pub struct NewAgentRequest {
    pub cluster_name: String,
    pub role: String,
    pub tag: String,
    pub env: String,
    pub job_id: String,
    pub resources: ResourceVector,
}

/// `shouldCreateAgent(req)` (§4.10).
///
/// De-duplicates in-flight launches for the same CI job, reuses an idle
/// running agent that already fits, and otherwise checks cluster quota.
pub fn should_create_agent(
    agents: &BTreeMap<AgentId, AgentRecord>,
    cluster: Option<&ClusterState>,
    req: &NewAgentRequest,
    clock: &impl Clock,
) -> bool {
    let already_launching = agents.values().any(|r| {
        r.launched_for.as_deref() == Some(req.job_id.as_str())
            && matches!(r.state, AgentState::Launching | AgentState::Pending | AgentState::Starting)
            && !r.stale(LAUNCH_DEDUP_WINDOW, clock)
    });
    if already_launching {
        return false;
    }

    let idle_fit_exists = agents.values().any(|r| {
        r.state == AgentState::Running
            && r.idle
            && r.environments.iter().any(|e| e == &req.env)
            && req.resources.satisfies(&r.resources)
    });
    if idle_fit_exists {
        return false;
    }

    if let Some(cluster) = cluster {
        if let Some(quota) = cluster.quota {
            if !quota.available_for(&req.resources) {
                return false;
            }
        }
    }

    true
}

/// `allocateAgentName(cluster, tag)` (§4.10): smallest non-negative `n` such
/// that `form(cluster, role, env, "tag-agent-n")` is not already a key.
pub fn allocate_agent_id(
    agents: &BTreeMap<AgentId, AgentRecord>,
    cluster_name: &str,
    role: &str,
    env: &str,
    tag: &str,
) -> AgentId {
    let mut n: u64 = 0;
    loop {
        let candidate = AgentId::form(cluster_name, role, env, format!("{tag}-agent-{n}"))
            .expect("tag is validated to [a-z]+ before allocation");
        if !agents.contains_key(&candidate) {
            return candidate;
        }
        n += 1;
    }
}

/// `shouldAssignWork(profile, agentId)` (§4.10): the sole synchronous
/// read path, taken against a snapshot by the caller.
pub fn should_assign_work(
    agents: &BTreeMap<AgentId, AgentRecord>,
    agent_id: &AgentId,
    required: &ResourceVector,
) -> bool {
    match agents.get(agent_id) {
        Some(record) => required.satisfies(&record.resources),
        None => false,
    }
}
