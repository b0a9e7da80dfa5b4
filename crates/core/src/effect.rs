// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Effects represent side-effecting actions the state machine wants
//! performed, tagged by type (§4.7). Effects are plain data — never closures
//! over the store — so they can be handed off to worker tasks and executed
//! off the writer thread (§4.8, §9).

use crate::agent_record::AgentState;
use crate::id::AgentId;
use crate::profile::{AgentProfile, ClusterProfile};
use serde::{Deserialize, Serialize};

/// The four effect tags named in §4.7.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectKind {
    CreateExecutorJob,
    KillExecutorJob,
    DisableCIAgent,
    DeleteCIAgent,
}

impl std::fmt::Display for EffectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::CreateExecutorJob => "create_executor_job",
            Self::KillExecutorJob => "kill_executor_job",
            Self::DisableCIAgent => "disable_ci_agent",
            Self::DeleteCIAgent => "delete_ci_agent",
        };
        f.write_str(s)
    }
}

/// `(state, message)` follow-up applied to the record once an effect
/// finishes (§4.7, §4.8). The dispatcher is the only component that knows
/// how to re-enter the writer with one of these.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectOutcome {
    pub state: AgentState,
    pub message: String,
}

impl EffectOutcome {
    pub fn new(state: AgentState, message: impl Into<String>) -> Self {
        Self { state, message: message.into() }
    }
}

/// Side effects dispatched by the state machine (§4.7).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Effect {
    /// Emitted by `requestNewAgent`, outside the ping loop (§4.8).
    CreateExecutorJob {
        agent_id: AgentId,
        cluster: ClusterProfile,
        profile: AgentProfile,
        env: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        job_id: Option<String>,
        /// The CI server's per-request auto-register secret, threaded into
        /// the bootstrap payload's `autoregister.properties` (§6).
        auto_register_key: String,
        on_success: EffectOutcome,
        /// Message prefix; the dispatcher appends "`<error kind> <message>`" (scenario 6).
        on_failure_message_prefix: String,
    },
    KillExecutorJob { agent_id: AgentId, reason: String, on_success: EffectOutcome },
    DisableCIAgent { agent_id: AgentId, on_success: EffectOutcome },
    DeleteCIAgent { agent_id: AgentId, on_success: EffectOutcome },
}

impl Effect {
    pub fn kind(&self) -> EffectKind {
        match self {
            Self::CreateExecutorJob { .. } => EffectKind::CreateExecutorJob,
            Self::KillExecutorJob { .. } => EffectKind::KillExecutorJob,
            Self::DisableCIAgent { .. } => EffectKind::DisableCIAgent,
            Self::DeleteCIAgent { .. } => EffectKind::DeleteCIAgent,
        }
    }

    pub fn agent_id(&self) -> &AgentId {
        match self {
            Self::CreateExecutorJob { agent_id, .. }
            | Self::KillExecutorJob { agent_id, .. }
            | Self::DisableCIAgent { agent_id, .. }
            | Self::DeleteCIAgent { agent_id, .. } => agent_id,
        }
    }

    /// Key-value pairs for structured logging.
    pub fn fields(&self) -> Vec<(&'static str, String)> {
        match self {
            Self::CreateExecutorJob { agent_id, cluster, env, job_id, .. } => vec![
                ("agent_id", agent_id.to_string()),
                ("cluster", cluster.cluster_name.clone()),
                ("env", env.clone()),
                ("job_id", job_id.clone().unwrap_or_default()),
            ],
            Self::KillExecutorJob { agent_id, reason, .. } => {
                vec![("agent_id", agent_id.to_string()), ("reason", reason.clone())]
            }
            Self::DisableCIAgent { agent_id, .. } | Self::DeleteCIAgent { agent_id, .. } => {
                vec![("agent_id", agent_id.to_string())]
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn agent_id() -> AgentId {
        AgentId::form("c", "r", "e", "build-agent-0").unwrap()
    }

    #[test]
    fn kind_matches_variant() {
        let effect = Effect::KillExecutorJob {
            agent_id: agent_id(),
            reason: "stale".into(),
            on_success: EffectOutcome::new(AgentState::Killed, "killed"),
        };
        assert_eq!(effect.kind(), EffectKind::KillExecutorJob);
        assert_eq!(effect.agent_id(), &agent_id());
    }
}
