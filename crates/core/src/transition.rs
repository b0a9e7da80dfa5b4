// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The pure per-agent state machine (§4.7): `manage(record, execJob, ciAgent)
//! -> {next record, effect}` for every state. Dynamic dispatch on the source
//! system's state name is re-cast here as a tagged sum over the twelve-plus
//! state names with an exhaustive match; the unreachable branch is the
//! explicit catch-all this module names `unknown`.

use crate::agent_record::{AgentRecord, AgentState};
use crate::clock::Clock;
use crate::effect::{Effect, EffectOutcome};
use crate::id::AgentId;
use crate::scheduler_info::{CIAgentState, ExecutorJobSummary, CIAgentInfo};
use std::time::Duration;

const LAUNCH_TIMEOUT: Duration = Duration::from_secs(600);
const IDLE_THRESHOLD: Duration = Duration::from_secs(300);
const RETIRE_TIMEOUT: Duration = Duration::from_secs(120);
const ADOPT_TIMEOUT: Duration = Duration::from_secs(60);
const FAILED_TTL: Duration = Duration::from_secs(600);
const TERMINATED_TTL: Duration = Duration::from_secs(300);

/// What the reconciliation loop currently knows about one agent id (§4.7).
#[derive(Debug, Clone, Copy, Default)]
pub struct Observation<'a> {
    pub exec_job: Option<&'a ExecutorJobSummary>,
    pub ci_agent: Option<&'a CIAgentInfo>,
}

/// `nextRecord` half of a transition response.
#[derive(Debug, Clone, PartialEq)]
pub enum NextRecord {
    /// `nextRecord == nil`: no change.
    NoChange,
    /// A new or updated record to write back.
    Update(AgentRecord),
    /// `nextRecord == tombstone`: remove from the store.
    Tombstone,
}

/// `{nextRecord?, effect?}` — the full output of one state-machine step.
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionResponse {
    pub next: NextRecord,
    pub effect: Option<Effect>,
}

impl TransitionResponse {
    fn no_change() -> Self {
        Self { next: NextRecord::NoChange, effect: None }
    }

    fn tombstone() -> Self {
        Self { next: NextRecord::Tombstone, effect: None }
    }

    fn update_only(record: AgentRecord) -> Self {
        Self { next: NextRecord::Update(record), effect: None }
    }

    fn update_with_effect(record: AgentRecord, effect: Effect) -> Self {
        Self { next: NextRecord::Update(record), effect: Some(effect) }
    }
}

fn alive(job: Option<&ExecutorJobSummary>) -> bool {
    job.is_some_and(ExecutorJobSummary::alive)
}

fn registered(agent: Option<&CIAgentInfo>) -> bool {
    agent.is_some_and(CIAgentInfo::registered)
}

/// `stay(state, msg)` — advance state in record only.
fn stay(mut record: AgentRecord, state: AgentState, msg: &str, clock: &impl Clock) -> TransitionResponse {
    record.update(state, msg, clock);
    TransitionResponse::update_only(record)
}

/// `drain(state, msg)` — advance + emit `disableCIAgent`; success follows up to `draining`.
fn drain(mut record: AgentRecord, state: AgentState, msg: &str, clock: &impl Clock) -> TransitionResponse {
    let agent_id = record.agent_id.clone();
    record.update(state, msg, clock);
    let effect = Effect::DisableCIAgent {
        agent_id,
        on_success: EffectOutcome::new(AgentState::Draining, "disabled"),
    };
    TransitionResponse::update_with_effect(record, effect)
}

/// `kill(state, msg)` — advance + emit `killExecutorJob`; success follows up to `killed`.
fn kill(mut record: AgentRecord, state: AgentState, msg: &str, clock: &impl Clock) -> TransitionResponse {
    let agent_id = record.agent_id.clone();
    record.update(state, msg, clock);
    let effect = Effect::KillExecutorJob {
        agent_id,
        reason: msg.to_string(),
        on_success: EffectOutcome::new(AgentState::Killed, "killed"),
    };
    TransitionResponse::update_with_effect(record, effect)
}

/// `terminate(state, msg)` — advance + emit `deleteCIAgent`; success follows up to `terminated`.
fn terminate(mut record: AgentRecord, state: AgentState, msg: &str, clock: &impl Clock) -> TransitionResponse {
    let agent_id = record.agent_id.clone();
    record.update(state, msg, clock);
    let effect = Effect::DeleteCIAgent {
        agent_id,
        on_success: EffectOutcome::new(AgentState::Terminated, "terminated"),
    };
    TransitionResponse::update_with_effect(record, effect)
}

/// `manage(agentRecord, executorJob, ciAgent) -> {next record, effect}` (§4.7).
///
/// `existing == None` covers the "(no record)" branch: reconciliation
/// observed evidence of an agent this store never created.
pub fn manage(
    agent_id: &AgentId,
    existing: Option<&AgentRecord>,
    observation: Observation<'_>,
    clock: &impl Clock,
) -> TransitionResponse {
    let Some(record) = existing else {
        return manage_unknown(agent_id, observation, clock);
    };

    match record.state {
        AgentState::Launching => manage_launching(record, observation, clock),
        AgentState::Pending => manage_pending(record, observation, clock),
        AgentState::Starting => manage_starting(record, observation, clock),
        AgentState::Running => manage_running(record, observation, clock),
        AgentState::Retiring => manage_retiring(record, observation, clock),
        AgentState::Draining => manage_draining(record, observation, clock),
        AgentState::Killing => manage_killing(record, observation, clock),
        AgentState::Killed => manage_killed(record, observation, clock),
        AgentState::Removing => manage_removing(record, observation, clock),
        AgentState::Legacy => manage_legacy(record, observation, clock),
        AgentState::Orphan => manage_orphan(record, observation, clock),
        AgentState::Failed => manage_failed(record, clock),
        AgentState::Terminated => manage_terminated(record, clock),
    }
}

fn manage_unknown(agent_id: &AgentId, observation: Observation<'_>, clock: &impl Clock) -> TransitionResponse {
    if let Some(ci_agent) = observation.ci_agent {
        let record = AgentRecord::adopt(agent_id.clone(), AgentState::Legacy);
        let _ = ci_agent;
        return drain(record, AgentState::Legacy, "adopted: registered with CI server without a local record", clock);
    }
    if alive(observation.exec_job) {
        let record = AgentRecord::adopt(agent_id.clone(), AgentState::Orphan);
        return kill(record, AgentState::Orphan, "adopted: executor job running without a local record", clock);
    }
    TransitionResponse::no_change()
}

fn manage_launching(record: &AgentRecord, observation: Observation<'_>, clock: &impl Clock) -> TransitionResponse {
    let record = record.clone();
    if observation.exec_job.is_some_and(ExecutorJobSummary::is_active) {
        return stay(record, AgentState::Starting, "executor job active", clock);
    }
    if observation.exec_job.is_some_and(ExecutorJobSummary::is_pending) {
        return stay(record, AgentState::Pending, "executor job pending", clock);
    }
    if record.stale(LAUNCH_TIMEOUT, clock) {
        return stay(record, AgentState::Failed, "no activity for 10 min", clock);
    }
    TransitionResponse::no_change()
}

fn manage_pending(record: &AgentRecord, observation: Observation<'_>, clock: &impl Clock) -> TransitionResponse {
    let record = record.clone();
    if observation.exec_job.is_some_and(ExecutorJobSummary::is_active) {
        return stay(record, AgentState::Starting, "executor job active", clock);
    }
    if registered(observation.ci_agent) {
        return stay(record, AgentState::Running, "registered with CI server", clock);
    }
    if record.stale(LAUNCH_TIMEOUT, clock) {
        return kill(record, AgentState::Killing, "no activity for 10 min", clock);
    }
    TransitionResponse::no_change()
}

fn manage_starting(record: &AgentRecord, observation: Observation<'_>, clock: &impl Clock) -> TransitionResponse {
    let record = record.clone();
    if registered(observation.ci_agent) {
        return stay(record, AgentState::Running, "registered with CI server", clock);
    }
    if record.stale(LAUNCH_TIMEOUT, clock) {
        return kill(record, AgentState::Killing, "no activity for 10 min", clock);
    }
    TransitionResponse::no_change()
}

fn manage_running(record: &AgentRecord, observation: Observation<'_>, clock: &impl Clock) -> TransitionResponse {
    let mut record = record.clone();
    match observation.ci_agent.map(|c| c.agent_state) {
        Some(CIAgentState::Disabled) => stay(record, AgentState::Draining, "externally disabled", clock),
        Some(CIAgentState::Missing) | Some(CIAgentState::LostContact) => {
            kill(record, AgentState::Killing, "CI server lost contact", clock)
        }
        Some(CIAgentState::Idle) if record.idle_for(IDLE_THRESHOLD, clock) => {
            drain(record, AgentState::Retiring, "idle timeout", clock)
        }
        Some(CIAgentState::Idle) => {
            record.mark_idle();
            TransitionResponse::update_only(record)
        }
        _ => {
            record.mark_active(clock);
            TransitionResponse::update_only(record)
        }
    }
}

fn manage_retiring(record: &AgentRecord, observation: Observation<'_>, clock: &impl Clock) -> TransitionResponse {
    let record = record.clone();
    if observation.ci_agent.is_some_and(|c| c.config_state == crate::scheduler_info::AgentConfigState::Disabled) {
        return stay(record, AgentState::Draining, "disabled, proceeding to drain", clock);
    }
    if record.stale(RETIRE_TIMEOUT, clock) {
        return drain(record, AgentState::Retiring, "retry: disable timed out", clock);
    }
    TransitionResponse::no_change()
}

fn manage_draining(record: &AgentRecord, observation: Observation<'_>, clock: &impl Clock) -> TransitionResponse {
    let record = record.clone();
    if observation
        .ci_agent
        .is_some_and(|c| matches!(c.agent_state, CIAgentState::Idle | CIAgentState::Missing | CIAgentState::LostContact))
    {
        return kill(record, AgentState::Killing, "draining complete", clock);
    }
    TransitionResponse::no_change()
}

fn manage_killing(record: &AgentRecord, observation: Observation<'_>, clock: &impl Clock) -> TransitionResponse {
    let record = record.clone();
    if !alive(observation.exec_job) {
        return stay(record, AgentState::Killed, "executor job no longer alive", clock);
    }
    if record.stale(RETIRE_TIMEOUT, clock) {
        return kill(record, AgentState::Killing, "retry: kill timed out", clock);
    }
    TransitionResponse::no_change()
}

fn manage_killed(record: &AgentRecord, observation: Observation<'_>, clock: &impl Clock) -> TransitionResponse {
    let record = record.clone();
    if !alive(observation.exec_job) {
        return terminate(record, AgentState::Removing, "job dead, removing CI registration", clock);
    }
    TransitionResponse::no_change()
}

fn manage_removing(record: &AgentRecord, observation: Observation<'_>, clock: &impl Clock) -> TransitionResponse {
    let record = record.clone();
    if !registered(observation.ci_agent) {
        return stay(record, AgentState::Terminated, "no longer registered", clock);
    }
    if record.stale(RETIRE_TIMEOUT, clock) {
        return terminate(record, AgentState::Removing, "retry: delete timed out", clock);
    }
    TransitionResponse::no_change()
}

fn manage_legacy(record: &AgentRecord, _observation: Observation<'_>, clock: &impl Clock) -> TransitionResponse {
    let record = record.clone();
    if record.stale(ADOPT_TIMEOUT, clock) {
        return drain(record, AgentState::Legacy, "retry: disable timed out", clock);
    }
    TransitionResponse::no_change()
}

fn manage_orphan(record: &AgentRecord, _observation: Observation<'_>, clock: &impl Clock) -> TransitionResponse {
    let record = record.clone();
    if record.stale(ADOPT_TIMEOUT, clock) {
        return kill(record, AgentState::Orphan, "retry: kill timed out", clock);
    }
    TransitionResponse::no_change()
}

fn manage_failed(record: &AgentRecord, clock: &impl Clock) -> TransitionResponse {
    if record.stale(FAILED_TTL, clock) {
        return TransitionResponse::tombstone();
    }
    TransitionResponse::no_change()
}

fn manage_terminated(record: &AgentRecord, clock: &impl Clock) -> TransitionResponse {
    if record.stale(TERMINATED_TTL, clock) {
        return TransitionResponse::tombstone();
    }
    TransitionResponse::no_change()
}
