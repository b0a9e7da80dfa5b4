// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The per-agent mutable record tracked by the scheduler store (§3, §4.2).

use crate::clock::Clock;
use crate::id::AgentId;
use crate::profile::AgentProfile;
use crate::resources::ResourceVector;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// The twelve-plus-state agent lifecycle (§3, §4.7).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentState {
    Launching,
    Pending,
    Starting,
    Running,
    Retiring,
    Draining,
    Killing,
    Killed,
    Removing,
    Terminated,
    Failed,
    Legacy,
    Orphan,
}

impl std::fmt::Display for AgentState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Launching => "launching",
            Self::Pending => "pending",
            Self::Starting => "starting",
            Self::Running => "running",
            Self::Retiring => "retiring",
            Self::Draining => "draining",
            Self::Killing => "killing",
            Self::Killed => "killed",
            Self::Removing => "removing",
            Self::Terminated => "terminated",
            Self::Failed => "failed",
            Self::Legacy => "legacy",
            Self::Orphan => "orphan",
        };
        f.write_str(s)
    }
}

impl AgentState {
    /// I5: terminal states have no further effects dispatched; their only
    /// transition is tombstone removal after a TTL.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Terminated | Self::Failed)
    }
}

/// One entry in an agent's append-only event log (§4.2).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentEvent {
    pub time_ms: u64,
    pub state: AgentState,
    pub message: String,
}

/// Per-agent mutable record (§3).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentRecord {
    pub agent_id: AgentId,
    pub state: AgentState,
    pub environments: Vec<String>,
    pub resources: ResourceVector,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_active_ms: Option<u64>,
    pub idle: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub launched_for: Option<String>,
    pub events: Vec<AgentEvent>,
}

impl AgentRecord {
    /// `init(id, state, profile, env)` — §4.2: seeds resources from the
    /// profile, sets `lastActive = now`, and appends the first event.
    pub fn init(
        agent_id: AgentId,
        state: AgentState,
        profile: &AgentProfile,
        env: impl Into<String>,
        launched_for: Option<String>,
        clock: &impl Clock,
        message: impl Into<String>,
    ) -> Self {
        let now = clock.epoch_ms();
        let mut record = Self {
            agent_id,
            state,
            environments: vec![env.into()],
            resources: profile.resources_or_default(),
            last_active_ms: Some(now),
            idle: false,
            launched_for,
            events: Vec::new(),
        };
        record.push_event(state, message.into(), now);
        record
    }

    /// `update(record, state, message)` — §4.2: advances state, appends an event.
    pub fn update(&mut self, state: AgentState, message: impl Into<String>, clock: &impl Clock) {
        let now = clock.epoch_ms();
        self.state = state;
        self.push_event(state, message.into(), now);
        // I4: launchedFor is only meaningful while the agent is still being
        // brought up; clear it once it leaves that window.
        if !matches!(state, AgentState::Launching | AgentState::Pending | AgentState::Starting) {
            self.launched_for = None;
        }
    }

    fn push_event(&mut self, state: AgentState, message: String, time_ms: u64) {
        self.events.push(AgentEvent { time_ms, state, message });
    }

    /// `markActive(r) = r{lastActive ← now, idle ← false}`.
    pub fn mark_active(&mut self, clock: &impl Clock) {
        self.last_active_ms = Some(clock.epoch_ms());
        self.idle = false;
    }

    /// `markIdle(r) = r{idle ← true}`.
    pub fn mark_idle(&mut self) {
        self.idle = true;
    }

    /// `stale(r, τ) = now - lastEvent.time > τ` (B3: uses last event time, not `lastActive`).
    pub fn stale(&self, threshold: Duration, clock: &impl Clock) -> bool {
        let Some(last) = self.events.last() else { return false };
        let now = clock.epoch_ms();
        now.saturating_sub(last.time_ms) > threshold.as_millis() as u64
    }

    /// `idleFor(r, τ) = r.idle ∧ r.lastActive ∧ now - r.lastActive ≥ τ`.
    ///
    /// B2: false whenever `lastActive` is unset, regardless of `τ`.
    pub fn idle_for(&self, threshold: Duration, clock: &impl Clock) -> bool {
        let Some(last_active) = self.last_active_ms else { return false };
        if !self.idle {
            return false;
        }
        let now = clock.epoch_ms();
        now.saturating_sub(last_active) >= threshold.as_millis() as u64
    }

    pub fn last_event(&self) -> Option<&AgentEvent> {
        self.events.last()
    }

    /// Adopt an agent the store never launched itself — a `legacy` or
    /// `orphan` record discovered by reconciliation (§4.7 "(no record)").
    /// No profile is available, so resources fall back to launch defaults.
    /// Pushes no event of its own: callers immediately follow up with
    /// `update()` (via `drain`/`kill`) to record the adoption and its
    /// resulting effect as a single event.
    pub fn adopt(agent_id: AgentId, state: AgentState) -> Self {
        Self {
            agent_id,
            state,
            environments: Vec::new(),
            resources: ResourceVector::default(),
            last_active_ms: None,
            idle: false,
            launched_for: None,
            events: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FakeClock;

    fn profile() -> AgentProfile {
        AgentProfile {
            id: "build".into(),
            tag: "build".into(),
            environments: None,
            cpu: None,
            ram: None,
            disk: None,
            init_script: None,
        }
    }

    #[test]
    fn init_appends_a_single_event_and_sets_last_active() {
        let clock = FakeClock::new();
        let id = AgentId::form("c", "r", "e", "build-agent-0").unwrap();
        let record = AgentRecord::init(id, AgentState::Launching, &profile(), "prod", Some("100".into()), &clock, "created");
        assert_eq!(record.events.len(), 1);
        assert_eq!(record.state, AgentState::Launching);
        assert_eq!(record.last_active_ms, Some(clock.epoch_ms()));
        assert_eq!(record.launched_for.as_deref(), Some("100"));
    }

    #[test]
    fn update_clears_launched_for_once_past_launch_states() {
        let clock = FakeClock::new();
        let id = AgentId::form("c", "r", "e", "build-agent-0").unwrap();
        let mut record = AgentRecord::init(id, AgentState::Launching, &profile(), "prod", Some("100".into()), &clock, "created");
        record.update(AgentState::Pending, "job created", &clock);
        assert_eq!(record.launched_for.as_deref(), Some("100"));
        record.update(AgentState::Running, "registered", &clock);
        assert_eq!(record.launched_for, None);
    }

    #[test]
    fn stale_uses_last_event_time_not_last_active() {
        let clock = FakeClock::new();
        let id = AgentId::form("c", "r", "e", "build-agent-0").unwrap();
        let mut record = AgentRecord::init(id, AgentState::Running, &profile(), "prod", None, &clock, "created");
        record.mark_active(&clock);
        clock.advance(Duration::from_secs(700));
        // last_active was bumped but no new event was appended, so staleness
        // is still measured against the original event.
        assert!(record.stale(Duration::from_secs(600), &clock));
    }

    #[test]
    fn idle_for_false_when_last_active_unset() {
        let clock = FakeClock::new();
        let id = AgentId::form("c", "r", "e", "build-agent-0").unwrap();
        let mut record = AgentRecord::init(id, AgentState::Running, &profile(), "prod", None, &clock, "created");
        record.last_active_ms = None;
        record.idle = true;
        clock.advance(Duration::from_secs(10_000));
        assert!(!record.idle_for(Duration::from_secs(1), &clock));
    }

    #[test]
    fn idle_for_requires_threshold_elapsed() {
        let clock = FakeClock::new();
        let id = AgentId::form("c", "r", "e", "build-agent-0").unwrap();
        let mut record = AgentRecord::init(id, AgentState::Running, &profile(), "prod", None, &clock, "created");
        record.mark_idle();
        assert!(!record.idle_for(Duration::from_secs(300), &clock));
        clock.advance(Duration::from_secs(301));
        assert!(record.idle_for(Duration::from_secs(300), &clock));
    }
}
