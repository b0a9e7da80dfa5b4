// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! End-to-end coverage for the six named scenarios (§8): cold launch,
//! launch de-dup, idle retirement, orphan reap, legacy adopt, launch
//! failure. Each drives a [`SchedulerRuntime`] wired to the in-memory
//! fakes the way a real CI server and executor would.

use es_core::clock::FakeClock;
use es_core::test_support::{agent_record, ci_agent, executor_job, AgentProfileBuilder, ClusterProfileBuilder};
use es_core::{AgentConfigState, AgentId, AgentState, CIAgentState, EngineConfig};
use es_engine::SchedulerRuntime;
use es_gateway::fakes::{FakeCIServer, FakeExecutorClientFactory};
use es_gateway::ExecutorGateway;
use std::sync::Arc;
use std::time::Duration;

fn harness() -> (SchedulerRuntime<FakeClock>, Arc<FakeExecutorClientFactory>, Arc<FakeCIServer>, FakeClock) {
    let factory = Arc::new(FakeExecutorClientFactory::default());
    let executor = Arc::new(ExecutorGateway::new(factory.clone()));
    let ci_server = Arc::new(FakeCIServer::default());
    let clock = FakeClock::new();
    let config = EngineConfig::default();
    let (runtime, _writer) = SchedulerRuntime::new(executor, ci_server.clone(), clock.clone(), &config);
    (runtime, factory, ci_server, clock)
}

fn state_of(runtime: &SchedulerRuntime<FakeClock>, id: &AgentId) -> Option<AgentState> {
    runtime.store().snapshot().agents.get(id).map(|r| r.state)
}

/// Scenario 1.
#[tokio::test]
async fn cold_launch_progresses_through_pending_starting_running() {
    let (runtime, factory, ci_server, _clock) = harness();
    let cluster = ClusterProfileBuilder::default().build();
    let profile = AgentProfileBuilder::default().build();
    let agent_id = AgentId::form("aws-dev", "www", "prod", "build-agent-0").unwrap();

    let handles = runtime
        .request_new_agent(cluster.clone(), profile, "prod".into(), "100".into(), "topsecret".into())
        .await
        .unwrap();
    for h in handles {
        h.await.unwrap();
    }
    assert_eq!(state_of(&runtime, &agent_id), Some(AgentState::Pending));

    // Executor job still pending, no CI registration: no change.
    let handles = runtime.server_ping(vec![cluster.clone()]).await;
    for h in handles {
        h.await.unwrap();
    }
    assert_eq!(state_of(&runtime, &agent_id), Some(AgentState::Pending));

    // Executor job goes active.
    factory.set_job(&cluster.executor_url, executor_job(agent_id.clone(), 0, 1));
    let handles = runtime.server_ping(vec![cluster.clone()]).await;
    for h in handles {
        h.await.unwrap();
    }
    assert_eq!(state_of(&runtime, &agent_id), Some(AgentState::Starting));

    // Agent registers with the CI server.
    ci_server.register(ci_agent(agent_id.clone(), AgentConfigState::Enabled, CIAgentState::Idle));
    let handles = runtime.server_ping(vec![cluster]).await;
    for h in handles {
        h.await.unwrap();
    }
    assert_eq!(state_of(&runtime, &agent_id), Some(AgentState::Running));
}

/// Scenario 2.
#[tokio::test]
async fn second_create_agent_for_the_same_job_is_a_no_op() {
    let (runtime, _factory, _ci_server, _clock) = harness();
    let cluster = ClusterProfileBuilder::default().build();
    let profile = AgentProfileBuilder::default().build();

    let first = runtime
        .request_new_agent(cluster.clone(), profile.clone(), "prod".into(), "100".into(), "topsecret".into())
        .await
        .unwrap();
    for h in first {
        h.await.unwrap();
    }
    assert_eq!(runtime.store().snapshot().agents.len(), 1);

    let second = runtime
        .request_new_agent(cluster, profile, "prod".into(), "100".into(), "topsecret".into())
        .await
        .unwrap();
    assert!(second.is_empty());
    assert_eq!(runtime.store().snapshot().agents.len(), 1);
}

/// Scenario 3.
#[tokio::test]
async fn idle_agent_drains_kills_and_is_removed() {
    let (runtime, factory, ci_server, clock) = harness();
    let cluster = ClusterProfileBuilder::default().build();
    let agent_id = AgentId::form("aws-dev", "www", "prod", "build-agent-0").unwrap();

    let mut record = agent_record(agent_id.clone(), AgentState::Running, &clock);
    record.mark_idle();
    clock.advance(Duration::from_secs(301));
    {
        let (agent_id, record) = (agent_id.clone(), record);
        runtime
            .store()
            .mutate(move |data| {
                data.agents.insert(agent_id, record);
                ((), vec![])
            })
            .await;
    }
    factory.set_job(&cluster.executor_url, executor_job(agent_id.clone(), 0, 1));
    ci_server.register(ci_agent(agent_id.clone(), AgentConfigState::Enabled, CIAgentState::Idle));

    // Ping 1: idle timeout -> disableCIAgent -> draining.
    let handles = runtime.server_ping(vec![cluster.clone()]).await;
    for h in handles {
        h.await.unwrap();
    }
    assert_eq!(state_of(&runtime, &agent_id), Some(AgentState::Draining));

    // Ping 2: still idle -> killExecutorJob -> killed.
    let handles = runtime.server_ping(vec![cluster.clone()]).await;
    for h in handles {
        h.await.unwrap();
    }
    assert_eq!(state_of(&runtime, &agent_id), Some(AgentState::Killed));

    // Ping 3: job no longer alive (kill removed it) -> deleteCIAgent -> terminated.
    let handles = runtime.server_ping(vec![cluster.clone()]).await;
    for h in handles {
        h.await.unwrap();
    }
    assert_eq!(state_of(&runtime, &agent_id), Some(AgentState::Terminated));

    // After the terminal TTL, the record disappears.
    clock.advance(Duration::from_secs(301));
    let handles = runtime.server_ping(vec![cluster]).await;
    for h in handles {
        h.await.unwrap();
    }
    assert_eq!(state_of(&runtime, &agent_id), None);
}

/// Scenario 4.
#[tokio::test]
async fn orphan_executor_job_is_adopted_and_killed() {
    let (runtime, factory, _ci_server, _clock) = harness();
    let cluster = ClusterProfileBuilder::default().build();
    let agent_id = AgentId::form("aws-dev", "www", "prod", "test-agent-7").unwrap();
    factory.set_job(&cluster.executor_url, executor_job(agent_id.clone(), 0, 1));

    let handles = runtime.server_ping(vec![cluster]).await;
    // The writer mutation (adoption) already ran synchronously; the
    // dispatched kill effect has not executed yet on this single-threaded
    // runtime since we have not yielded again.
    assert_eq!(state_of(&runtime, &agent_id), Some(AgentState::Orphan));

    for h in handles {
        h.await.unwrap();
    }
    assert_eq!(state_of(&runtime, &agent_id), Some(AgentState::Killed));
}

/// Scenario 5.
#[tokio::test]
async fn legacy_ci_registration_is_adopted_and_drained() {
    let (runtime, _factory, ci_server, _clock) = harness();
    let cluster = ClusterProfileBuilder::default().build();
    let agent_id = AgentId::form("aws-dev", "www", "prod", "build-agent-9").unwrap();
    ci_server.register(ci_agent(agent_id.clone(), AgentConfigState::Enabled, CIAgentState::Idle));

    let handles = runtime.server_ping(vec![cluster]).await;
    assert_eq!(state_of(&runtime, &agent_id), Some(AgentState::Legacy));

    for h in handles {
        h.await.unwrap();
    }
    assert_eq!(state_of(&runtime, &agent_id), Some(AgentState::Draining));
}

/// Scenario 6.
#[tokio::test]
async fn launch_failure_routes_straight_to_failed_and_expires() {
    let (runtime, factory, _ci_server, clock) = harness();
    let cluster = ClusterProfileBuilder::default().build();
    let profile = AgentProfileBuilder::default().build();
    let agent_id = AgentId::form("aws-dev", "www", "prod", "build-agent-0").unwrap();

    // Pre-seed a job already alive under this id so createJob raises an
    // executor error, exercising the same failure path §6 describes for
    // `INVALID_REQUEST` (the fake only models `Conflict`, but the dispatcher
    // treats every `ExecutorError` identically: failed with the error in the
    // message).
    factory.set_job(&cluster.executor_url, executor_job(agent_id.clone(), 1, 0));

    let handles = runtime
        .request_new_agent(cluster, profile, "prod".into(), "100".into(), "topsecret".into())
        .await
        .unwrap();
    for h in handles {
        h.await.unwrap();
    }

    let snapshot = runtime.store().snapshot();
    let record = snapshot.agents.get(&agent_id).unwrap();
    assert_eq!(record.state, AgentState::Failed);
    let message = &record.last_event().unwrap().message;
    assert!(message.contains("create failed"));
    assert!(message.contains("already alive"));
    drop(snapshot);

    clock.advance(Duration::from_secs(601));
    let handles = runtime.server_ping(vec![]).await;
    for h in handles {
        h.await.unwrap();
    }
    assert_eq!(state_of(&runtime, &agent_id), None);
}
