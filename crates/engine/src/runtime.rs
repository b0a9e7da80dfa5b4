// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! [`SchedulerRuntime`]: the engine's public entry points, one per plugin
//! request that touches scheduler state (§6). Each wires the pure
//! `es-core` logic to the store and dispatcher.

use crate::dispatcher::EffectDispatcher;
use crate::error::EngineError;
use crate::reconcile::ReconciliationLoop;
use crate::store::SchedulerStore;
use es_core::admission::{allocate_agent_id, should_create_agent, should_assign_work, NewAgentRequest};
use es_core::effect::EffectOutcome;
use es_core::profile::{AgentProfile, ClusterProfile};
use es_core::{AgentId, AgentRecord, AgentState, Clock, Effect};
use es_gateway::CIServer;
use es_gateway::ExecutorGateway;
use std::sync::Arc;

/// The engine's public surface, parameterized over the clock so tests can
/// use [`es_core::clock::FakeClock`] end to end.
pub struct SchedulerRuntime<C: Clock> {
    store: SchedulerStore,
    dispatcher: EffectDispatcher<C>,
    reconcile: ReconciliationLoop<C>,
    clock: C,
}

impl<C: Clock> SchedulerRuntime<C> {
    pub fn new(
        executor: Arc<ExecutorGateway>,
        ci_server: Arc<dyn CIServer>,
        clock: C,
        config: &es_core::EngineConfig,
    ) -> (Self, tokio::task::JoinHandle<()>) {
        let (store, writer_handle) = SchedulerStore::spawn(config);
        let dispatcher = EffectDispatcher::new(store.clone(), executor.clone(), ci_server.clone(), clock.clone(), config);
        let reconcile = ReconciliationLoop::new(store.clone(), executor, ci_server, dispatcher.clone(), clock.clone());
        (Self { store, dispatcher, reconcile, clock }, writer_handle)
    }

    /// `create-agent` (§6): validates the profiles, applies admission logic,
    /// and — if admitted — allocates an id and enqueues `createExecutorJob`.
    pub async fn request_new_agent(
        &self,
        cluster: ClusterProfile,
        profile: AgentProfile,
        env: String,
        job_id: String,
        auto_register_key: String,
    ) -> Result<Vec<tokio::task::JoinHandle<()>>, EngineError> {
        let cluster_errors = cluster.validate();
        if !cluster_errors.is_empty() {
            return Err(EngineError::InvalidProfile(cluster_errors));
        }
        let profile_errors = profile.validate();
        if !profile_errors.is_empty() {
            return Err(EngineError::InvalidProfile(profile_errors));
        }

        let resources = profile.resources_or_default();
        let req = NewAgentRequest {
            cluster_name: cluster.cluster_name.clone(),
            role: cluster.role.clone(),
            tag: profile.tag.clone(),
            env: env.clone(),
            job_id: job_id.clone(),
            resources,
        };

        let clock = self.clock.clone();
        let effects = self
            .store
            .mutate(move |data| {
                let cluster_state = data.clusters.get(&req.cluster_name);
                if !should_create_agent(&data.agents, cluster_state, &req, &clock) {
                    return (None, vec![]);
                }
                let agent_id = allocate_agent_id(&data.agents, &req.cluster_name, &req.role, &req.env, &req.tag);
                let record = AgentRecord::init(
                    agent_id.clone(),
                    AgentState::Launching,
                    &profile,
                    env,
                    Some(job_id.clone()),
                    &clock,
                    "requested by server-ping create-agent",
                );
                data.agents.insert(agent_id.clone(), record);
                let effect = Effect::CreateExecutorJob {
                    agent_id,
                    cluster,
                    profile,
                    env: req.env.clone(),
                    job_id: Some(job_id),
                    auto_register_key,
                    on_success: EffectOutcome::new(AgentState::Pending, "job created"),
                    on_failure_message_prefix: "create failed".to_string(),
                };
                (Some(()), vec![effect])
            })
            .await;

        Ok(self.dispatcher.dispatch(effects.1))
    }

    /// `server-ping` (§4.9, §6): runs one reconciliation pass. Returns the
    /// dispatched effects' join handles so tests can await them
    /// deterministically; production callers ignore them.
    pub async fn server_ping(&self, clusters: Vec<ClusterProfile>) -> Vec<tokio::task::JoinHandle<()>> {
        self.reconcile.run(clusters).await
    }

    /// `should-assign-work` (§4.10, §6): pure synchronous snapshot read.
    pub fn should_assign_work(&self, agent_id: &AgentId, required: &es_core::ResourceVector) -> bool {
        should_assign_work(&self.store.snapshot().agents, agent_id, required)
    }

    /// `job-completion` (§6): `markActive` on the given agent.
    pub async fn job_completion(&self, agent_id: AgentId) {
        let clock = self.clock.clone();
        self.store
            .mutate(move |data| {
                if let Some(record) = data.agents.get_mut(&agent_id) {
                    record.mark_active(&clock);
                }
                ((), vec![])
            })
            .await;
    }

    pub fn store(&self) -> &SchedulerStore {
        &self.store
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use es_core::clock::FakeClock;
    use es_core::test_support::{AgentProfileBuilder, ClusterProfileBuilder};
    use es_gateway::fakes::{FakeCIServer, FakeExecutorClientFactory};

    fn runtime() -> (SchedulerRuntime<FakeClock>, Arc<FakeExecutorClientFactory>) {
        let factory = Arc::new(FakeExecutorClientFactory::default());
        let executor = Arc::new(ExecutorGateway::new(factory.clone()));
        let ci_server = Arc::new(FakeCIServer::default());
        let clock = FakeClock::new();
        let config = es_core::EngineConfig::default();
        let (runtime, _writer) = SchedulerRuntime::new(executor, ci_server, clock, &config);
        (runtime, factory)
    }

    #[tokio::test]
    async fn cold_launch_creates_an_executor_job_and_advances_to_pending() {
        let (runtime, _factory) = runtime();
        let cluster = ClusterProfileBuilder::default().build();
        let profile = AgentProfileBuilder::default().build();
        let handles = runtime
            .request_new_agent(cluster, profile, "prod".into(), "100".into(), "key".into())
            .await
            .unwrap();
        assert_eq!(handles.len(), 1);
        for h in handles {
            h.await.unwrap();
        }
        let snapshot = runtime.store().snapshot();
        let (_, record) = snapshot.agents.iter().next().expect("one agent launched");
        assert_eq!(record.state, AgentState::Pending);
    }

    #[tokio::test]
    async fn second_request_for_the_same_job_is_deduplicated() {
        let (runtime, _factory) = runtime();
        let cluster = ClusterProfileBuilder::default().build();
        let profile = AgentProfileBuilder::default().build();
        let first = runtime
            .request_new_agent(cluster.clone(), profile.clone(), "prod".into(), "100".into(), "key".into())
            .await
            .unwrap();
        for h in first {
            h.await.unwrap();
        }
        let second = runtime
            .request_new_agent(cluster, profile, "prod".into(), "100".into(), "key".into())
            .await
            .unwrap();
        assert!(second.is_empty());
        assert_eq!(runtime.store().snapshot().agents.len(), 1);
    }

    #[tokio::test]
    async fn should_assign_work_reflects_the_latest_snapshot() {
        let (runtime, _factory) = runtime();
        let cluster = ClusterProfileBuilder::default().build();
        let profile = AgentProfileBuilder::default().build();
        let handles = runtime
            .request_new_agent(cluster, profile, "prod".into(), "100".into(), "key".into())
            .await
            .unwrap();
        for h in handles {
            h.await.unwrap();
        }
        let agent_id = runtime.store().snapshot().agents.keys().next().cloned().expect("one agent");
        assert!(runtime.should_assign_work(&agent_id, &es_core::ResourceVector::new(1.0, 512, 1024)));
        assert!(!runtime.should_assign_work(&agent_id, &es_core::ResourceVector::new(64.0, 512, 1024)));
    }
}
