// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The periodic reconciliation loop (§4.9): per `server-ping`, fetch quota
//! and job lists per cluster concurrently, fetch the CI agent roster
//! synchronously on the calling task (§9 Open Question — normalized to "on
//! the request thread, before dispatching", to keep writer latency down),
//! then run one state-machine step per known agent id inside a single
//! writer mutation so a ping's updates serialize together.

use crate::dispatcher::EffectDispatcher;
use crate::store::SchedulerStore;
use es_core::profile::ClusterProfile;
use es_core::scheduler_info::{CIAgentInfo, ClusterState, ExecutorJobSummary};
use es_core::transition::{manage, NextRecord, Observation};
use es_core::{AgentId, Clock};
use es_gateway::{CIServer, ExecutorGateway};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

pub struct ReconciliationLoop<C: Clock> {
    store: SchedulerStore,
    executor: Arc<ExecutorGateway>,
    ci_server: Arc<dyn CIServer>,
    dispatcher: EffectDispatcher<C>,
    clock: C,
}

impl<C: Clock> ReconciliationLoop<C> {
    pub fn new(
        store: SchedulerStore,
        executor: Arc<ExecutorGateway>,
        ci_server: Arc<dyn CIServer>,
        dispatcher: EffectDispatcher<C>,
        clock: C,
    ) -> Self {
        Self { store, executor, ci_server, dispatcher, clock }
    }

    /// Run one ping over the given cluster profiles. Returns the dispatched
    /// effects' join handles so tests can await the follow-up mutations
    /// deterministically; production callers ignore them.
    pub async fn run(&self, clusters: Vec<ClusterProfile>) -> Vec<tokio::task::JoinHandle<()>> {
        let ci_agents = match self.ci_server.list_agents().await {
            Ok(agents) => agents,
            Err(e) => {
                tracing::warn!(error = %e, "list_agents failed; proceeding with an empty CI roster this ping");
                Vec::new()
            }
        };

        // Step 1: ensure a connection is cached per profile, and record
        // cluster entries keyed by cluster name.
        for cluster in &clusters {
            if let Err(e) = self.executor.ensure(&cluster.executor_url).await {
                tracing::warn!(cluster = %cluster.cluster_name, error = %e, "failed to open executor connection this ping");
            }
        }
        self.register_clusters(&clusters).await;

        // Step 2/3: per cluster, fan out quota + job-list fetches.
        let mut job_handles = Vec::new();
        for cluster in clusters.iter().cloned() {
            let executor = self.executor.clone();
            let store = self.store.clone();
            job_handles.push(tokio::spawn(async move {
                let Ok(conn) = executor.ensure(&cluster.executor_url).await else {
                    return Vec::new();
                };
                let mut client = conn.lock().await;
                match client.get_quota(&cluster.role).await {
                    Ok(quota) => {
                        let cluster_name = cluster.cluster_name.clone();
                        store
                            .mutate(move |data| {
                                if let Some(entry) = data.clusters.get_mut(&cluster_name) {
                                    entry.quota = Some(quota);
                                }
                                ((), vec![])
                            })
                            .await;
                    }
                    Err(e) => tracing::warn!(cluster = %cluster.cluster_name, error = %e, "get_quota failed"),
                }
                match client.list_jobs(&cluster.role, &cluster.env).await {
                    Ok(jobs) => jobs,
                    Err(e) => {
                        tracing::warn!(cluster = %cluster.cluster_name, error = %e, "list_jobs failed; treating as empty this ping");
                        Vec::new()
                    }
                }
            }));
        }

        let mut jobs: BTreeMap<AgentId, ExecutorJobSummary> = BTreeMap::new();
        for handle in job_handles {
            if let Ok(cluster_jobs) = handle.await {
                for job in cluster_jobs {
                    jobs.insert(job.agent_id.clone(), job);
                }
            }
        }

        let ci_agents: BTreeMap<AgentId, CIAgentInfo> =
            ci_agents.into_iter().map(|a| (a.agent_id.clone(), a)).collect();

        // Step 4: union keys with known records, one state-machine step per id.
        let clock = self.clock.clone();
        let (_, effects) = self
            .store
            .mutate(move |data| {
                let mut ids: BTreeSet<AgentId> = data.agents.keys().cloned().collect();
                ids.extend(jobs.keys().cloned());
                ids.extend(ci_agents.keys().cloned());

                let mut effects = Vec::new();
                for id in ids {
                    let observation = Observation { exec_job: jobs.get(&id), ci_agent: ci_agents.get(&id) };
                    let existing = data.agents.get(&id);
                    let response = manage(&id, existing, observation, &clock);
                    match response.next {
                        NextRecord::NoChange => {}
                        NextRecord::Update(record) => {
                            data.agents.insert(id, record);
                        }
                        NextRecord::Tombstone => {
                            data.agents.remove(&id);
                        }
                    }
                    if let Some(effect) = response.effect {
                        effects.push(effect);
                    }
                }
                ((), effects)
            })
            .await;

        self.dispatcher.dispatch(effects)
    }

    /// Creates a [`ClusterState`] entry for every profile passed this ping and
    /// removes any entry whose profile no longer appears — "destroyed when
    /// the profile disappears" (§3).
    async fn register_clusters(&self, clusters: &[ClusterProfile]) {
        let entries: Vec<(String, String)> =
            clusters.iter().map(|c| (c.cluster_name.clone(), c.executor_url.clone())).collect();
        self.store
            .mutate(move |data| {
                let live: BTreeSet<&str> = entries.iter().map(|(name, _)| name.as_str()).collect();
                data.clusters.retain(|name, _| live.contains(name.as_str()));
                for (name, url) in entries {
                    data.clusters.entry(name).or_insert_with(|| ClusterState::new(url));
                }
                ((), vec![])
            })
            .await;
    }
}
