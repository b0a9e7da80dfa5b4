// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Effect dispatcher (§4.8): executes [`Effect`] values on a bounded worker
//! pool, off the writer thread, and re-enters the store with the `(state,
//! message)` follow-up once the RPC settles. Modeled on the teacher's
//! `Executor::execute`/`execute_inner` tracing-span-per-effect shape
//! (`crates/daemon/src/engine/executor.rs`), generalized from one big effect
//! enum dispatched inline to a pool of concurrent workers.

use crate::store::SchedulerStore;
use es_core::bootstrap::build_task_spec;
use es_core::effect::EffectOutcome;
use es_core::{AgentState, Clock, Effect, EngineConfig};
use es_gateway::{CIServer, Connection, ExecutorGateway};
use std::sync::Arc;
use tokio::sync::Semaphore;

/// Executes effects emitted by the store's writer, bounded to
/// [`EngineConfig::worker_pool_size`] concurrent RPCs.
#[derive(Clone)]
pub struct EffectDispatcher<C: Clock> {
    store: SchedulerStore,
    executor: Arc<ExecutorGateway>,
    ci_server: Arc<dyn CIServer>,
    clock: C,
    semaphore: Arc<Semaphore>,
}

impl<C: Clock> EffectDispatcher<C> {
    pub fn new(
        store: SchedulerStore,
        executor: Arc<ExecutorGateway>,
        ci_server: Arc<dyn CIServer>,
        clock: C,
        config: &EngineConfig,
    ) -> Self {
        Self {
            store,
            executor,
            ci_server,
            clock,
            semaphore: Arc::new(Semaphore::new(config.worker_pool_size.max(1))),
        }
    }

    /// Spawn one worker task per effect. Callers normally ignore the
    /// returned handles (fire-and-forget); tests await them to observe the
    /// follow-up mutation deterministically.
    pub fn dispatch(&self, effects: Vec<Effect>) -> Vec<tokio::task::JoinHandle<()>> {
        effects
            .into_iter()
            .map(|effect| {
                let this = self.clone();
                tokio::spawn(async move { this.execute(effect).await })
            })
            .collect()
    }

    async fn execute(&self, effect: Effect) {
        let _permit = self.semaphore.acquire().await;
        let kind = effect.kind();
        let fields = effect.fields();
        let info: String = fields.iter().map(|(k, v)| format!("{k}={v}")).collect::<Vec<_>>().join(" ");
        tracing::info!(effect = %kind, "{info} dispatching");

        let start = std::time::Instant::now();
        let result = self.execute_inner(&effect).await;
        let elapsed_ms = start.elapsed().as_millis() as u64;

        match &result {
            Ok(()) => tracing::info!(effect = %kind, elapsed_ms, "{info} completed"),
            Err(message) => tracing::warn!(effect = %kind, elapsed_ms, error = %message, "{info} failed"),
        }

        match (result, effect) {
            (Ok(()), Effect::CreateExecutorJob { agent_id, on_success, .. })
            | (Ok(()), Effect::KillExecutorJob { agent_id, on_success, .. })
            | (Ok(()), Effect::DisableCIAgent { agent_id, on_success, .. })
            | (Ok(()), Effect::DeleteCIAgent { agent_id, on_success, .. }) => {
                self.apply_outcome(agent_id, on_success).await;
            }
            (Err(message), Effect::CreateExecutorJob { agent_id, on_failure_message_prefix, .. }) => {
                // Scenario 6: launch failure routes straight to `failed` —
                // the only effect whose failure path updates the record
                // directly; the others rely on the transition table's
                // stale-retry on the next ping.
                let outcome = EffectOutcome::new(AgentState::Failed, format!("{on_failure_message_prefix}: {message}"));
                self.apply_outcome(agent_id, outcome).await;
            }
            (Err(_), _) => {}
        }
    }

    async fn execute_inner(&self, effect: &Effect) -> Result<(), String> {
        match effect {
            Effect::CreateExecutorJob { agent_id, cluster, profile, auto_register_key, .. } => {
                let conn = self.executor.ensure(&cluster.executor_url).await.map_err(|e| e.to_string())?;
                let spec = build_task_spec(cluster, profile, agent_id, auto_register_key);
                let result = conn.lock().await.create_job(cluster, profile, agent_id, &spec).await;
                self.mark_dirty_on_error(&conn, &cluster.executor_url, &result).await;
                result.map_err(|e| e.to_string())
            }
            Effect::KillExecutorJob { agent_id, reason, .. } => {
                let url = self.executor_url_for(&agent_id.cluster).ok_or_else(|| "unknown cluster".to_string())?;
                let conn = self.executor.ensure(&url).await.map_err(|e| e.to_string())?;
                let result = conn.lock().await.kill_tasks(agent_id, reason).await;
                self.mark_dirty_on_error(&conn, &url, &result).await;
                result.map_err(|e| e.to_string())
            }
            Effect::DisableCIAgent { agent_id, .. } => {
                self.ci_server.disable_agents(std::slice::from_ref(agent_id)).await.map_err(|e| e.to_string())
            }
            Effect::DeleteCIAgent { agent_id, .. } => {
                self.ci_server.delete_agents(std::slice::from_ref(agent_id)).await.map_err(|e| e.to_string())
            }
        }
    }

    /// §4.4 dirty-connection contract: on any raised RPC error, mark the
    /// connection dirty and close it in the cache so the next `ensure` for
    /// this url reopens rather than reusing a known-bad connection.
    async fn mark_dirty_on_error<T>(&self, conn: &Connection, executor_url: &str, result: &Result<T, es_gateway::ExecutorError>) {
        if result.is_err() {
            conn.lock().await.mark_dirty();
            self.executor.close(executor_url);
        }
    }

    fn executor_url_for(&self, cluster_name: &str) -> Option<String> {
        self.store.snapshot().executor_url_for(cluster_name).map(str::to_string)
    }

    async fn apply_outcome(&self, agent_id: es_core::AgentId, outcome: EffectOutcome) {
        let clock = self.clock.clone();
        self.store
            .mutate(move |data| {
                if let Some(record) = data.agents.get_mut(&agent_id) {
                    record.update(outcome.state, outcome.message, &clock);
                }
                ((), vec![])
            })
            .await;
    }
}
