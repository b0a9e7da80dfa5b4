// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The scheduler store (§4.6, §5): one writer task owns the mutable state
//! and applies an ordered queue of pure mutation closures; every other task
//! mutates by sending a closure and awaiting its reply, or reads a lock-free
//! `arc-swap` snapshot for the one synchronous path (`shouldAssignWork`).
//! Mirrors the single-writer-task-plus-snapshot shape the teacher wires
//! around its `Scheduler`/`MaterializedState` pair, generalized so mutation
//! and effect emission happen in one step instead of two.

use arc_swap::{ArcSwap, Guard};
use es_core::{AgentId, AgentRecord, Effect, EngineConfig};
use es_core::scheduler_info::ClusterState;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

/// The scheduler's full mutable state (§3, §4.6).
#[derive(Debug, Clone, Default)]
pub struct SchedulerData {
    pub clusters: BTreeMap<String, ClusterState>,
    pub agents: BTreeMap<AgentId, AgentRecord>,
}

impl SchedulerData {
    pub fn executor_url_for(&self, cluster_name: &str) -> Option<&str> {
        self.clusters.get(cluster_name).map(|c| c.executor_url.as_str())
    }
}

type Job = Box<dyn FnOnce(&mut SchedulerData) + Send>;

/// Handle to the writer task. Cheap to clone — a sender plus an `Arc`.
#[derive(Clone)]
pub struct SchedulerStore {
    tx: mpsc::Sender<Job>,
    snapshot: Arc<ArcSwap<SchedulerData>>,
}

impl SchedulerStore {
    /// Spawn the writer task and return a handle to it plus its `JoinHandle`.
    /// The mutation queue is bounded by [`EngineConfig::writer_queue_capacity`]
    /// (§9: "a dedicated writer task pulling transition closures from a
    /// bounded queue") — a saturated queue applies backpressure to callers
    /// instead of growing without bound.
    pub fn spawn(config: &EngineConfig) -> (Self, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(config.writer_queue_capacity.max(1));
        let snapshot = Arc::new(ArcSwap::from_pointee(SchedulerData::default()));
        let writer_snapshot = snapshot.clone();
        let handle = tokio::spawn(run_writer(rx, writer_snapshot));
        (Self { tx, snapshot }, handle)
    }

    /// The sole synchronous read path (§4.10 `shouldAssignWork`): a lock-free
    /// snapshot of the state as of the last applied mutation.
    pub fn snapshot(&self) -> Guard<Arc<SchedulerData>> {
        self.snapshot.load()
    }

    /// Enqueue a pure mutation and await its result and emitted effects.
    /// `f` runs on the writer task; it must not block or panic.
    pub async fn mutate<T: Send + 'static>(
        &self,
        f: impl FnOnce(&mut SchedulerData) -> (T, Vec<Effect>) + Send + 'static,
    ) -> (T, Vec<Effect>) {
        let (reply_tx, reply_rx) = oneshot::channel();
        let job: Job = Box::new(move |data| {
            let result = f(data);
            let _ = reply_tx.send(result);
        });
        self.tx.send(job).await.expect("writer task outlives every store handle");
        reply_rx.await.expect("writer task outlives every store handle")
    }
}

async fn run_writer(mut rx: mpsc::Receiver<Job>, snapshot: Arc<ArcSwap<SchedulerData>>) {
    let mut data = SchedulerData::default();
    while let Some(job) = rx.recv().await {
        job(&mut data);
        snapshot.store(Arc::new(data.clone()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use es_core::clock::SystemClock;
    use es_core::test_support::agent_record;
    use es_core::AgentState;

    #[tokio::test]
    async fn mutate_is_visible_in_the_next_snapshot() {
        let (store, _writer) = SchedulerStore::spawn(&EngineConfig::default());
        let id = AgentId::form("aws-dev", "www", "prod", "build-agent-0").unwrap();
        let clock = SystemClock;
        let record = agent_record(id.clone(), AgentState::Running, &clock);
        let inserted_id = id.clone();
        store
            .mutate(move |data| {
                data.agents.insert(inserted_id, record);
                ((), vec![])
            })
            .await;
        assert!(store.snapshot().agents.contains_key(&id));
    }

    #[tokio::test]
    async fn mutations_are_applied_in_order() {
        let (store, _writer) = SchedulerStore::spawn(&EngineConfig::default());
        store.mutate(|data| { data.clusters.insert("a".into(), ClusterState::new("http://a")); ((), vec![]) }).await;
        store.mutate(|data| { data.clusters.insert("a".into(), ClusterState::new("http://b")); ((), vec![]) }).await;
        assert_eq!(store.snapshot().executor_url_for("a"), Some("http://b"));
    }
}
