// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory fakes for [`ExecutorClient`]/[`ExecutorClientFactory`]/[`CIServer`],
//! gated behind `test-support`, mirroring the teacher's `FakeAdapter` under
//! its own `test-support` feature.

use crate::ci_server::{CIServer, CIServerError, ServerInfo};
use crate::executor_client::{
    ExecutorClient, ExecutorClientFactory, ExecutorError, ExecutorErrorCode, TaskDescriptor,
};
use async_trait::async_trait;
use es_core::bootstrap::TaskSpec;
use es_core::{AgentId, AgentProfile, CIAgentInfo, ClusterProfile, ExecutorJobSummary, Quota};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[derive(Default)]
struct ExecutorState {
    jobs: HashMap<AgentId, ExecutorJobSummary>,
    quota: Quota,
    open: bool,
}

/// A fake [`ExecutorClient`] backed by an in-memory job table.
pub struct FakeExecutorClient {
    state: Arc<Mutex<ExecutorState>>,
}

#[async_trait]
impl ExecutorClient for FakeExecutorClient {
    async fn list_jobs(&mut self, _role: &str, env: &str) -> Result<Vec<ExecutorJobSummary>, ExecutorError> {
        let state = self.state.lock();
        Ok(state
            .jobs
            .values()
            .filter(|j| j.agent_id.env == env)
            .cloned()
            .collect())
    }

    async fn get_task_history(&mut self, id: &AgentId) -> Result<TaskDescriptor, ExecutorError> {
        let state = self.state.lock();
        if state.jobs.contains_key(id) {
            Ok(TaskDescriptor { status: "RUNNING".into(), events: vec![] })
        } else {
            Err(ExecutorError::new(ExecutorErrorCode::NotFound, format!("no task for {id}")))
        }
    }

    async fn create_job(
        &mut self,
        _cluster: &ClusterProfile,
        _profile: &AgentProfile,
        agent_id: &AgentId,
        _spec: &TaskSpec,
    ) -> Result<(), ExecutorError> {
        let mut state = self.state.lock();
        if state.jobs.get(agent_id).is_some_and(|j| j.pending > 0 || j.active > 0) {
            return Err(ExecutorError::new(ExecutorErrorCode::Conflict, format!("{agent_id} already alive")));
        }
        state.jobs.insert(
            agent_id.clone(),
            ExecutorJobSummary { agent_id: agent_id.clone(), pending: 1, active: 0, failed: 0, finished: 0 },
        );
        Ok(())
    }

    async fn kill_tasks(&mut self, agent_id: &AgentId, _reason: &str) -> Result<(), ExecutorError> {
        self.state.lock().jobs.remove(agent_id);
        Ok(())
    }

    async fn get_quota(&mut self, _role: &str) -> Result<Quota, ExecutorError> {
        Ok(self.state.lock().quota.clone())
    }

    fn is_open(&self) -> bool {
        self.state.lock().open
    }

    fn mark_dirty(&mut self) {
        self.state.lock().open = false;
    }
}

/// Opens [`FakeExecutorClient`]s sharing one underlying job table per url.
#[derive(Default)]
pub struct FakeExecutorClientFactory {
    clusters: Mutex<HashMap<String, Arc<Mutex<ExecutorState>>>>,
    connect_count: AtomicUsize,
}

impl FakeExecutorClientFactory {
    pub fn connect_count(&self) -> usize {
        self.connect_count.load(Ordering::SeqCst)
    }

    /// Seed the quota visible to a not-yet-opened executor url.
    pub fn set_quota(&self, executor_url: &str, quota: Quota) {
        let mut clusters = self.clusters.lock();
        let state = clusters
            .entry(executor_url.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(ExecutorState::default())))
            .clone();
        state.lock().quota = quota;
    }

    /// Overwrite a job's reported status directly, simulating the executor's
    /// own state progressing (e.g. pending -> active) between pings.
    pub fn set_job(&self, executor_url: &str, job: ExecutorJobSummary) {
        let mut clusters = self.clusters.lock();
        let state = clusters
            .entry(executor_url.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(ExecutorState::default())))
            .clone();
        state.lock().jobs.insert(job.agent_id.clone(), job);
    }
}

#[async_trait]
impl ExecutorClientFactory for FakeExecutorClientFactory {
    async fn connect(&self, executor_url: &str) -> Result<Box<dyn ExecutorClient>, ExecutorError> {
        self.connect_count.fetch_add(1, Ordering::SeqCst);
        let mut clusters = self.clusters.lock();
        let state = clusters
            .entry(executor_url.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(ExecutorState::default())))
            .clone();
        state.lock().open = true;
        Ok(Box::new(FakeExecutorClient { state }))
    }
}

/// A fake [`CIServer`] backed by an in-memory agent registry.
#[derive(Default)]
pub struct FakeCIServer {
    agents: Mutex<HashMap<AgentId, CIAgentInfo>>,
}

impl FakeCIServer {
    pub fn register(&self, info: CIAgentInfo) {
        self.agents.lock().insert(info.agent_id.clone(), info);
    }
}

#[async_trait]
impl CIServer for FakeCIServer {
    async fn get_server_info(&self) -> Result<ServerInfo, CIServerError> {
        Ok(ServerInfo { version: "24.1.0".into() })
    }

    async fn list_agents(&self) -> Result<Vec<CIAgentInfo>, CIServerError> {
        Ok(self.agents.lock().values().cloned().collect())
    }

    async fn disable_agents(&self, ids: &[AgentId]) -> Result<(), CIServerError> {
        let mut agents = self.agents.lock();
        for id in ids {
            if let Some(info) = agents.get_mut(id) {
                info.config_state = es_core::AgentConfigState::Disabled;
            }
        }
        Ok(())
    }

    async fn delete_agents(&self, ids: &[AgentId]) -> Result<(), CIServerError> {
        let mut agents = self.agents.lock();
        for id in ids {
            match agents.get(id) {
                Some(info) if info.config_state == es_core::AgentConfigState::Disabled => {
                    agents.remove(id);
                }
                Some(_) => {
                    return Err(CIServerError::new(format!("{id} must be disabled before delete")));
                }
                None => {}
            }
        }
        Ok(())
    }
}
