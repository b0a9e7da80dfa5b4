// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the engine's ambient runtime
//! configuration (SPEC_FULL §3.1). No file-based config format — the CI
//! server supplies cluster/agent profiles on every call; this module only
//! covers process-level knobs.

use std::time::Duration;

/// Runtime knobs for the scheduler engine, loaded from `ES_*` environment
/// variables.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Size of the effect-dispatcher worker pool (§4.8).
    pub worker_pool_size: usize,
    /// Bound on the writer's transition queue.
    pub writer_queue_capacity: usize,
    /// Timeout applied to individual executor/CI-server RPCs.
    pub rpc_timeout: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            worker_pool_size: 8,
            writer_queue_capacity: 1024,
            rpc_timeout: Duration::from_secs(10),
        }
    }
}

impl EngineConfig {
    /// Load from `ES_WORKER_POOL_SIZE`, `ES_WRITER_QUEUE_CAPACITY`,
    /// `ES_RPC_TIMEOUT_MS`, falling back to defaults for unset or
    /// unparsable values.
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            worker_pool_size: env_usize("ES_WORKER_POOL_SIZE").unwrap_or(default.worker_pool_size),
            writer_queue_capacity: env_usize("ES_WRITER_QUEUE_CAPACITY")
                .unwrap_or(default.writer_queue_capacity),
            rpc_timeout: env_u64("ES_RPC_TIMEOUT_MS")
                .map(Duration::from_millis)
                .unwrap_or(default.rpc_timeout),
        }
    }
}

fn env_usize(key: &str) -> Option<usize> {
    std::env::var(key).ok().and_then(|s| s.parse().ok())
}

fn env_u64(key: &str) -> Option<u64> {
    std::env::var(key).ok().and_then(|s| s.parse().ok())
}
