// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Process entry point. Brings up the ambient stack (logging, config) that
//! every deployment needs; wiring a concrete [`es_plugin::transport::PluginTransport`]
//! and the executor/CI-server adapters it would dispatch through is left to
//! the embedding process.

fn main() {
    es_plugin::logging::init();
    let config = es_core::EngineConfig::from_env();
    tracing::info!(
        worker_pool_size = config.worker_pool_size,
        writer_queue_capacity = config.writer_queue_capacity,
        rpc_timeout_ms = config.rpc_timeout.as_millis() as u64,
        "es-agent-plugind starting; transport and executor/CI-server adapters must be supplied by the embedding deployment"
    );
}
