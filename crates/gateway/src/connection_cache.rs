// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Connection cache for [`ExecutorClient`] connections (§4.4).
//!
//! `executorUrl → Connection`. `ensure(url)` opens if absent or no longer
//! open; `close(url)` drops and closes. Each connection carries its own
//! exclusive lock — callers serialize RPCs on a given connection by holding
//! that lock, mirroring the teacher's `Arc<Mutex<HashMap<..>>>` metadata
//! cache (`crates/daemon/src/adapters/agent/k8s/mod.rs`).

use crate::executor_client::{ExecutorClient, ExecutorClientFactory, ExecutorError};
use parking_lot::Mutex as SyncMutex;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex as AsyncMutex;

/// A single cached, lockable executor connection.
pub type Connection = Arc<AsyncMutex<Box<dyn ExecutorClient>>>;

/// Caches one [`ExecutorClient`] connection per `executorUrl`.
pub struct ExecutorGateway {
    factory: Arc<dyn ExecutorClientFactory>,
    connections: SyncMutex<HashMap<String, Connection>>,
}

impl ExecutorGateway {
    pub fn new(factory: Arc<dyn ExecutorClientFactory>) -> Self {
        Self { factory, connections: SyncMutex::new(HashMap::new()) }
    }

    /// `ensure(url)`: opens a new connection if absent, or if the cached one
    /// is no longer open.
    pub async fn ensure(&self, executor_url: &str) -> Result<Connection, ExecutorError> {
        let existing = {
            let cache = self.connections.lock();
            cache.get(executor_url).cloned()
        };
        if let Some(conn) = existing {
            if conn.lock().await.is_open() {
                return Ok(conn);
            }
        }
        let client = self.factory.connect(executor_url).await?;
        let conn: Connection = Arc::new(AsyncMutex::new(client));
        self.connections.lock().insert(executor_url.to_string(), conn.clone());
        Ok(conn)
    }

    /// `close(url)`: drops the cached connection. The next `ensure` reopens it.
    pub fn close(&self, executor_url: &str) {
        self.connections.lock().remove(executor_url);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fakes::FakeExecutorClientFactory;

    #[tokio::test]
    async fn ensure_reuses_open_connections() {
        let factory = Arc::new(FakeExecutorClientFactory::default());
        let gateway = ExecutorGateway::new(factory.clone());
        let first = gateway.ensure("http://x").await.unwrap();
        let second = gateway.ensure("http://x").await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(factory.connect_count(), 1);
    }

    #[tokio::test]
    async fn close_forces_a_fresh_connection() {
        let factory = Arc::new(FakeExecutorClientFactory::default());
        let gateway = ExecutorGateway::new(factory.clone());
        let first = gateway.ensure("http://x").await.unwrap();
        gateway.close("http://x");
        let second = gateway.ensure("http://x").await.unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(factory.connect_count(), 2);
    }

    #[tokio::test]
    async fn ensure_reopens_dirty_connections() {
        let factory = Arc::new(FakeExecutorClientFactory::default());
        let gateway = ExecutorGateway::new(factory.clone());
        let first = gateway.ensure("http://x").await.unwrap();
        first.lock().await.mark_dirty();
        let second = gateway.ensure("http://x").await.unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
    }
}
