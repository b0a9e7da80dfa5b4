// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Plugin-boundary errors (§7 kind 1 and kind 5).

use es_engine::EngineError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PluginError {
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("unknown request name: {0:?}")]
    UnknownRequest(String),
    #[error(transparent)]
    Engine(#[from] EngineError),
}
