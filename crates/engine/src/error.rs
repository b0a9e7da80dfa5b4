// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Errors surfaced by the engine's public entry points (§7).

use es_core::{IdentifierError, ProfileError};
use es_gateway::{CIServerError, ExecutorError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid profile: {0:?}")]
    InvalidProfile(Vec<ProfileError>),
    #[error("invalid agent id: {0}")]
    InvalidId(#[from] IdentifierError),
    #[error(transparent)]
    Executor(#[from] ExecutorError),
    #[error(transparent)]
    CIServer(#[from] CIServerError),
}
