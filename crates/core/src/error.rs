// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Typed errors for the core crate's fallible boundaries.

use thiserror::Error;

/// Identifier codec failures (§4.1).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum IdentifierError {
    #[error("malformed agent identifier: {0:?}")]
    Malformed(String),
    #[error("agent name {0:?} does not match [a-z]+-agent-[0-9]+")]
    InvalidName(String),
}

/// Profile validation failures (§3, §7 kind 2).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProfileError {
    #[error("{key}: {message}")]
    Invalid { key: String, message: String },
}

impl ProfileError {
    pub fn invalid(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Invalid { key: key.into(), message: message.into() }
    }

    pub fn key(&self) -> &str {
        match self {
            Self::Invalid { key, .. } => key,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Invalid { message, .. } => message,
        }
    }
}
