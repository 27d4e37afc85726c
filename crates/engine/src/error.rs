// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for the watch engine

use thiserror::Error;
use tw_core::{Domain, ValidationError, WatchId};
use tw_storage::StoreError;

/// Errors surfaced to callers of the engine
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid watch: {0}")]
    Validation(#[from] ValidationError),
    #[error("no strategy registered for domain: {0}")]
    UnknownDomain(Domain),
    #[error("watch not found: {0}")]
    NotFound(WatchId),
    #[error("watch {0} belongs to another owner")]
    AccessDenied(WatchId),
    #[error("store error: {0}")]
    Store(StoreError),
}

impl From<StoreError> for EngineError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => EngineError::NotFound(id),
            StoreError::AccessDenied(id) => EngineError::AccessDenied(id),
            other => EngineError::Store(other),
        }
    }
}

impl EngineError {
    /// Message safe to show the requesting user.
    ///
    /// Missing and foreign watches read the same so ids cannot be enumerated.
    pub fn public_message(&self) -> String {
        match self {
            EngineError::Validation(e) => format!("Invalid watch: {}", e),
            EngineError::UnknownDomain(domain) => format!("Unsupported watch type: {}", domain),
            EngineError::NotFound(_) | EngineError::AccessDenied(_) => {
                "No such watch.".to_string()
            }
            EngineError::Store(_) => "Something went wrong, please try again later.".to_string(),
        }
    }
}
