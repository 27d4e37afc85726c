// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Data fetchers: where observations come from

mod clock;

pub use clock::ClockFetcher;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeFetcher;

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tw_core::{Domain, FetchKey, Observation};

/// Errors from fetching an observation
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FetchError {
    #[error("upstream unavailable: {0}")]
    Unavailable(String),
    #[error("malformed response: {0}")]
    Malformed(String),
    #[error("fetch timed out after {0:?}")]
    Timeout(Duration),
    #[error("unknown subject: {0}")]
    UnknownSubject(String),
}

/// Retrieves the current state of a subject. Must be idempotent and free
/// of side effects.
#[async_trait]
pub trait DataFetcher: Send + Sync + 'static {
    async fn fetch(&self, subject: &str) -> Result<Observation, FetchError>;

    /// Cache fingerprint for a request, or `None` to always fetch fresh
    fn cache_key(&self, domain: &Domain, subject: &str) -> Option<FetchKey> {
        Some(FetchKey::new(domain.clone(), subject))
    }
}

#[async_trait]
impl<T: DataFetcher + ?Sized> DataFetcher for Arc<T> {
    async fn fetch(&self, subject: &str) -> Result<Observation, FetchError> {
        (**self).fetch(subject).await
    }

    fn cache_key(&self, domain: &Domain, subject: &str) -> Option<FetchKey> {
        (**self).cache_key(domain, subject)
    }
}
