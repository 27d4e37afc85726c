// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Traced adapter wrappers for consistent observability

use crate::fetch::{DataFetcher, FetchError};
use crate::notify::{Notification, Notifier, NotifyError};
use async_trait::async_trait;
use tracing::Instrument;
use tw_core::{Domain, FetchKey, Observation, OwnerId};

/// Wrapper that adds tracing to any DataFetcher
#[derive(Clone)]
pub struct TracedFetcher<F> {
    domain: Domain,
    inner: F,
}

impl<F> TracedFetcher<F> {
    pub fn new(domain: Domain, inner: F) -> Self {
        Self { domain, inner }
    }
}

#[async_trait]
impl<F: DataFetcher> DataFetcher for TracedFetcher<F> {
    async fn fetch(&self, subject: &str) -> Result<Observation, FetchError> {
        let span = tracing::info_span!("fetch", domain = %self.domain, subject);

        async {
            let start = std::time::Instant::now();
            let result = self.inner.fetch(subject).await;
            let elapsed_ms = start.elapsed().as_millis() as u64;

            match &result {
                Ok(observation) => tracing::debug!(
                    kind = observation.kind(),
                    elapsed_ms,
                    "fetched"
                ),
                Err(e) => tracing::warn!(elapsed_ms, error = %e, "fetch failed"),
            }
            result
        }
        .instrument(span)
        .await
    }

    fn cache_key(&self, domain: &Domain, subject: &str) -> Option<FetchKey> {
        self.inner.cache_key(domain, subject)
    }
}

/// Wrapper that adds tracing to any Notifier
#[derive(Clone)]
pub struct TracedNotifier<N> {
    inner: N,
}

impl<N> TracedNotifier<N> {
    pub fn new(inner: N) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<N: Notifier> Notifier for TracedNotifier<N> {
    async fn send(&self, owner: &OwnerId, notification: &Notification) -> Result<(), NotifyError> {
        let span = tracing::info_span!(
            "notify.send",
            %owner,
            watch_id = %notification.watch_id
        );

        async {
            if notification.message.trim().is_empty() {
                tracing::error!("refusing to send empty message");
                return Err(NotifyError::Rejected("empty message".to_string()));
            }

            let start = std::time::Instant::now();
            let result = self.inner.send(owner, notification).await;
            let elapsed_ms = start.elapsed().as_millis() as u64;

            match &result {
                Ok(()) => tracing::info!(elapsed_ms, "notification sent"),
                Err(e) => tracing::error!(elapsed_ms, error = %e, "send failed"),
            }
            result
        }
        .instrument(span)
        .await
    }
}

#[cfg(test)]
#[path = "traced_tests.rs"]
mod tests;
