// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Clock fetcher for due-date domains

use super::{DataFetcher, FetchError};
use async_trait::async_trait;
use tw_core::{Clock, Domain, FetchKey, Observation};

/// Observes the current time. The subject is ignored.
#[derive(Clone, Debug, Default)]
pub struct ClockFetcher<C> {
    clock: C,
}

impl<C: Clock> ClockFetcher<C> {
    pub fn new(clock: C) -> Self {
        Self { clock }
    }
}

#[async_trait]
impl<C: Clock> DataFetcher for ClockFetcher<C> {
    async fn fetch(&self, _subject: &str) -> Result<Observation, FetchError> {
        Ok(Observation::clock(self.clock.now()))
    }

    // A cached time would be stale by definition
    fn cache_key(&self, _domain: &Domain, _subject: &str) -> Option<FetchKey> {
        None
    }
}
