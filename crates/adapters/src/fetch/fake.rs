// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake data fetcher for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{DataFetcher, FetchError};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tw_core::{Domain, FetchKey, Observation};

#[derive(Default)]
struct FakeFetcherState {
    /// One-off responses, consumed before the standing value
    queued: HashMap<String, VecDeque<Result<Observation, FetchError>>>,
    standing: HashMap<String, Result<Observation, FetchError>>,
    delays: HashMap<String, Duration>,
    calls: Vec<String>,
    uncached: bool,
}

/// Scripted fetcher: per-subject observations, failures and delays
#[derive(Clone, Default)]
pub struct FakeFetcher {
    state: Arc<Mutex<FakeFetcherState>>,
}

impl FakeFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> std::sync::MutexGuard<'_, FakeFetcherState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Return `observation` for `subject` until told otherwise
    pub fn set(&self, subject: &str, observation: Observation) {
        self.state().standing.insert(subject.to_string(), Ok(observation));
    }

    /// Fail every fetch of `subject` until told otherwise
    pub fn fail(&self, subject: &str, error: FetchError) {
        self.state().standing.insert(subject.to_string(), Err(error));
    }

    /// Queue a single response for the next fetch of `subject`
    pub fn push(&self, subject: &str, response: Result<Observation, FetchError>) {
        self.state()
            .queued
            .entry(subject.to_string())
            .or_default()
            .push_back(response);
    }

    /// Sleep before answering fetches of `subject`
    pub fn set_delay(&self, subject: &str, delay: Duration) {
        self.state().delays.insert(subject.to_string(), delay);
    }

    /// Opt out of caching, as a live-clock fetcher would
    pub fn uncached(self) -> Self {
        self.state().uncached = true;
        self
    }

    /// Subjects fetched, in call order
    pub fn calls(&self) -> Vec<String> {
        self.state().calls.clone()
    }
}

#[async_trait]
impl DataFetcher for FakeFetcher {
    async fn fetch(&self, subject: &str) -> Result<Observation, FetchError> {
        let delay = {
            let mut state = self.state();
            state.calls.push(subject.to_string());
            state.delays.get(subject).copied()
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let mut state = self.state();
        if let Some(response) = state.queued.get_mut(subject).and_then(VecDeque::pop_front) {
            return response;
        }
        state
            .standing
            .get(subject)
            .cloned()
            .unwrap_or_else(|| Err(FetchError::UnknownSubject(subject.to_string())))
    }

    fn cache_key(&self, domain: &Domain, subject: &str) -> Option<FetchKey> {
        if self.state().uncached {
            None
        } else {
            Some(FetchKey::new(domain.clone(), subject))
        }
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
