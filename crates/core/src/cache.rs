// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Expiring cache for fetched observations
//!
//! Entries older than the TTL read as misses but stay in the map until
//! [`TtlCache::sweep`] runs; the engine sweeps on its own maintenance
//! cadence. All domains share one cache, so keys carry the domain.

use crate::clock::Clock;
use crate::watch::Domain;
use chrono::{DateTime, TimeDelta, Utc};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::hash::Hash;
use std::sync::Mutex;
use std::time::Duration;

/// Fingerprint of a fetch request
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FetchKey {
    pub domain: Domain,
    pub subject: String,
    /// Extra request parameters (currency, units); ordered so equal
    /// requests hash equally
    pub params: BTreeMap<String, String>,
}

impl FetchKey {
    pub fn new(domain: Domain, subject: impl Into<String>) -> Self {
        Self {
            domain,
            subject: subject.into(),
            params: BTreeMap::new(),
        }
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }
}

impl fmt::Display for FetchKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.domain, self.subject)?;
        for (k, v) in &self.params {
            write!(f, ";{}={}", k, v)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    fetched_at: DateTime<Utc>,
}

/// Thread-safe TTL cache driven by an injected clock
pub struct TtlCache<K, V, C: Clock> {
    entries: Mutex<HashMap<K, CacheEntry<V>>>,
    ttl: TimeDelta,
    clock: C,
}

impl<K, V, C> TtlCache<K, V, C>
where
    K: Eq + Hash,
    V: Clone,
    C: Clock,
{
    pub fn new(ttl: Duration, clock: C) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl: TimeDelta::from_std(ttl).unwrap_or(TimeDelta::MAX),
            clock,
        }
    }

    pub fn ttl(&self) -> TimeDelta {
        self.ttl
    }

    fn is_fresh(&self, entry: &CacheEntry<V>, now: DateTime<Utc>) -> bool {
        now.signed_duration_since(entry.fetched_at) < self.ttl
    }

    /// Cached value if younger than the TTL. Never evicts.
    pub fn get(&self, key: &K) -> Option<V> {
        let now = self.clock.now();
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries
            .get(key)
            .filter(|entry| self.is_fresh(entry, now))
            .map(|entry| entry.value.clone())
    }

    /// Store a value stamped with the current time; last write wins
    pub fn put(&self, key: K, value: V) {
        let fetched_at = self.clock.now();
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.insert(key, CacheEntry { value, fetched_at });
    }

    /// Remove every stale entry, returning how many were dropped
    pub fn sweep(&self) -> usize {
        let now = self.clock.now();
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        let before = entries.len();
        entries.retain(|_, entry| self.is_fresh(entry, now));
        before - entries.len()
    }

    /// Number of stored entries, stale ones included
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
#[path = "cache_tests.rs"]
mod tests;
