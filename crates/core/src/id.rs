// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Watch identifier generation

use crate::watch::WatchId;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Generates unique watch identifiers
pub trait IdGen: Clone + Send + Sync + 'static {
    fn next_id(&self) -> WatchId;
}

/// Random identifiers for production use: `w-` plus the first twelve hex
/// digits of a v4 UUID
#[derive(Clone, Debug, Default)]
pub struct UuidIdGen;

impl IdGen for UuidIdGen {
    fn next_id(&self) -> WatchId {
        let simple = uuid::Uuid::new_v4().simple().to_string();
        WatchId::new(format!("w-{}", &simple[..12]))
    }
}

/// Predictable identifiers for tests (`watch-1`, `watch-2`, ...)
#[derive(Clone, Debug)]
pub struct SequentialIdGen {
    prefix: String,
    counter: Arc<AtomicU64>,
}

impl SequentialIdGen {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            counter: Arc::new(AtomicU64::new(1)),
        }
    }
}

impl Default for SequentialIdGen {
    fn default() -> Self {
        Self::new("watch")
    }
}

impl IdGen for SequentialIdGen {
    fn next_id(&self) -> WatchId {
        let n = self.counter.fetch_add(1, Ordering::SeqCst);
        WatchId::new(format!("{}-{}", self.prefix, n))
    }
}
