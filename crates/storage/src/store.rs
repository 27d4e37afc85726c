// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Watch store trait and the journaled implementation behind both stores

use crate::operation::WatchOp;
use crate::state::WatchTable;
use crate::wal::WalError;
use chrono::{DateTime, Utc};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use thiserror::Error;
use tw_core::{Domain, OwnerId, Watch, WatchId};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("watch not found: {0}")]
    NotFound(WatchId),
    #[error("watch {0} belongs to another owner")]
    AccessDenied(WatchId),
    #[error("watch already exists: {0}")]
    AlreadyExists(WatchId),
    #[error("write-ahead log error: {0}")]
    Wal(#[from] WalError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Durable CRUD for watch records.
///
/// Owner-scoped calls report [`StoreError::AccessDenied`] when the watch
/// exists but belongs to someone else.
pub trait WatchStore: Send + Sync {
    fn create(&self, watch: Watch) -> Result<WatchId, StoreError>;

    fn get(&self, id: &WatchId, owner: &OwnerId) -> Result<Watch, StoreError>;

    fn list_by_owner(&self, owner: &OwnerId) -> Result<Vec<Watch>, StoreError>;

    /// Active watches of `domain` ready for evaluation at `now`.
    ///
    /// Watches whose expiry has passed are deactivated as a side effect and
    /// left out of the result.
    fn list_due(
        &self,
        domain: &Domain,
        now: DateTime<Utc>,
        cadence: Duration,
    ) -> Result<Vec<Watch>, StoreError>;

    /// Persist engine bookkeeping. Timestamps only move forward and an
    /// inactive watch stays inactive.
    fn update(&self, watch: &Watch) -> Result<(), StoreError>;

    fn deactivate(&self, id: &WatchId) -> Result<(), StoreError>;

    fn delete(&self, id: &WatchId, owner: &OwnerId) -> Result<(), StoreError>;

    /// Delete inactive watches whose last activity is before `before`
    fn purge_inactive(&self, before: DateTime<Utc>) -> Result<usize, StoreError>;
}

/// Where committed operations go before they reach the table
pub trait Journal: Send {
    fn record(&mut self, op: &WatchOp) -> Result<(), StoreError>;
}

/// Journal that keeps nothing
#[derive(Debug, Default)]
pub struct NoJournal;

impl Journal for NoJournal {
    fn record(&mut self, _op: &WatchOp) -> Result<(), StoreError> {
        Ok(())
    }
}

pub(crate) struct Inner<J> {
    pub(crate) table: WatchTable,
    pub(crate) journal: J,
}

impl<J: Journal> Inner<J> {
    /// Journal first, so a failed write leaves the table untouched
    fn commit(&mut self, op: WatchOp) -> Result<(), StoreError> {
        self.journal.record(&op)?;
        self.table.apply(&op);
        Ok(())
    }
}

/// A [`WatchTable`] behind a lock, with every mutation journaled
pub struct JournaledStore<J> {
    pub(crate) inner: Mutex<Inner<J>>,
}

impl<J: Journal> JournaledStore<J> {
    pub fn with_journal(table: WatchTable, journal: J) -> Self {
        Self {
            inner: Mutex::new(Inner { table, journal }),
        }
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, Inner<J>> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Number of stored watches, active or not
    pub fn len(&self) -> usize {
        self.lock().table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// In-memory store for tests and ephemeral use
pub type MemoryWatchStore = JournaledStore<NoJournal>;

impl MemoryWatchStore {
    pub fn new() -> Self {
        Self::with_journal(WatchTable::default(), NoJournal)
    }
}

impl Default for MemoryWatchStore {
    fn default() -> Self {
        Self::new()
    }
}

impl<J: Journal> WatchStore for JournaledStore<J> {
    fn create(&self, watch: Watch) -> Result<WatchId, StoreError> {
        let mut inner = self.lock();
        let id = watch.id.clone();
        let op = inner.table.plan_create(watch)?;
        inner.commit(op)?;
        tracing::debug!(watch_id = %id, "watch created");
        Ok(id)
    }

    fn get(&self, id: &WatchId, owner: &OwnerId) -> Result<Watch, StoreError> {
        self.lock().table.get_owned(id, owner).cloned()
    }

    fn list_by_owner(&self, owner: &OwnerId) -> Result<Vec<Watch>, StoreError> {
        Ok(self.lock().table.owned_by(owner))
    }

    fn list_due(
        &self,
        domain: &Domain,
        now: DateTime<Utc>,
        cadence: Duration,
    ) -> Result<Vec<Watch>, StoreError> {
        let mut inner = self.lock();
        for id in inner.table.expired(domain, now) {
            inner.commit(WatchOp::Deactivate { id: id.clone() })?;
            tracing::info!(%domain, watch_id = %id, "watch expired");
        }
        Ok(inner.table.due(domain, now, cadence))
    }

    fn update(&self, watch: &Watch) -> Result<(), StoreError> {
        let mut inner = self.lock();
        let op = inner.table.plan_update(watch)?;
        inner.commit(op)
    }

    fn deactivate(&self, id: &WatchId) -> Result<(), StoreError> {
        let mut inner = self.lock();
        let op = inner.table.plan_deactivate(id)?;
        inner.commit(op)
    }

    fn delete(&self, id: &WatchId, owner: &OwnerId) -> Result<(), StoreError> {
        let mut inner = self.lock();
        let op = inner.table.plan_delete(id, owner)?;
        inner.commit(op)
    }

    fn purge_inactive(&self, before: DateTime<Utc>) -> Result<usize, StoreError> {
        let mut inner = self.lock();
        let ids = inner.table.purgeable(before);
        for id in &ids {
            inner.commit(WatchOp::Delete { id: id.clone() })?;
        }
        Ok(ids.len())
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
