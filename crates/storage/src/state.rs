// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Materialized watch table built from WAL replay
//!
//! Mutations are planned against the current table (ownership and existence
//! checks), then applied as [`WatchOp`]s so that replaying the log
//! reproduces the same table.

use crate::operation::WatchOp;
use crate::store::StoreError;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::time::Duration;
use tw_core::{Domain, OwnerId, Watch, WatchId};

/// All known watches, keyed by id
#[derive(Debug, Default, Clone)]
pub struct WatchTable {
    watches: BTreeMap<WatchId, Watch>,
}

/// Fold an update into the stored record.
///
/// Only bookkeeping moves: the caller's timestamps and `active` flag. The
/// definition (domain, subject, condition, recurrence, expiry, creation
/// time) stays as stored. Timestamps never move backwards and `active`
/// never goes from false to true, so a write racing a cancel cannot
/// revive it.
pub fn merge(stored: &Watch, incoming: &Watch) -> Watch {
    let mut merged = stored.clone();
    merged.last_evaluated_at = stored.last_evaluated_at.max(incoming.last_evaluated_at);
    merged.last_triggered_at = stored.last_triggered_at.max(incoming.last_triggered_at);
    merged.next_eligible_at = stored.next_eligible_at.max(incoming.next_eligible_at);
    merged.active = stored.active && incoming.active;
    merged
}

impl WatchTable {
    pub fn get(&self, id: &WatchId) -> Option<&Watch> {
        self.watches.get(id)
    }

    pub fn len(&self) -> usize {
        self.watches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.watches.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Watch> {
        self.watches.values()
    }

    /// Look up a watch on behalf of `owner`
    pub fn get_owned(&self, id: &WatchId, owner: &OwnerId) -> Result<&Watch, StoreError> {
        let watch = self
            .watches
            .get(id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;
        if &watch.owner_id != owner {
            return Err(StoreError::AccessDenied(id.clone()));
        }
        Ok(watch)
    }

    pub fn owned_by(&self, owner: &OwnerId) -> Vec<Watch> {
        self.watches
            .values()
            .filter(|w| &w.owner_id == owner)
            .cloned()
            .collect()
    }

    /// Active watches of `domain` whose expiry has passed
    pub fn expired(&self, domain: &Domain, now: DateTime<Utc>) -> Vec<WatchId> {
        self.watches
            .values()
            .filter(|w| &w.domain == domain && w.active && w.is_expired(now))
            .map(|w| w.id.clone())
            .collect()
    }

    pub fn due(&self, domain: &Domain, now: DateTime<Utc>, cadence: Duration) -> Vec<Watch> {
        self.watches
            .values()
            .filter(|w| &w.domain == domain && w.is_due(now, cadence))
            .cloned()
            .collect()
    }

    /// Inactive watches with no activity since `before`
    pub fn purgeable(&self, before: DateTime<Utc>) -> Vec<WatchId> {
        self.watches
            .values()
            .filter(|w| !w.active && w.last_activity() < before)
            .map(|w| w.id.clone())
            .collect()
    }

    pub fn plan_create(&self, watch: Watch) -> Result<WatchOp, StoreError> {
        if self.watches.contains_key(&watch.id) {
            return Err(StoreError::AlreadyExists(watch.id));
        }
        Ok(WatchOp::create(watch))
    }

    pub fn plan_update(&self, watch: &Watch) -> Result<WatchOp, StoreError> {
        self.get_owned(&watch.id, &watch.owner_id)?;
        Ok(WatchOp::update(watch.clone()))
    }

    pub fn plan_deactivate(&self, id: &WatchId) -> Result<WatchOp, StoreError> {
        if !self.watches.contains_key(id) {
            return Err(StoreError::NotFound(id.clone()));
        }
        Ok(WatchOp::Deactivate { id: id.clone() })
    }

    pub fn plan_delete(&self, id: &WatchId, owner: &OwnerId) -> Result<WatchOp, StoreError> {
        self.get_owned(id, owner)?;
        Ok(WatchOp::Delete { id: id.clone() })
    }

    /// Apply an operation to update the table
    pub fn apply(&mut self, op: &WatchOp) {
        match op {
            WatchOp::Create { watch } => {
                self.watches.insert(watch.id.clone(), (**watch).clone());
            }

            WatchOp::Update { watch } => {
                // Updates to deleted watches are dropped
                if let Some(stored) = self.watches.get_mut(&watch.id) {
                    *stored = merge(stored, watch);
                }
            }

            WatchOp::Deactivate { id } => {
                if let Some(stored) = self.watches.get_mut(id) {
                    stored.active = false;
                }
            }

            WatchOp::Delete { id } => {
                self.watches.remove(id);
            }
        }
    }

    /// The minimal set of operations that rebuilds this table
    pub fn snapshot(&self) -> Vec<WatchOp> {
        self.watches.values().cloned().map(WatchOp::create).collect()
    }
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
