// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Durable watch store: a WAL replayed into a [`WatchTable`] at open

use crate::operation::WatchOp;
use crate::state::WatchTable;
use crate::store::{Journal, JournaledStore, StoreError};
use crate::wal::Wal;
use std::path::Path;

impl Journal for Wal {
    fn record(&mut self, op: &WatchOp) -> Result<(), StoreError> {
        self.append(op)?;
        Ok(())
    }
}

pub type WalWatchStore = JournaledStore<Wal>;

impl WalWatchStore {
    /// Open the log at `path`, creating it (and its directory) if needed
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let ops = Wal::replay(path)?;
        let mut table = WatchTable::default();
        for op in &ops {
            table.apply(op);
        }
        let wal = Wal::open(path)?;

        tracing::info!(
            path = %path.display(),
            ops = ops.len(),
            watches = table.len(),
            "watch store opened"
        );
        Ok(Self::with_journal(table, wal))
    }

    /// Rewrite the log as one create per live watch
    pub fn compact(&self) -> Result<(), StoreError> {
        let mut inner = self.lock();
        let before = inner.journal.sequence();
        let snapshot = inner.table.snapshot();
        let path = inner.journal.path().to_path_buf();
        inner.journal = Wal::rewrite(&path, &snapshot)?;
        tracing::info!(before, after = snapshot.len(), "watch log compacted");
        Ok(())
    }
}

#[cfg(test)]
#[path = "wal_store_tests.rs"]
mod tests;
