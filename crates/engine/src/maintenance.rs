// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Background housekeeping: cache sweeps and retention purges

use crate::ticker::Shared;
use chrono::{DateTime, TimeDelta, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tw_core::Clock;
use tw_storage::StoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaintenanceTask {
    /// Drop cache entries older than the TTL
    CacheSweep,
    /// Delete inactive watches idle for longer than the retention period
    RetentionPurge,
}

impl MaintenanceTask {
    pub fn name(&self) -> &'static str {
        match self {
            MaintenanceTask::CacheSweep => "cache_sweep",
            MaintenanceTask::RetentionPurge => "retention_purge",
        }
    }
}

pub struct Maintenance<C: Clock> {
    shared: Arc<Shared<C>>,
    retention: Duration,
}

impl<C: Clock> Maintenance<C> {
    pub(crate) fn new(shared: Arc<Shared<C>>, retention: Duration) -> Self {
        Self { shared, retention }
    }

    pub fn sweep_cache(&self) -> usize {
        let swept = self.shared.cache.sweep();
        if swept > 0 {
            tracing::debug!(swept, remaining = self.shared.cache.len(), "cache swept");
        }
        swept
    }

    pub fn purge_retired(&self) -> Result<usize, StoreError> {
        let retention = TimeDelta::from_std(self.retention).unwrap_or(TimeDelta::MAX);
        let cutoff = self
            .shared
            .clock
            .now()
            .checked_sub_signed(retention)
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        let purged = self.shared.store.purge_inactive(cutoff)?;
        if purged > 0 {
            tracing::info!(purged, %cutoff, "purged inactive watches");
        }
        Ok(purged)
    }

    fn run_once(&self, task: MaintenanceTask) {
        match task {
            MaintenanceTask::CacheSweep => {
                self.sweep_cache();
            }
            MaintenanceTask::RetentionPurge => {
                if let Err(e) = self.purge_retired() {
                    tracing::error!(error = %e, "retention purge failed");
                }
            }
        }
    }

    /// Repeat `task` every `period` (first run after one period) until shutdown
    pub async fn run(
        self: Arc<Self>,
        task: MaintenanceTask,
        period: Duration,
        mut shutdown: watch::Receiver<bool>,
    ) {
        let start = tokio::time::Instant::now() + period;
        let mut interval = tokio::time::interval_at(start, period);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = interval.tick() => self.run_once(task),
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }
        tracing::debug!(task = task.name(), "maintenance stopped");
    }
}

#[cfg(test)]
#[path = "maintenance_tests.rs"]
mod tests;
