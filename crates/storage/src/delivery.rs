// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Delivery log: a bounded record of notification attempts

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Mutex;
use tw_core::{Domain, OwnerId, WatchId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DeliveryStatus {
    Delivered,
    Failed { reason: String },
}

/// One notification attempt for a firing watch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryRecord {
    pub watch_id: WatchId,
    pub owner_id: OwnerId,
    pub domain: Domain,
    pub title: String,
    pub message: String,
    pub outcome: DeliveryStatus,
    pub at: DateTime<Utc>,
}

impl DeliveryRecord {
    pub fn delivered(&self) -> bool {
        self.outcome == DeliveryStatus::Delivered
    }
}

pub trait DeliveryLog: Send + Sync {
    fn record(&self, record: DeliveryRecord);

    /// Most recent records, newest last
    fn recent(&self, limit: usize) -> Vec<DeliveryRecord>;

    fn for_watch(&self, id: &WatchId) -> Vec<DeliveryRecord>;
}

/// Keeps the last `capacity` records in memory
pub struct MemoryDeliveryLog {
    records: Mutex<VecDeque<DeliveryRecord>>,
    capacity: usize,
}

impl MemoryDeliveryLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            records: Mutex::new(VecDeque::with_capacity(capacity.min(1024))),
            capacity,
        }
    }

    pub fn len(&self) -> usize {
        self.records.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl DeliveryLog for MemoryDeliveryLog {
    fn record(&self, record: DeliveryRecord) {
        if self.capacity == 0 {
            return;
        }
        let mut records = self.records.lock().unwrap_or_else(|e| e.into_inner());
        while records.len() >= self.capacity {
            records.pop_front();
        }
        records.push_back(record);
    }

    fn recent(&self, limit: usize) -> Vec<DeliveryRecord> {
        let records = self.records.lock().unwrap_or_else(|e| e.into_inner());
        let skip = records.len().saturating_sub(limit);
        records.iter().skip(skip).cloned().collect()
    }

    fn for_watch(&self, id: &WatchId) -> Vec<DeliveryRecord> {
        let records = self.records.lock().unwrap_or_else(|e| e.into_inner());
        records.iter().filter(|r| &r.watch_id == id).cloned().collect()
    }
}
