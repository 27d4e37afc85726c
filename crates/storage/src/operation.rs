// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Operations for the write-ahead log

use serde::{Deserialize, Serialize};
use tw_core::{Watch, WatchId};

/// Mutations that can be persisted to the WAL
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WatchOp {
    /// Insert a new watch
    Create { watch: Box<Watch> },

    /// Replace engine bookkeeping on an existing watch
    Update { watch: Box<Watch> },

    /// Mark a watch inactive (fired, cancelled or expired)
    Deactivate { id: WatchId },

    /// Remove a watch entirely
    Delete { id: WatchId },
}

impl WatchOp {
    pub fn create(watch: Watch) -> Self {
        WatchOp::Create {
            watch: Box::new(watch),
        }
    }

    pub fn update(watch: Watch) -> Self {
        WatchOp::Update {
            watch: Box::new(watch),
        }
    }

    pub fn watch_id(&self) -> &WatchId {
        match self {
            WatchOp::Create { watch } | WatchOp::Update { watch } => &watch.id,
            WatchOp::Deactivate { id } | WatchOp::Delete { id } => id,
        }
    }
}
