// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Watch persistence: an in-memory store, a WAL-backed store, and the
//! delivery log

pub mod delivery;
pub mod operation;
pub mod state;
pub mod store;
pub mod wal;
pub mod wal_store;

pub use delivery::{DeliveryLog, DeliveryRecord, DeliveryStatus, MemoryDeliveryLog};
pub use operation::WatchOp;
pub use state::WatchTable;
pub use store::{Journal, JournaledStore, MemoryWatchStore, NoJournal, StoreError, WatchStore};
pub use wal::{Wal, WalError};
pub use wal_store::WalWatchStore;
