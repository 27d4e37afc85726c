// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Tripwire watch engine: per-domain tickers, dispatch and housekeeping

mod dispatcher;
mod engine;
mod error;
mod format;
mod maintenance;
mod registry;
mod ticker;

pub use dispatcher::{DeliveryOutcome, NotificationDispatcher};
pub use engine::{EngineDeps, EngineHandle, NewWatch, WatchEngine};
pub use error::EngineError;
pub use format::{DefaultFormatter, MessageFormatter, ReminderFormatter};
pub use maintenance::{Maintenance, MaintenanceTask};
pub use registry::{DomainRegistry, DomainStrategy};
pub use ticker::{next_eligible_at, TickOutcome, TickReport, Ticker, TickerState};
