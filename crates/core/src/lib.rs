// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! tw-core: Core types for the Tripwire watch engine
//!
//! This crate provides:
//! - Watch records and recurrence intervals with calendar arithmetic
//! - Conditions and the evaluators that decide them
//! - A TTL cache for fetched observations
//! - Engine configuration
//! - Clock and id abstractions for deterministic tests

pub mod cache;
pub mod clock;
pub mod condition;
pub mod config;
pub mod error;
pub mod id;
pub mod interval;
pub mod observation;
pub mod watch;

pub use cache::{FetchKey, TtlCache};
pub use clock::{Clock, FakeClock, SystemClock};
pub use condition::{
    CompoundEvaluator, Condition, ConditionEvaluator, DueDateEvaluator, EvalContext,
    FreshnessEvaluator, MatchMode, Threshold, ThresholdEvaluator, Verdict,
};
pub use config::{ConfigError, DomainConfig, EngineConfig, ReschedulePolicy};
pub use error::ValidationError;
pub use id::{IdGen, SequentialIdGen, UuidIdGen};
pub use interval::{IntervalError, IntervalSpec, IntervalUnit};
pub use observation::{FeedItem, Observation, WeatherSnapshot};
pub use watch::{Domain, OwnerId, Watch, WatchId};
