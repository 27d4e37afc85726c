// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Watch records: persisted trigger definitions
//!
//! A Watch pairs a subject with a condition and an optional recurrence. The
//! identity fields (`id`, `owner_id`, `domain`, `subject`, `condition`) never
//! change after creation; the timestamps and `active` flag are bookkeeping
//! owned by the scheduler.

use crate::condition::Condition;
use crate::interval::IntervalSpec;
use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Unique identifier for a watch
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WatchId(pub String);

impl WatchId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for WatchId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// The user (and notification recipient) that owns a watch
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OwnerId(pub String);

impl OwnerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for OwnerId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Category of watch selecting the fetch/evaluate strategy
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Domain(pub String);

impl Domain {
    pub const PRICE: &'static str = "price";
    pub const WEATHER: &'static str = "weather";
    pub const NEWS: &'static str = "news";
    pub const REMINDER: &'static str = "reminder";

    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn price() -> Self {
        Self::new(Self::PRICE)
    }

    pub fn weather() -> Self {
        Self::new(Self::WEATHER)
    }

    pub fn news() -> Self {
        Self::new(Self::NEWS)
    }

    pub fn reminder() -> Self {
        Self::new(Self::REMINDER)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Domain {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// A persisted trigger definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Watch {
    pub id: WatchId,
    pub owner_id: OwnerId,
    pub domain: Domain,
    pub subject: String,
    pub condition: Condition,
    pub recurring: bool,
    /// Present iff `recurring`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval: Option<IntervalSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub last_evaluated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_triggered_at: Option<DateTime<Utc>>,
    /// Earliest time a recurring watch may be evaluated again
    #[serde(default)]
    pub next_eligible_at: Option<DateTime<Utc>>,
}

impl Watch {
    /// Create an active one-shot watch
    pub fn new(
        id: WatchId,
        owner_id: OwnerId,
        domain: Domain,
        subject: impl Into<String>,
        condition: Condition,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            owner_id,
            domain,
            subject: subject.into(),
            condition,
            recurring: false,
            interval: None,
            expires_at: None,
            active: true,
            created_at,
            last_evaluated_at: None,
            last_triggered_at: None,
            next_eligible_at: None,
        }
    }

    /// Make the watch recur every `interval` after firing
    pub fn recurring_every(mut self, interval: IntervalSpec) -> Self {
        self.recurring = true;
        self.interval = Some(interval);
        self
    }

    pub fn expiring_at(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    /// Expired watches are never evaluated again
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }

    /// Whether an active, unexpired watch is ready for its next evaluation
    /// given the domain cadence.
    ///
    /// Half a cadence since the last evaluation is enough: the ticker's timer
    /// fires once per cadence, and the wall clock read a moment after it can
    /// fall just short of a full period.
    pub fn is_due(&self, now: DateTime<Utc>, cadence: Duration) -> bool {
        if !self.active || self.is_expired(now) {
            return false;
        }
        if self.next_eligible_at.is_some_and(|at| at > now) {
            return false;
        }
        match self.last_evaluated_at {
            None => true,
            Some(last) => {
                let gap = TimeDelta::from_std(cadence / 2).unwrap_or(TimeDelta::MAX);
                last.checked_add_signed(gap)
                    .is_some_and(|next_check| next_check <= now)
            }
        }
    }

    /// Most recent sign of life, used by the retention sweep
    pub fn last_activity(&self) -> DateTime<Utc> {
        [self.last_evaluated_at, self.last_triggered_at]
            .into_iter()
            .flatten()
            .fold(self.created_at, |latest, at| latest.max(at))
    }
}

#[cfg(test)]
#[path = "watch_tests.rs"]
mod tests;
