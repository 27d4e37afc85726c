// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Trigger conditions and the evaluators that decide them
//!
//! A [`Condition`] is a map of named thresholds (`{"aboveValue": 50000}`,
//! `{"tempBelow": 5, "rain": true}`). Each domain registers one
//! [`ConditionEvaluator`] that knows which keys it accepts. Malformed
//! conditions are rejected by `validate` when a watch is created; `evaluate`
//! never fails and reports shape mismatches as `NotSatisfied`.

mod compound;
mod due;
mod freshness;
mod threshold;

pub use compound::{CompoundEvaluator, MatchMode, RAIN, SNOW, TEMP_ABOVE, TEMP_BELOW, WIND_ABOVE};
pub use due::{DueDateEvaluator, DUE_AT};
pub use freshness::{FreshnessEvaluator, NEW_ITEMS};
pub use threshold::{ThresholdEvaluator, ABOVE_VALUE, BELOW_VALUE};

use crate::error::ValidationError;
use crate::observation::Observation;
use crate::watch::Watch;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A single threshold value
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Threshold {
    Flag(bool),
    Number(f64),
    At(DateTime<Utc>),
}

impl Threshold {
    fn type_name(&self) -> &'static str {
        match self {
            Threshold::Flag(_) => "a boolean",
            Threshold::Number(_) => "a number",
            Threshold::At(_) => "a timestamp",
        }
    }
}

impl fmt::Display for Threshold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Threshold::Flag(value) => write!(f, "{}", value),
            Threshold::Number(value) => write!(f, "{}", value),
            Threshold::At(at) => write!(f, "{}", at.to_rfc3339()),
        }
    }
}

impl From<f64> for Threshold {
    fn from(value: f64) -> Self {
        Threshold::Number(value)
    }
}

impl From<bool> for Threshold {
    fn from(value: bool) -> Self {
        Threshold::Flag(value)
    }
}

impl From<DateTime<Utc>> for Threshold {
    fn from(value: DateTime<Utc>) -> Self {
        Threshold::At(value)
    }
}

/// Named thresholds making up a watch's trigger condition
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Condition(BTreeMap<String, Threshold>);

impl Condition {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<Threshold>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn get(&self, key: &str) -> Option<&Threshold> {
        self.0.get(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn number(&self, key: &str) -> Option<f64> {
        match self.0.get(key) {
            Some(Threshold::Number(n)) => Some(*n),
            _ => None,
        }
    }

    pub fn flag(&self, key: &str) -> Option<bool> {
        match self.0.get(key) {
            Some(Threshold::Flag(b)) => Some(*b),
            _ => None,
        }
    }

    pub fn time(&self, key: &str) -> Option<DateTime<Utc>> {
        match self.0.get(key) {
            Some(Threshold::At(t)) => Some(*t),
            _ => None,
        }
    }
}

impl FromIterator<(String, Threshold)> for Condition {
    fn from_iter<T: IntoIterator<Item = (String, Threshold)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Outcome of evaluating a condition against an observation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// `matched` names the predicates that held
    Satisfied { matched: Vec<String> },
    NotSatisfied,
}

impl Verdict {
    pub fn is_satisfied(&self) -> bool {
        matches!(self, Verdict::Satisfied { .. })
    }

    fn from_matched(matched: Vec<String>) -> Self {
        if matched.is_empty() {
            Verdict::NotSatisfied
        } else {
            Verdict::Satisfied { matched }
        }
    }
}

/// Watch bookkeeping an evaluator may consult
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvalContext {
    pub now: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub last_triggered_at: Option<DateTime<Utc>>,
}

impl EvalContext {
    pub fn for_watch(watch: &Watch, now: DateTime<Utc>) -> Self {
        Self {
            now,
            created_at: watch.created_at,
            last_triggered_at: watch.last_triggered_at,
        }
    }
}

/// Decides whether a condition holds for an observation
pub trait ConditionEvaluator: Send + Sync {
    /// Reject conditions this evaluator cannot decide
    fn validate(&self, condition: &Condition) -> Result<(), ValidationError>;

    fn evaluate(&self, condition: &Condition, observed: &Observation, ctx: &EvalContext) -> Verdict;

    /// A fixed point in time recurrences should be anchored on, if the
    /// condition carries one
    fn schedule_anchor(&self, _condition: &Condition) -> Option<DateTime<Utc>> {
        None
    }
}

/// Shared validation: only `allowed` keys, each holding the expected type
#[derive(Debug, Clone, Copy)]
pub(crate) enum Expect {
    Number,
    TrueFlag,
    Timestamp,
}

pub(crate) fn check_keys(
    condition: &Condition,
    allowed: &[(&str, Expect)],
) -> Result<(), ValidationError> {
    if condition.is_empty() {
        return Err(ValidationError::EmptyCondition);
    }
    for (key, value) in &condition.0 {
        let Some((_, expect)) = allowed.iter().find(|(name, _)| *name == key.as_str()) else {
            return Err(ValidationError::UnsupportedKey { key: key.clone() });
        };
        match (expect, value) {
            (Expect::Number, Threshold::Number(n)) if !n.is_finite() => {
                return Err(ValidationError::NonFinite { key: key.clone() });
            }
            (Expect::Number, Threshold::Number(_)) => {}
            (Expect::TrueFlag, Threshold::Flag(true)) => {}
            (Expect::TrueFlag, Threshold::Flag(false)) => {
                return Err(ValidationError::MustBeTrue { key: key.clone() });
            }
            (Expect::Timestamp, Threshold::At(_)) => {}
            (expect, other) => {
                tracing::debug!(%key, got = other.type_name(), "condition value has wrong type");
                return Err(ValidationError::WrongValueType {
                    key: key.clone(),
                    expected: match expect {
                        Expect::Number => "a number",
                        Expect::TrueFlag => "true",
                        Expect::Timestamp => "an RFC 3339 timestamp",
                    },
                });
            }
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "condition_tests.rs"]
mod tests;
