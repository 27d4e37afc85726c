// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Compound weather conditions
//!
//! `tempAbove`, `tempBelow` and `windAbove` compare against the snapshot;
//! `rain` and `snow` must be `true` and hold when the snapshot reports
//! precipitation. How the listed predicates combine is a per-registration
//! [`MatchMode`].

use super::{check_keys, Condition, ConditionEvaluator, EvalContext, Expect, Verdict};
use crate::error::ValidationError;
use crate::observation::Observation;
use serde::{Deserialize, Serialize};

pub const TEMP_ABOVE: &str = "tempAbove";
pub const TEMP_BELOW: &str = "tempBelow";
pub const WIND_ABOVE: &str = "windAbove";
pub const RAIN: &str = "rain";
pub const SNOW: &str = "snow";

/// How multiple predicates in one condition combine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
    /// Any listed predicate satisfies the condition
    #[default]
    Any,
    /// Every listed predicate must hold
    All,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CompoundEvaluator {
    mode: MatchMode,
}

impl CompoundEvaluator {
    pub fn new(mode: MatchMode) -> Self {
        Self { mode }
    }

    pub fn mode(&self) -> MatchMode {
        self.mode
    }
}

impl ConditionEvaluator for CompoundEvaluator {
    fn validate(&self, condition: &Condition) -> Result<(), ValidationError> {
        check_keys(
            condition,
            &[
                (TEMP_ABOVE, Expect::Number),
                (TEMP_BELOW, Expect::Number),
                (WIND_ABOVE, Expect::Number),
                (RAIN, Expect::TrueFlag),
                (SNOW, Expect::TrueFlag),
            ],
        )
    }

    fn evaluate(
        &self,
        condition: &Condition,
        observed: &Observation,
        _ctx: &EvalContext,
    ) -> Verdict {
        let Observation::Weather(snapshot) = observed else {
            return Verdict::NotSatisfied;
        };

        let checks = [
            (TEMP_ABOVE, condition.number(TEMP_ABOVE).map(|t| snapshot.temp >= t)),
            (TEMP_BELOW, condition.number(TEMP_BELOW).map(|t| snapshot.temp <= t)),
            (WIND_ABOVE, condition.number(WIND_ABOVE).map(|t| snapshot.wind >= t)),
            (RAIN, condition.flag(RAIN).map(|_| snapshot.rain)),
            (SNOW, condition.flag(SNOW).map(|_| snapshot.snow)),
        ];
        let listed: Vec<(&str, bool)> = checks
            .into_iter()
            .filter_map(|(key, held)| held.map(|held| (key, held)))
            .collect();

        if listed.is_empty() {
            return Verdict::NotSatisfied;
        }
        if self.mode == MatchMode::All && listed.iter().any(|(_, held)| !held) {
            return Verdict::NotSatisfied;
        }

        Verdict::from_matched(
            listed
                .into_iter()
                .filter(|(_, held)| *held)
                .map(|(key, _)| key.to_string())
                .collect(),
        )
    }
}

#[cfg(test)]
#[path = "compound_tests.rs"]
mod tests;
