// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Numeric thresholds over a single scalar (prices, quotes)

use super::{check_keys, Condition, ConditionEvaluator, EvalContext, Expect, Verdict};
use crate::error::ValidationError;
use crate::observation::Observation;

pub const ABOVE_VALUE: &str = "aboveValue";
pub const BELOW_VALUE: &str = "belowValue";

/// `aboveValue` holds at `value >= threshold`, `belowValue` at
/// `value <= threshold`. With both present either one satisfies.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThresholdEvaluator;

impl ConditionEvaluator for ThresholdEvaluator {
    fn validate(&self, condition: &Condition) -> Result<(), ValidationError> {
        check_keys(
            condition,
            &[(ABOVE_VALUE, Expect::Number), (BELOW_VALUE, Expect::Number)],
        )
    }

    fn evaluate(
        &self,
        condition: &Condition,
        observed: &Observation,
        _ctx: &EvalContext,
    ) -> Verdict {
        let Observation::Scalar { value, .. } = observed else {
            return Verdict::NotSatisfied;
        };

        let mut matched = Vec::new();
        if condition.number(ABOVE_VALUE).is_some_and(|t| *value >= t) {
            matched.push(ABOVE_VALUE.to_string());
        }
        if condition.number(BELOW_VALUE).is_some_and(|t| *value <= t) {
            matched.push(BELOW_VALUE.to_string());
        }
        Verdict::from_matched(matched)
    }
}

#[cfg(test)]
#[path = "threshold_tests.rs"]
mod tests;
