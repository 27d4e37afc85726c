// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! New-item detection for keyword and feed watches

use super::{check_keys, Condition, ConditionEvaluator, EvalContext, Expect, Verdict};
use crate::error::ValidationError;
use crate::observation::Observation;

pub const NEW_ITEMS: &str = "newItems";

/// Satisfied when any item was published strictly after the baseline: the
/// later of the watch's creation and its last firing. A recurring watch
/// therefore only fires again for items it has not reported yet.
#[derive(Debug, Clone, Copy, Default)]
pub struct FreshnessEvaluator;

impl ConditionEvaluator for FreshnessEvaluator {
    fn validate(&self, condition: &Condition) -> Result<(), ValidationError> {
        check_keys(condition, &[(NEW_ITEMS, Expect::TrueFlag)])
    }

    fn evaluate(
        &self,
        condition: &Condition,
        observed: &Observation,
        ctx: &EvalContext,
    ) -> Verdict {
        let Observation::Items { items } = observed else {
            return Verdict::NotSatisfied;
        };
        if condition.flag(NEW_ITEMS) != Some(true) {
            return Verdict::NotSatisfied;
        }

        let baseline = ctx
            .last_triggered_at
            .map_or(ctx.created_at, |fired| fired.max(ctx.created_at));
        if items.iter().any(|item| item.published_at > baseline) {
            Verdict::Satisfied {
                matched: vec![NEW_ITEMS.to_string()],
            }
        } else {
            Verdict::NotSatisfied
        }
    }
}

#[cfg(test)]
#[path = "freshness_tests.rs"]
mod tests;
