// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Due dates for reminders

use super::{check_keys, Condition, ConditionEvaluator, EvalContext, Expect, Verdict};
use crate::error::ValidationError;
use crate::observation::Observation;
use chrono::{DateTime, Utc};

pub const DUE_AT: &str = "dueAt";

/// `dueAt` holds once the observed clock reaches the due date
#[derive(Debug, Clone, Copy, Default)]
pub struct DueDateEvaluator;

impl ConditionEvaluator for DueDateEvaluator {
    fn validate(&self, condition: &Condition) -> Result<(), ValidationError> {
        check_keys(condition, &[(DUE_AT, Expect::Timestamp)])?;
        if condition.time(DUE_AT).is_none() {
            return Err(ValidationError::MissingKey {
                key: DUE_AT.to_string(),
            });
        }
        Ok(())
    }

    fn evaluate(
        &self,
        condition: &Condition,
        observed: &Observation,
        _ctx: &EvalContext,
    ) -> Verdict {
        let Observation::Clock { now } = observed else {
            return Verdict::NotSatisfied;
        };
        match condition.time(DUE_AT) {
            Some(due) if *now >= due => Verdict::Satisfied {
                matched: vec![DUE_AT.to_string()],
            },
            _ => Verdict::NotSatisfied,
        }
    }

    fn schedule_anchor(&self, condition: &Condition) -> Option<DateTime<Utc>> {
        condition.time(DUE_AT)
    }
}

#[cfg(test)]
#[path = "due_tests.rs"]
mod tests;
