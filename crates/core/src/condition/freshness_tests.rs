// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::observation::FeedItem;
use chrono::{DateTime, TimeZone, Utc};

fn at(hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, hour, 0, 0).unwrap()
}

fn items(hours: &[u32]) -> Observation {
    Observation::items(
        hours
            .iter()
            .map(|h| FeedItem::new(format!("a{}", h), format!("story at {}", h), at(*h)))
            .collect(),
    )
}

fn condition() -> Condition {
    Condition::new().with(NEW_ITEMS, true)
}

#[test]
fn item_after_creation_is_new() {
    let ctx = EvalContext {
        now: at(12),
        created_at: at(8),
        last_triggered_at: None,
    };
    assert!(FreshnessEvaluator
        .evaluate(&condition(), &items(&[7, 9]), &ctx)
        .is_satisfied());
}

#[test]
fn item_published_exactly_at_baseline_is_not_new() {
    let ctx = EvalContext {
        now: at(12),
        created_at: at(8),
        last_triggered_at: None,
    };
    assert!(!FreshnessEvaluator
        .evaluate(&condition(), &items(&[6, 8]), &ctx)
        .is_satisfied());
}

#[test]
fn last_firing_moves_the_baseline() {
    let ctx = EvalContext {
        now: at(12),
        created_at: at(8),
        last_triggered_at: Some(at(10)),
    };
    assert!(!FreshnessEvaluator
        .evaluate(&condition(), &items(&[9, 10]), &ctx)
        .is_satisfied());
    assert!(FreshnessEvaluator
        .evaluate(&condition(), &items(&[11]), &ctx)
        .is_satisfied());
}

#[test]
fn empty_feed_is_not_satisfied() {
    let ctx = EvalContext {
        now: at(12),
        created_at: at(8),
        last_triggered_at: None,
    };
    assert_eq!(
        FreshnessEvaluator.evaluate(&condition(), &items(&[]), &ctx),
        Verdict::NotSatisfied
    );
}

#[test]
fn validate_accepts_only_new_items_flag() {
    assert!(FreshnessEvaluator.validate(&condition()).is_ok());
    assert!(FreshnessEvaluator
        .validate(&Condition::new().with(NEW_ITEMS, 1.0))
        .is_err());
    assert!(FreshnessEvaluator
        .validate(&condition().with("aboveValue", 1.0))
        .is_err());
}
