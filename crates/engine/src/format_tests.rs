// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use tw_core::{
    Clock, Condition, Domain, FakeClock, IntervalSpec, OwnerId, Watch, WatchId, WeatherSnapshot,
};

fn watch(domain: Domain, subject: &str, condition: Condition) -> Watch {
    Watch::new(
        WatchId::new("watch-1"),
        OwnerId::new("alice"),
        domain,
        subject,
        condition,
        FakeClock::ymd_hms(2026, 3, 1, 9, 0, 0).now(),
    )
}

#[test]
fn default_formatter_names_matched_thresholds() {
    let w = watch(
        Domain::price(),
        "BTC",
        Condition::new().with("aboveValue", 50000.0),
    );
    let n = DefaultFormatter.format(
        &w,
        &Observation::scalar_with_unit(51000.0, "USD"),
        &["aboveValue".to_string()],
    );

    assert_eq!(n.watch_id, WatchId::new("watch-1"));
    assert_eq!(n.title, "price alert: BTC");
    assert_eq!(n.message, "BTC: aboveValue 50000 (observed 51000 USD)");
}

#[test]
fn default_formatter_joins_multiple_matches() {
    let w = watch(
        Domain::weather(),
        "Berlin",
        Condition::new().with("tempBelow", 0.0).with("snow", true),
    );
    let n = DefaultFormatter.format(
        &w,
        &Observation::Weather(WeatherSnapshot {
            temp: -3.0,
            wind: 10.0,
            rain: false,
            snow: true,
        }),
        &["snow".to_string(), "tempBelow".to_string()],
    );

    assert!(n.message.contains("snow true, tempBelow 0"), "{}", n.message);
}

#[test]
fn reminder_formatter_uses_subject() {
    let w = watch(Domain::reminder(), "Pay rent", Condition::new());
    let n = ReminderFormatter.format(&w, &Observation::clock(w.created_at), &[]);
    assert_eq!(n.title, "Reminder");
    assert_eq!(n.message, "Pay rent");
}

#[test]
fn reminder_formatter_mentions_recurrence() {
    let w = watch(Domain::reminder(), "Stand-up", Condition::new())
        .recurring_every(IntervalSpec::parse("1d").unwrap());
    let n = ReminderFormatter.format(&w, &Observation::clock(w.created_at), &[]);
    assert_eq!(n.message, "Stand-up (repeats every 1d)");
}
