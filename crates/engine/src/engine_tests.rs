// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::registry::DomainStrategy;
use chrono::TimeDelta;
use std::time::Duration;
use tw_adapters::{FakeFetcher, FakeNotifier};
use tw_core::{FakeClock, IntervalError, Observation, SequentialIdGen, SystemClock};
use tw_storage::MemoryWatchStore;
use yare::parameterized;

struct Setup {
    clock: FakeClock,
    fetcher: FakeFetcher,
    notifier: FakeNotifier,
    engine: WatchEngine<FakeClock, SequentialIdGen>,
}

fn setup_with(config: EngineConfig) -> Setup {
    let clock = FakeClock::ymd_hms(2026, 3, 1, 12, 0, 0);
    let fetcher = FakeFetcher::new();
    let notifier = FakeNotifier::new();

    let mut registry = DomainRegistry::new();
    registry
        .register(Domain::price(), DomainStrategy::price(fetcher.clone()))
        .register(Domain::reminder(), DomainStrategy::reminder(clock.clone()));

    let engine = WatchEngine::new(
        config,
        registry,
        EngineDeps {
            store: Arc::new(MemoryWatchStore::new()),
            notifier: Arc::new(notifier.clone()),
            clock: clock.clone(),
            id_gen: SequentialIdGen::default(),
        },
    );
    Setup {
        clock,
        fetcher,
        notifier,
        engine,
    }
}

fn setup() -> Setup {
    setup_with(EngineConfig::default())
}

fn alice() -> OwnerId {
    OwnerId::new("alice")
}

fn btc_above(value: f64) -> NewWatch {
    NewWatch::new(
        alice(),
        Domain::price(),
        "BTC",
        Condition::new().with("aboveValue", value),
    )
}

#[parameterized(
    blank_subject = { "price", "   ", Condition::new().with("aboveValue", 1.0), None, None, ValidationError::EmptySubject },
    empty_condition = { "price", "BTC", Condition::new(), None, None, ValidationError::EmptyCondition },
    unknown_domain = { "stocks", "AAPL", Condition::new().with("aboveValue", 1.0), None, None, ValidationError::UnknownDomain("stocks".into()) },
    key_from_another_domain = { "price", "BTC", Condition::new().with("newItems", true), None, None, ValidationError::UnsupportedKey { key: "newItems".into() } },
    bad_recurrence = { "price", "BTC", Condition::new().with("aboveValue", 1.0), Some("fortnightly"), None, ValidationError::Interval(IntervalError::InvalidFormat { input: "fortnightly".into(), reason: "missing amount" }) },
    expiry_now = { "price", "BTC", Condition::new().with("aboveValue", 1.0), None, Some(0), ValidationError::ExpiryInPast },
    expiry_past = { "price", "BTC", Condition::new().with("aboveValue", 1.0), None, Some(-60), ValidationError::ExpiryInPast },
)]
fn invalid_watches_are_rejected_and_not_stored(
    domain: &str,
    subject: &str,
    condition: Condition,
    recurrence: Option<&str>,
    expires_in_secs: Option<i64>,
    expected: ValidationError,
) {
    let s = setup();
    let mut request = NewWatch::new(alice(), Domain::new(domain), subject, condition);
    request.recurrence = recurrence.map(str::to_string);
    request.expires_at = expires_in_secs.map(|secs| s.clock.now() + TimeDelta::seconds(secs));

    match s.engine.create_watch(request) {
        Err(EngineError::Validation(err)) => assert_eq!(err, expected),
        other => panic!("expected validation error, got {:?}", other),
    }
    assert!(s.engine.list_watches(&alice()).unwrap().is_empty());
}

#[test]
fn create_stores_trimmed_subject_and_schedule() {
    let s = setup();
    let expires = s.clock.now() + TimeDelta::days(7);

    let id = s
        .engine
        .create_watch(
            NewWatch::new(
                alice(),
                Domain::price(),
                "  BTC ",
                Condition::new().with("aboveValue", 50000.0),
            )
            .recurring("1d")
            .expiring_at(expires),
        )
        .unwrap();

    assert_eq!(id, WatchId::new("watch-1"));
    let watch = s.engine.get_watch(&id, &alice()).unwrap();
    assert_eq!(watch.subject, "BTC");
    assert!(watch.active);
    assert!(watch.recurring);
    assert_eq!(watch.interval, Some(IntervalSpec::parse("1d").unwrap()));
    assert_eq!(watch.expires_at, Some(expires));
    assert_eq!(watch.created_at, s.clock.now());
}

#[test]
fn list_watches_is_scoped_to_owner() {
    let s = setup();
    s.engine.create_watch(btc_above(1.0)).unwrap();
    s.engine.create_watch(btc_above(2.0)).unwrap();
    let mut bobs = btc_above(3.0);
    bobs.owner_id = OwnerId::new("bob");
    s.engine.create_watch(bobs).unwrap();

    assert_eq!(s.engine.list_watches(&alice()).unwrap().len(), 2);
    assert_eq!(s.engine.list_watches(&OwnerId::new("bob")).unwrap().len(), 1);
    assert!(s
        .engine
        .list_watches(&OwnerId::new("carol"))
        .unwrap()
        .is_empty());
}

#[test]
fn cancel_checks_ownership() {
    let s = setup();
    let id = s.engine.create_watch(btc_above(1.0)).unwrap();

    let denied = s
        .engine
        .cancel_watch(&id, &OwnerId::new("mallory"))
        .unwrap_err();
    assert!(matches!(denied, EngineError::AccessDenied(_)));

    let missing = s
        .engine
        .cancel_watch(&WatchId::new("watch-99"), &alice())
        .unwrap_err();
    assert!(matches!(missing, EngineError::NotFound(_)));
    assert_eq!(denied.public_message(), missing.public_message());

    assert!(s.engine.get_watch(&id, &alice()).unwrap().active);
}

#[tokio::test]
async fn cancelled_watch_is_never_evaluated() {
    let s = setup();
    s.fetcher.set("BTC", Observation::scalar(51000.0));
    let id = s.engine.create_watch(btc_above(50000.0)).unwrap();

    s.engine.cancel_watch(&id, &alice()).unwrap();
    let outcome = s.engine.tick(&Domain::price()).await.unwrap();

    assert_eq!(outcome.report().unwrap().evaluated, 0);
    assert!(s.notifier.calls().is_empty());
    assert!(!s.engine.get_watch(&id, &alice()).unwrap().active);
}

#[test]
fn delete_removes_the_watch() {
    let s = setup();
    let id = s.engine.create_watch(btc_above(1.0)).unwrap();

    s.engine.delete_watch(&id, &alice()).unwrap();

    assert!(matches!(
        s.engine.get_watch(&id, &alice()),
        Err(EngineError::NotFound(_))
    ));
}

#[tokio::test]
async fn tick_for_unregistered_domain_fails() {
    let s = setup();
    let err = s.engine.tick(&Domain::weather()).await.unwrap_err();
    assert!(matches!(err, EngineError::UnknownDomain(_)));
}

#[test]
fn ticker_cadence_comes_from_config() {
    let s = setup();
    let price = s.engine.ticker(&Domain::price()).unwrap();
    assert_eq!(price.cadence(), Duration::from_secs(300));
    let reminder = s.engine.ticker(&Domain::reminder()).unwrap();
    assert_eq!(reminder.cadence(), Duration::from_secs(60));

    let config = EngineConfig::from_toml_str("[domains.price]\ncadence = \"1m\"\n").unwrap();
    let s = setup_with(config);
    let price = s.engine.ticker(&Domain::price()).unwrap();
    assert_eq!(price.cadence(), Duration::from_secs(60));
}

#[tokio::test(start_paused = true)]
async fn started_engine_fires_due_reminders_and_shuts_down() {
    let s = setup();
    let id = s
        .engine
        .create_watch(NewWatch::new(
            alice(),
            Domain::reminder(),
            "Call the dentist",
            Condition::new().with("dueAt", s.clock.now()),
        ))
        .unwrap();

    let handle = s.engine.start();
    tokio::time::sleep(Duration::from_millis(10)).await;

    let calls = s.notifier.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].notification.message, "Call the dentist");
    assert_eq!(s.engine.deliveries().for_watch(&id).len(), 1);

    handle.shutdown().await;
    assert!(!s.engine.get_watch(&id, &alice()).unwrap().active);
}

#[tokio::test]
async fn wall_clock_ticks_evaluate_a_due_watch_every_period() {
    let fetcher = FakeFetcher::new().uncached();
    fetcher.set("BTC", Observation::scalar(49000.0));
    let mut registry = DomainRegistry::new();
    registry.register(
        Domain::price(),
        DomainStrategy::price(fetcher.clone()).with_cadence(Duration::from_millis(100)),
    );
    let engine = WatchEngine::new(
        EngineConfig::default(),
        registry,
        EngineDeps {
            store: Arc::new(MemoryWatchStore::new()),
            notifier: Arc::new(FakeNotifier::new()),
            clock: SystemClock,
            id_gen: SequentialIdGen::default(),
        },
    );
    engine.create_watch(btc_above(50000.0)).unwrap();

    let handle = engine.start();
    tokio::time::sleep(Duration::from_millis(2050)).await;
    handle.shutdown().await;

    // 21 timer ticks (the first is immediate); allow for a slow machine
    let evaluations = fetcher.calls().len();
    assert!(evaluations >= 18, "only {} evaluations", evaluations);
}
