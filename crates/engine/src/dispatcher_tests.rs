// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::format::DefaultFormatter;
use tw_adapters::{FakeNotifier, Notification};
use tw_core::{Condition, Domain, FakeClock, OwnerId, WatchId};
use tw_storage::MemoryDeliveryLog;

struct Setup {
    notifier: FakeNotifier,
    log: Arc<MemoryDeliveryLog>,
    clock: FakeClock,
    dispatcher: NotificationDispatcher<FakeClock>,
}

fn setup() -> Setup {
    let notifier = FakeNotifier::new();
    let log = Arc::new(MemoryDeliveryLog::new(10));
    let clock = FakeClock::ymd_hms(2026, 3, 1, 12, 0, 0);
    let dispatcher = NotificationDispatcher::new(notifier.clone(), log.clone(), clock.clone());
    Setup {
        notifier,
        log,
        clock,
        dispatcher,
    }
}

fn btc_watch(clock: &FakeClock) -> Watch {
    Watch::new(
        WatchId::new("watch-1"),
        OwnerId::new("alice"),
        Domain::price(),
        "BTC",
        Condition::new().with("aboveValue", 50000.0),
        clock.now(),
    )
}

struct SilentFormatter;

impl MessageFormatter for SilentFormatter {
    fn format(&self, watch: &Watch, _observed: &Observation, _matched: &[String]) -> Notification {
        Notification::new(watch.id.clone(), "", "")
    }
}

#[tokio::test]
async fn delivered_firing_is_sent_and_logged() {
    let s = setup();
    let watch = btc_watch(&s.clock);

    let outcome = s
        .dispatcher
        .dispatch(
            &watch,
            &Observation::scalar(51000.0),
            &["aboveValue".to_string()],
            &DefaultFormatter,
        )
        .await;

    assert!(outcome.is_delivered());
    let calls = s.notifier.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].owner, OwnerId::new("alice"));

    let records = s.log.for_watch(&watch.id);
    assert_eq!(records.len(), 1);
    assert!(records[0].delivered());
    assert_eq!(records[0].at, s.clock.now());
    assert_eq!(records[0].message, calls[0].notification.message);
}

#[tokio::test]
async fn failed_delivery_is_reported_and_logged() {
    let s = setup();
    s.notifier.set_failure(Some(NotifyError::Failed("gateway down".into())));
    let watch = btc_watch(&s.clock);

    let outcome = s
        .dispatcher
        .dispatch(&watch, &Observation::scalar(51000.0), &[], &DefaultFormatter)
        .await;

    assert_eq!(
        outcome,
        DeliveryOutcome::Failed(NotifyError::Failed("gateway down".into()))
    );
    let records = s.dispatcher.delivery_log().recent(10);
    assert_eq!(records.len(), 1);
    assert!(matches!(
        &records[0].outcome,
        DeliveryStatus::Failed { reason } if reason.contains("gateway down")
    ));
}

#[tokio::test]
async fn empty_message_never_reaches_the_notifier() {
    let s = setup();
    let watch = btc_watch(&s.clock);

    let outcome = s
        .dispatcher
        .dispatch(&watch, &Observation::scalar(51000.0), &[], &SilentFormatter)
        .await;

    assert!(matches!(outcome, DeliveryOutcome::Failed(NotifyError::Rejected(_))));
    assert!(s.notifier.calls().is_empty());
    assert_eq!(s.log.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn hung_notifier_times_out_as_failed_delivery() {
    let s = setup();
    let dispatcher =
        NotificationDispatcher::new(s.notifier.clone(), s.log.clone(), s.clock.clone())
            .with_send_timeout(Duration::from_secs(5));
    s.notifier.set_delay(Some(Duration::from_secs(3600)));
    let watch = btc_watch(&s.clock);

    let started = tokio::time::Instant::now();
    let outcome = dispatcher
        .dispatch(&watch, &Observation::scalar(51000.0), &[], &DefaultFormatter)
        .await;

    assert_eq!(
        outcome,
        DeliveryOutcome::Failed(NotifyError::Timeout(Duration::from_secs(5)))
    );
    assert!(started.elapsed() < Duration::from_secs(60));
    assert!(!s.log.recent(1)[0].delivered());
}
