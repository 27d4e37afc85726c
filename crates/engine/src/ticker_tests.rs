// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use chrono::TimeZone;
use tw_adapters::{FakeFetcher, FakeNotifier, NotifyError};
use tw_core::{Condition, FakeClock, OwnerId, WatchId};
use tw_storage::{DeliveryLog, MemoryDeliveryLog, MemoryWatchStore};
use yare::parameterized;

const CADENCE: Duration = Duration::from_secs(300);

struct Harness {
    clock: FakeClock,
    store: Arc<MemoryWatchStore>,
    fetcher: FakeFetcher,
    notifier: FakeNotifier,
    log: Arc<MemoryDeliveryLog>,
    ticker: Ticker<FakeClock>,
}

impl Harness {
    fn new() -> Self {
        Self::build(8, Duration::from_secs(10), ReschedulePolicy::Anchor)
    }

    fn build(max_workers: usize, fetch_timeout: Duration, reschedule: ReschedulePolicy) -> Self {
        let clock = FakeClock::ymd_hms(2026, 3, 1, 12, 0, 0);
        let store = Arc::new(MemoryWatchStore::new());
        let fetcher = FakeFetcher::new();
        let notifier = FakeNotifier::new();
        let log = Arc::new(MemoryDeliveryLog::new(100));
        let shared = Arc::new(Shared {
            store: store.clone(),
            cache: TtlCache::new(Duration::from_secs(60), clock.clone()),
            dispatcher: NotificationDispatcher::new(notifier.clone(), log.clone(), clock.clone()),
            clock: clock.clone(),
            fetch_timeout,
            max_workers,
            reschedule,
        });
        let strategy = Arc::new(DomainStrategy::price(fetcher.clone()));
        let ticker = Ticker::new(Domain::price(), CADENCE, strategy, shared);
        Self {
            clock,
            store,
            fetcher,
            notifier,
            log,
            ticker,
        }
    }

    fn watch(&self, id: &str, subject: &str, above: f64) -> Watch {
        Watch::new(
            WatchId::new(id),
            OwnerId::new("alice"),
            Domain::price(),
            subject,
            Condition::new().with("aboveValue", above),
            self.clock.now(),
        )
    }

    fn add(&self, watch: Watch) {
        self.store.create(watch).unwrap();
    }

    fn stored(&self, id: &str) -> Watch {
        self.store
            .get(&WatchId::new(id), &OwnerId::new("alice"))
            .unwrap()
    }

    async fn tick(&self) -> TickReport {
        self.ticker.tick().await.report().cloned().unwrap()
    }
}

fn at(hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, hour, minute, 0).unwrap()
}

#[parameterized(
    anchored_chain_continues = { ReschedulePolicy::Anchor, Some(at(11, 30)), Some(at(9, 30)), at(12, 30) },
    anchored_first_firing = { ReschedulePolicy::Anchor, None, Some(at(11, 45)), at(12, 45) },
    anchored_skips_missed_occurrences = { ReschedulePolicy::Anchor, Some(at(3, 30)), Some(at(2, 30)), at(12, 30) },
    unanchored_counts_from_firing = { ReschedulePolicy::Anchor, Some(at(3, 0)), None, at(13, 0) },
    now_ignores_anchor = { ReschedulePolicy::Now, Some(at(11, 30)), Some(at(9, 30)), at(13, 0) },
)]
fn next_eligible_follows_policy(
    policy: ReschedulePolicy,
    previous: Option<DateTime<Utc>>,
    anchor: Option<DateTime<Utc>>,
    expected: DateTime<Utc>,
) {
    let hourly = IntervalSpec::parse("1h").unwrap();
    assert_eq!(
        next_eligible_at(policy, hourly, previous, anchor, at(12, 0)),
        expected
    );
}

#[tokio::test]
async fn recurring_watch_fires_at_most_once_per_interval_after_quiet_spell() {
    let h = Harness::new();
    let hourly = IntervalSpec::parse("1h").unwrap();
    h.add(h.watch("watch-1", "ETH", 3000.0).recurring_every(hourly));

    h.fetcher.set("ETH", Observation::scalar(3500.0));
    assert_eq!(h.tick().await.fired, 1);

    // Ten hours below the threshold
    h.fetcher.set("ETH", Observation::scalar(2500.0));
    for _ in 0..120 {
        h.clock.advance(CADENCE);
        assert_eq!(h.tick().await.fired, 0);
    }

    h.fetcher.set("ETH", Observation::scalar(3500.0));
    let mut fired_at = Vec::new();
    for _ in 0..24 {
        h.clock.advance(CADENCE);
        if h.tick().await.fired == 1 {
            fired_at.push(h.stored("watch-1").last_triggered_at.unwrap());
        }
    }

    assert_eq!(fired_at.len(), 2, "two hours of ticks: {:?}", fired_at);
    assert_eq!(fired_at[1] - fired_at[0], chrono::TimeDelta::hours(1));
}

#[tokio::test]
async fn unsatisfied_watch_is_recorded_but_not_fired() {
    let h = Harness::new();
    h.fetcher.set("BTC", Observation::scalar(49000.0));
    h.add(h.watch("watch-1", "BTC", 50000.0));

    let report = h.tick().await;

    assert_eq!(report.evaluated, 1);
    assert_eq!(report.fired, 0);
    let stored = h.stored("watch-1");
    assert!(stored.active);
    assert_eq!(stored.last_evaluated_at, Some(h.clock.now()));
    assert_eq!(stored.last_triggered_at, None);
    assert!(h.notifier.calls().is_empty());
}

#[tokio::test]
async fn satisfied_one_shot_fires_once_and_deactivates() {
    let h = Harness::new();
    h.fetcher.set("BTC", Observation::scalar(51000.0));
    h.add(h.watch("watch-1", "BTC", 50000.0));

    let report = h.tick().await;
    assert_eq!(report.fired, 1);
    assert_eq!(report.delivery_failures, 0);

    let stored = h.stored("watch-1");
    assert!(!stored.active);
    assert_eq!(stored.last_triggered_at, Some(h.clock.now()));
    assert_eq!(h.notifier.calls().len(), 1);
    assert_eq!(h.log.len(), 1);

    h.clock.advance(CADENCE);
    let report = h.tick().await;
    assert_eq!(report.evaluated, 0);
    assert_eq!(h.notifier.calls().len(), 1);
}

#[tokio::test]
async fn delivery_failure_still_deactivates() {
    let h = Harness::new();
    h.fetcher.set("BTC", Observation::scalar(51000.0));
    h.notifier.set_failure(Some(NotifyError::Failed("gateway down".into())));
    h.add(h.watch("watch-1", "BTC", 50000.0));

    let report = h.tick().await;

    assert_eq!(report.fired, 1);
    assert_eq!(report.delivery_failures, 1);
    assert!(!h.stored("watch-1").active);
    assert!(!h.log.recent(1)[0].delivered());
}

#[tokio::test]
async fn fetch_failure_skips_evaluation_but_advances_last_evaluated() {
    let h = Harness::new();
    h.fetcher.fail("BTC", FetchError::Unavailable("503".into()));
    h.add(h.watch("watch-1", "BTC", 50000.0));

    let report = h.tick().await;

    assert_eq!(report.evaluated, 1);
    assert_eq!(report.fetch_failures, 1);
    let stored = h.stored("watch-1");
    assert!(stored.active);
    assert_eq!(stored.last_evaluated_at, Some(h.clock.now()));

    // Not due again until the cadence elapses
    assert_eq!(h.tick().await.evaluated, 0);
}

#[tokio::test]
async fn one_failing_subject_does_not_abort_the_tick() {
    let h = Harness::new();
    h.fetcher.fail("ETH", FetchError::Malformed("bad json".into()));
    h.fetcher.set("BTC", Observation::scalar(51000.0));
    h.add(h.watch("watch-1", "ETH", 1000.0));
    h.add(h.watch("watch-2", "BTC", 50000.0));

    let report = h.tick().await;

    assert_eq!(report.evaluated, 2);
    assert_eq!(report.fetch_failures, 1);
    assert_eq!(report.fired, 1);
}

#[tokio::test]
async fn observations_are_shared_through_the_cache() {
    let h = Harness::build(1, Duration::from_secs(10), ReschedulePolicy::Anchor);
    h.fetcher.set("BTC", Observation::scalar(49000.0));
    h.add(h.watch("watch-1", "BTC", 50000.0));
    h.add(h.watch("watch-2", "BTC", 60000.0));

    h.tick().await;
    assert_eq!(h.fetcher.calls().len(), 1);

    // Past both the cadence and the cache TTL
    h.clock.advance(CADENCE);
    h.tick().await;
    assert_eq!(h.fetcher.calls().len(), 2);
}

#[tokio::test]
async fn expired_watches_are_deactivated_not_evaluated() {
    let h = Harness::new();
    h.fetcher.set("BTC", Observation::scalar(51000.0));
    let expires = h.clock.now() + chrono::TimeDelta::minutes(1);
    h.add(h.watch("watch-1", "BTC", 50000.0).expiring_at(expires));

    h.clock.advance(Duration::from_secs(120));
    let report = h.tick().await;

    assert_eq!(report.evaluated, 0);
    assert!(!h.stored("watch-1").active);
    assert!(h.notifier.calls().is_empty());
}

#[tokio::test]
async fn recurring_watch_waits_for_next_eligible() {
    let h = Harness::build(8, Duration::from_secs(10), ReschedulePolicy::Now);
    h.fetcher.set("BTC", Observation::scalar(51000.0));
    let hourly = IntervalSpec::parse("1h").unwrap();
    h.add(h.watch("watch-1", "BTC", 50000.0).recurring_every(hourly));
    let first = h.clock.now();

    assert_eq!(h.tick().await.fired, 1);
    let stored = h.stored("watch-1");
    assert!(stored.active);
    assert_eq!(stored.next_eligible_at, Some(first + chrono::TimeDelta::hours(1)));

    h.clock.advance(CADENCE);
    assert_eq!(h.tick().await.evaluated, 0);

    h.clock.set(first + chrono::TimeDelta::hours(1));
    assert_eq!(h.tick().await.fired, 1);
    assert_eq!(h.notifier.calls().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn slow_fetch_times_out_as_a_fetch_failure() {
    let h = Harness::build(8, Duration::from_secs(5), ReschedulePolicy::Anchor);
    h.fetcher.set("BTC", Observation::scalar(51000.0));
    h.fetcher.set_delay("BTC", Duration::from_secs(30));
    h.add(h.watch("watch-1", "BTC", 50000.0));

    let report = h.tick().await;

    assert_eq!(report.fetch_failures, 1);
    assert_eq!(report.fired, 0);
    let stored = h.stored("watch-1");
    assert!(stored.active);
    assert_eq!(stored.last_evaluated_at, Some(h.clock.now()));
}

#[tokio::test(start_paused = true)]
async fn overlapping_tick_is_skipped() {
    let h = Harness::new();
    h.fetcher.set("BTC", Observation::scalar(49000.0));
    h.fetcher.set_delay("BTC", Duration::from_secs(1));
    h.add(h.watch("watch-1", "BTC", 50000.0));
    assert_eq!(h.ticker.state(), TickerState::Idle);

    let (first, second) = tokio::join!(h.ticker.tick(), async {
        tokio::task::yield_now().await;
        assert_eq!(h.ticker.state(), TickerState::Ticking);
        h.ticker.tick().await
    });

    assert!(matches!(first, TickOutcome::Completed(_)));
    assert_eq!(second, TickOutcome::Skipped);
    assert_eq!(h.ticker.state(), TickerState::Idle);
}

#[tokio::test(start_paused = true)]
async fn evaluations_are_bounded_by_max_workers() {
    let h = Harness::build(2, Duration::from_secs(60), ReschedulePolicy::Anchor);
    for (i, subject) in ["A", "B", "C", "D"].iter().enumerate() {
        h.fetcher.set(subject, Observation::scalar(1.0));
        h.fetcher.set_delay(subject, Duration::from_secs(10));
        h.add(h.watch(&format!("watch-{}", i), subject, 5.0));
    }

    let start = tokio::time::Instant::now();
    let report = h.tick().await;

    assert_eq!(report.evaluated, 4);
    // Two waves of two ten-second fetches
    let elapsed = start.elapsed();
    assert!(elapsed >= Duration::from_secs(20), "{:?}", elapsed);
    assert!(elapsed < Duration::from_secs(30), "{:?}", elapsed);
}

#[tokio::test(start_paused = true)]
async fn run_ticks_until_shutdown() {
    let h = Harness::new();
    h.fetcher.set("BTC", Observation::scalar(51000.0));
    h.add(h.watch("watch-1", "BTC", 50000.0));

    let (tx, rx) = watch::channel(false);
    let ticker = Arc::new(h.ticker);
    let task = tokio::spawn(Arc::clone(&ticker).run(rx));

    // First interval tick completes immediately
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(h.notifier.calls().len(), 1);

    tx.send(true).unwrap();
    task.await.unwrap();
}
