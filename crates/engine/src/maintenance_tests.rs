// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::dispatcher::NotificationDispatcher;
use tw_adapters::FakeNotifier;
use tw_core::{
    Condition, Domain, FakeClock, FetchKey, Observation, OwnerId, ReschedulePolicy, TtlCache,
    Watch, WatchId,
};
use tw_storage::{MemoryDeliveryLog, MemoryWatchStore, WatchStore};

const DAY: Duration = Duration::from_secs(24 * 60 * 60);

fn setup() -> (FakeClock, Arc<MemoryWatchStore>, Arc<Maintenance<FakeClock>>) {
    let clock = FakeClock::ymd_hms(2026, 3, 1, 12, 0, 0);
    let store = Arc::new(MemoryWatchStore::new());
    let shared = Arc::new(Shared {
        store: store.clone(),
        cache: TtlCache::new(Duration::from_secs(60), clock.clone()),
        dispatcher: NotificationDispatcher::new(
            FakeNotifier::new(),
            Arc::new(MemoryDeliveryLog::new(10)),
            clock.clone(),
        ),
        clock: clock.clone(),
        fetch_timeout: Duration::from_secs(10),
        max_workers: 4,
        reschedule: ReschedulePolicy::Anchor,
    });
    let maintenance = Arc::new(Maintenance::new(shared, 30 * DAY));
    (clock, store, maintenance)
}

fn reminder(id: &str, clock: &FakeClock) -> Watch {
    Watch::new(
        WatchId::new(id),
        OwnerId::new("alice"),
        Domain::reminder(),
        "Water plants",
        Condition::new().with("dueAt", clock.now()),
        clock.now(),
    )
}

#[test]
fn sweep_drops_only_stale_entries() {
    let (clock, _store, maintenance) = setup();
    let cache = &maintenance.shared.cache;
    cache.put(FetchKey::new(Domain::price(), "BTC"), Observation::scalar(1.0));
    clock.advance(Duration::from_secs(90));
    cache.put(FetchKey::new(Domain::price(), "ETH"), Observation::scalar(2.0));

    assert_eq!(maintenance.sweep_cache(), 1);
    assert_eq!(cache.len(), 1);
}

#[test]
fn purge_removes_idle_inactive_watches() {
    let (clock, store, maintenance) = setup();
    store.create(reminder("watch-1", &clock)).unwrap();
    store.create(reminder("watch-2", &clock)).unwrap();
    store.deactivate(&WatchId::new("watch-1")).unwrap();

    clock.advance(29 * DAY);
    assert_eq!(maintenance.purge_retired().unwrap(), 0);

    clock.advance(2 * DAY);
    assert_eq!(maintenance.purge_retired().unwrap(), 1);
    assert_eq!(store.len(), 1);
    assert!(store
        .get(&WatchId::new("watch-2"), &OwnerId::new("alice"))
        .is_ok());
}

#[tokio::test(start_paused = true)]
async fn sweep_loop_runs_each_period_until_shutdown() {
    let (clock, _store, maintenance) = setup();
    maintenance
        .shared
        .cache
        .put(FetchKey::new(Domain::price(), "BTC"), Observation::scalar(1.0));
    clock.advance(Duration::from_secs(120));

    let (tx, rx) = watch::channel(false);
    let task = tokio::spawn(Arc::clone(&maintenance).run(
        MaintenanceTask::CacheSweep,
        Duration::from_secs(10),
        rx,
    ));

    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(maintenance.shared.cache.len(), 1, "first run waits a full period");

    tokio::time::sleep(Duration::from_secs(10)).await;
    assert!(maintenance.shared.cache.is_empty());

    tx.send(true).unwrap();
    task.await.unwrap();
}
