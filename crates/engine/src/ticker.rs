// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-domain ticker
//!
//! Each registered domain gets one ticker. A tick lists the domain's due
//! watches, fetches an observation for each (through the TTL cache), runs the
//! domain's evaluator, and on a match dispatches a notification and then
//! deactivates (one-shot) or reschedules (recurring) the watch.
//!
//! Ticks for one domain never overlap: a tick requested while another is
//! running returns [`TickOutcome::Skipped`].

use crate::dispatcher::NotificationDispatcher;
use crate::registry::DomainStrategy;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{watch, Mutex, Semaphore};
use tokio::task::JoinSet;
use tokio::time::MissedTickBehavior;
use tw_adapters::FetchError;
use tw_core::{
    Clock, Domain, EvalContext, FetchKey, IntervalSpec, Observation, ReschedulePolicy, TtlCache,
    Verdict, Watch,
};
use tw_storage::{StoreError, WatchStore};

pub(crate) type ObservationCache<C> = TtlCache<FetchKey, Observation, C>;

/// Collaborators shared by every ticker and maintenance task
pub(crate) struct Shared<C: Clock> {
    pub(crate) store: Arc<dyn WatchStore>,
    pub(crate) cache: ObservationCache<C>,
    pub(crate) dispatcher: NotificationDispatcher<C>,
    pub(crate) clock: C,
    pub(crate) fetch_timeout: Duration,
    pub(crate) max_workers: usize,
    pub(crate) reschedule: ReschedulePolicy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickerState {
    Idle,
    Ticking,
}

/// Counters for one tick
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    pub evaluated: usize,
    pub fired: usize,
    pub fetch_failures: usize,
    pub delivery_failures: usize,
    /// Bookkeeping writes that failed (the watch is retried next tick)
    pub store_failures: usize,
}

impl TickReport {
    fn absorb(&mut self, other: TickReport) {
        self.evaluated += other.evaluated;
        self.fired += other.fired;
        self.fetch_failures += other.fetch_failures;
        self.delivery_failures += other.delivery_failures;
        self.store_failures += other.store_failures;
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    Completed(TickReport),
    /// Another tick for the same domain was still running
    Skipped,
}

impl TickOutcome {
    pub fn report(&self) -> Option<&TickReport> {
        match self {
            TickOutcome::Completed(report) => Some(report),
            TickOutcome::Skipped => None,
        }
    }
}

/// Upper bound on missed anchor occurrences skipped one by one
const MAX_CATCH_UP: usize = 10_000;

/// Next time a recurring watch may fire again.
///
/// Watches whose evaluator supplies an anchor (due dates) stay on the
/// anchor's calendar under [`ReschedulePolicy::Anchor`], skipping occurrences
/// that are already past. Everything else is one interval after `now`, so two
/// firings are never closer than the interval.
pub fn next_eligible_at(
    policy: ReschedulePolicy,
    interval: IntervalSpec,
    previous: Option<DateTime<Utc>>,
    anchor: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> DateTime<Utc> {
    let Some(anchor) = anchor.filter(|_| policy == ReschedulePolicy::Anchor) else {
        return interval.next_occurrence(now);
    };

    let mut next = interval.next_occurrence(previous.unwrap_or(anchor));
    for _ in 0..MAX_CATCH_UP {
        if next > now {
            return next;
        }
        next = interval.next_occurrence(next);
    }
    interval.next_occurrence(now)
}

/// Drives evaluation for a single domain
pub struct Ticker<C: Clock> {
    domain: Domain,
    cadence: Duration,
    strategy: Arc<DomainStrategy>,
    shared: Arc<Shared<C>>,
    gate: Mutex<()>,
}

impl<C: Clock> Ticker<C> {
    pub(crate) fn new(
        domain: Domain,
        cadence: Duration,
        strategy: Arc<DomainStrategy>,
        shared: Arc<Shared<C>>,
    ) -> Self {
        Self {
            domain,
            cadence,
            strategy,
            shared,
            gate: Mutex::new(()),
        }
    }

    pub fn domain(&self) -> &Domain {
        &self.domain
    }

    pub fn cadence(&self) -> Duration {
        self.cadence
    }

    pub fn state(&self) -> TickerState {
        match self.gate.try_lock() {
            Ok(_) => TickerState::Idle,
            Err(_) => TickerState::Ticking,
        }
    }

    /// Run one evaluation pass over the domain's due watches
    pub async fn tick(&self) -> TickOutcome {
        let Ok(_guard) = self.gate.try_lock() else {
            tracing::debug!(domain = %self.domain, "tick already running, skipped");
            return TickOutcome::Skipped;
        };

        let start = Instant::now();
        let now = self.shared.clock.now();
        let mut report = TickReport::default();

        let due = match self.shared.store.list_due(&self.domain, now, self.cadence) {
            Ok(due) => due,
            Err(e) => {
                tracing::error!(domain = %self.domain, error = %e, "failed to list due watches");
                report.store_failures += 1;
                return TickOutcome::Completed(report);
            }
        };

        let permits = Arc::new(Semaphore::new(self.shared.max_workers.max(1)));
        let mut evaluations = JoinSet::new();
        for watch in due {
            let Ok(permit) = permits.clone().acquire_owned().await else {
                break;
            };
            let shared = Arc::clone(&self.shared);
            let strategy = Arc::clone(&self.strategy);
            let domain = self.domain.clone();
            evaluations.spawn(async move {
                let _permit = permit;
                evaluate(shared, strategy, domain, watch, now).await
            });
        }

        while let Some(joined) = evaluations.join_next().await {
            match joined {
                Ok(one) => report.absorb(one),
                Err(e) => {
                    tracing::error!(domain = %self.domain, error = %e, "evaluation task failed")
                }
            }
        }

        let elapsed_ms = start.elapsed().as_millis() as u64;
        tracing::info!(
            domain = %self.domain,
            evaluated = report.evaluated,
            fired = report.fired,
            fetch_failures = report.fetch_failures,
            delivery_failures = report.delivery_failures,
            store_failures = report.store_failures,
            elapsed_ms,
            "tick complete"
        );
        TickOutcome::Completed(report)
    }

    /// Tick every cadence until `shutdown` flips or its sender is dropped
    pub async fn run(self: Arc<Self>, mut shutdown: watch::Receiver<bool>) {
        let mut interval = tokio::time::interval(self.cadence);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        tracing::info!(domain = %self.domain, cadence = ?self.cadence, "ticker started");

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    self.tick().await;
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }
        tracing::info!(domain = %self.domain, "ticker stopped");
    }
}

async fn fetch_observation<C: Clock>(
    shared: &Shared<C>,
    strategy: &DomainStrategy,
    domain: &Domain,
    subject: &str,
) -> Result<Observation, FetchError> {
    let key = strategy.fetcher.cache_key(domain, subject);
    if let Some(hit) = key.as_ref().and_then(|k| shared.cache.get(k)) {
        tracing::trace!(%domain, subject, "cache hit");
        return Ok(hit);
    }

    let observed = tokio::time::timeout(shared.fetch_timeout, strategy.fetcher.fetch(subject))
        .await
        .map_err(|_| FetchError::Timeout(shared.fetch_timeout))??;

    if let Some(key) = key {
        shared.cache.put(key, observed.clone());
    }
    Ok(observed)
}

async fn evaluate<C: Clock>(
    shared: Arc<Shared<C>>,
    strategy: Arc<DomainStrategy>,
    domain: Domain,
    mut watch: Watch,
    now: DateTime<Utc>,
) -> TickReport {
    let mut report = TickReport {
        evaluated: 1,
        ..TickReport::default()
    };

    let observed = match fetch_observation(&shared, &strategy, &domain, &watch.subject).await {
        Ok(observed) => Some(observed),
        Err(e) => {
            tracing::warn!(
                %domain,
                watch_id = %watch.id,
                error = %e,
                "fetch failed, evaluation skipped"
            );
            report.fetch_failures += 1;
            None
        }
    };
    watch.last_evaluated_at = Some(now);

    if let Some(observed) = observed {
        let ctx = EvalContext::for_watch(&watch, now);
        if let Verdict::Satisfied { matched } =
            strategy.evaluator.evaluate(&watch.condition, &observed, &ctx)
        {
            report.fired += 1;
            let outcome = shared
                .dispatcher
                .dispatch(&watch, &observed, &matched, strategy.formatter.as_ref())
                .await;
            if !outcome.is_delivered() {
                report.delivery_failures += 1;
            }
            settle(&shared, &strategy, &mut watch, now);
        }
    }

    match shared.store.update(&watch) {
        Ok(()) => {}
        Err(StoreError::NotFound(_)) => {
            tracing::debug!(watch_id = %watch.id, "watch deleted during evaluation");
        }
        Err(e) => {
            tracing::error!(watch_id = %watch.id, error = %e, "failed to record evaluation");
            report.store_failures += 1;
        }
    }
    report
}

/// Post-firing transition: one-shots go inactive, recurring watches move
/// their eligibility forward one interval
fn settle<C: Clock>(
    shared: &Shared<C>,
    strategy: &DomainStrategy,
    watch: &mut Watch,
    now: DateTime<Utc>,
) {
    watch.last_triggered_at = Some(now);
    match watch.interval.filter(|_| watch.recurring) {
        Some(interval) => {
            let next = next_eligible_at(
                shared.reschedule,
                interval,
                watch.next_eligible_at,
                strategy.evaluator.schedule_anchor(&watch.condition),
                now,
            );
            watch.next_eligible_at = Some(next);
            tracing::info!(watch_id = %watch.id, next_eligible_at = %next, "recurring watch fired");
        }
        None => {
            watch.active = false;
            tracing::info!(watch_id = %watch.id, "one-shot watch fired");
        }
    }
}

#[cfg(test)]
#[path = "ticker_tests.rs"]
mod tests;
