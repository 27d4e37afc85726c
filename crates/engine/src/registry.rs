// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Domain registry: the fetcher, evaluator and formatter behind each domain

use crate::format::{DefaultFormatter, MessageFormatter, ReminderFormatter};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tw_adapters::{ClockFetcher, DataFetcher, TracedFetcher};
use tw_core::{
    Clock, CompoundEvaluator, ConditionEvaluator, Domain, DueDateEvaluator, FreshnessEvaluator,
    MatchMode, ThresholdEvaluator,
};

/// How one domain is observed, judged and reported
pub struct DomainStrategy {
    pub(crate) fetcher: Arc<dyn DataFetcher>,
    pub(crate) evaluator: Arc<dyn ConditionEvaluator>,
    pub(crate) formatter: Arc<dyn MessageFormatter>,
    /// Overrides the configured cadence when set
    pub(crate) cadence: Option<Duration>,
}

impl DomainStrategy {
    pub fn new(fetcher: impl DataFetcher, evaluator: impl ConditionEvaluator + 'static) -> Self {
        Self {
            fetcher: Arc::new(fetcher),
            evaluator: Arc::new(evaluator),
            formatter: Arc::new(DefaultFormatter),
            cadence: None,
        }
    }

    pub fn with_formatter(mut self, formatter: impl MessageFormatter + 'static) -> Self {
        self.formatter = Arc::new(formatter);
        self
    }

    pub fn with_cadence(mut self, cadence: Duration) -> Self {
        self.cadence = Some(cadence);
        self
    }

    /// Scalar thresholds (`aboveValue` / `belowValue`)
    pub fn price(fetcher: impl DataFetcher) -> Self {
        Self::new(fetcher, ThresholdEvaluator)
    }

    /// Multi-field weather conditions
    pub fn weather(fetcher: impl DataFetcher, mode: MatchMode) -> Self {
        Self::new(fetcher, CompoundEvaluator::new(mode))
    }

    /// Feed freshness (`newItems`)
    pub fn news(fetcher: impl DataFetcher) -> Self {
        Self::new(fetcher, FreshnessEvaluator)
    }

    /// Due-date reminders driven by `clock`
    pub fn reminder<C: Clock>(clock: C) -> Self {
        Self::new(ClockFetcher::new(clock), DueDateEvaluator).with_formatter(ReminderFormatter)
    }

    pub fn evaluator(&self) -> &dyn ConditionEvaluator {
        self.evaluator.as_ref()
    }
}

/// Strategies keyed by domain. Watches for unregistered domains are rejected.
#[derive(Default)]
pub struct DomainRegistry {
    strategies: BTreeMap<Domain, Arc<DomainStrategy>>,
}

impl DomainRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the strategy for `domain`, replacing any previous one.
    ///
    /// The fetcher is wrapped with tracing on the way in.
    pub fn register(&mut self, domain: Domain, mut strategy: DomainStrategy) -> &mut Self {
        strategy.fetcher = Arc::new(TracedFetcher::new(domain.clone(), strategy.fetcher));
        if self
            .strategies
            .insert(domain.clone(), Arc::new(strategy))
            .is_some()
        {
            tracing::warn!(%domain, "replaced domain strategy");
        }
        self
    }

    pub fn get(&self, domain: &Domain) -> Option<&Arc<DomainStrategy>> {
        self.strategies.get(domain)
    }

    pub fn contains(&self, domain: &Domain) -> bool {
        self.strategies.contains_key(domain)
    }

    /// Registered domains in name order
    pub fn domains(&self) -> impl Iterator<Item = &Domain> {
        self.strategies.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Domain, &Arc<DomainStrategy>)> {
        self.strategies.iter()
    }

    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }
}
