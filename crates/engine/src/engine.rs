// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! WatchEngine: creation, listing and cancellation of watches, plus the
//! tickers and maintenance loops that run them

use crate::dispatcher::NotificationDispatcher;
use crate::error::EngineError;
use crate::maintenance::{Maintenance, MaintenanceTask};
use crate::registry::DomainRegistry;
use crate::ticker::{Shared, TickOutcome, Ticker};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinSet;
use tw_adapters::Notifier;
use tw_core::{
    Clock, Condition, Domain, EngineConfig, IdGen, IntervalSpec, OwnerId, TtlCache,
    ValidationError, Watch, WatchId,
};
use tw_storage::{DeliveryLog, MemoryDeliveryLog, WatchStore};

/// A request to create a watch, validated by [`WatchEngine::create_watch`]
#[derive(Debug, Clone, PartialEq)]
pub struct NewWatch {
    pub owner_id: OwnerId,
    pub domain: Domain,
    pub subject: String,
    pub condition: Condition,
    /// Recurrence interval such as `"1d"`; absent for one-shot watches
    pub recurrence: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl NewWatch {
    pub fn new(
        owner_id: OwnerId,
        domain: Domain,
        subject: impl Into<String>,
        condition: Condition,
    ) -> Self {
        Self {
            owner_id,
            domain,
            subject: subject.into(),
            condition,
            recurrence: None,
            expires_at: None,
        }
    }

    pub fn recurring(mut self, interval: impl Into<String>) -> Self {
        self.recurrence = Some(interval.into());
        self
    }

    pub fn expiring_at(mut self, at: DateTime<Utc>) -> Self {
        self.expires_at = Some(at);
        self
    }
}

/// External collaborators for the engine
pub struct EngineDeps<C, I> {
    pub store: Arc<dyn WatchStore>,
    pub notifier: Arc<dyn Notifier>,
    pub clock: C,
    pub id_gen: I,
}

pub struct WatchEngine<C: Clock, I: IdGen> {
    config: EngineConfig,
    registry: DomainRegistry,
    tickers: BTreeMap<Domain, Arc<Ticker<C>>>,
    maintenance: Arc<Maintenance<C>>,
    shared: Arc<Shared<C>>,
    id_gen: I,
}

impl<C: Clock, I: IdGen> WatchEngine<C, I> {
    pub fn new(config: EngineConfig, registry: DomainRegistry, deps: EngineDeps<C, I>) -> Self {
        let log: Arc<dyn DeliveryLog> =
            Arc::new(MemoryDeliveryLog::new(config.delivery_log_capacity));
        let shared = Arc::new(Shared {
            store: deps.store,
            cache: TtlCache::new(config.cache_ttl, deps.clock.clone()),
            dispatcher: NotificationDispatcher::new(deps.notifier, log, deps.clock.clone())
                .with_send_timeout(config.fetch_timeout),
            clock: deps.clock,
            fetch_timeout: config.fetch_timeout,
            max_workers: config.max_workers,
            reschedule: config.reschedule,
        });

        let tickers = registry
            .iter()
            .map(|(domain, strategy)| {
                let cadence = strategy
                    .cadence
                    .unwrap_or_else(|| config.cadence_for(domain));
                let ticker = Ticker::new(
                    domain.clone(),
                    cadence,
                    Arc::clone(strategy),
                    Arc::clone(&shared),
                );
                (domain.clone(), Arc::new(ticker))
            })
            .collect();
        let maintenance = Arc::new(Maintenance::new(Arc::clone(&shared), config.retention));

        Self {
            config,
            registry,
            tickers,
            maintenance,
            shared,
            id_gen: deps.id_gen,
        }
    }

    /// Validate and persist a new watch. Nothing is stored on error.
    pub fn create_watch(&self, request: NewWatch) -> Result<WatchId, EngineError> {
        let strategy = self
            .registry
            .get(&request.domain)
            .ok_or_else(|| ValidationError::UnknownDomain(request.domain.to_string()))?;

        let subject = request.subject.trim();
        if subject.is_empty() {
            return Err(ValidationError::EmptySubject.into());
        }
        if request.condition.is_empty() {
            return Err(ValidationError::EmptyCondition.into());
        }
        strategy.evaluator().validate(&request.condition)?;

        let interval = request
            .recurrence
            .as_deref()
            .map(IntervalSpec::parse)
            .transpose()
            .map_err(ValidationError::from)?;

        let now = self.shared.clock.now();
        if request.expires_at.is_some_and(|at| at <= now) {
            return Err(ValidationError::ExpiryInPast.into());
        }

        let mut watch = Watch::new(
            self.id_gen.next_id(),
            request.owner_id.clone(),
            request.domain.clone(),
            subject,
            request.condition.clone(),
            now,
        );
        if let Some(interval) = interval {
            watch = watch.recurring_every(interval);
        }
        if let Some(at) = request.expires_at {
            watch = watch.expiring_at(at);
        }

        let id = self.shared.store.create(watch)?;
        tracing::info!(
            watch_id = %id,
            owner = %request.owner_id,
            domain = %request.domain,
            recurring = interval.is_some(),
            "watch created"
        );
        Ok(id)
    }

    /// All of an owner's watches, active or not
    pub fn list_watches(&self, owner: &OwnerId) -> Result<Vec<Watch>, EngineError> {
        Ok(self.shared.store.list_by_owner(owner)?)
    }

    pub fn get_watch(&self, id: &WatchId, owner: &OwnerId) -> Result<Watch, EngineError> {
        Ok(self.shared.store.get(id, owner)?)
    }

    /// Deactivate a watch. A tick already evaluating it may still fire once.
    pub fn cancel_watch(&self, id: &WatchId, owner: &OwnerId) -> Result<(), EngineError> {
        self.shared.store.get(id, owner)?;
        self.shared.store.deactivate(id)?;
        tracing::info!(watch_id = %id, %owner, "watch cancelled");
        Ok(())
    }

    pub fn delete_watch(&self, id: &WatchId, owner: &OwnerId) -> Result<(), EngineError> {
        self.shared.store.delete(id, owner)?;
        tracing::info!(watch_id = %id, %owner, "watch deleted");
        Ok(())
    }

    /// Run one tick for `domain` now, outside its schedule
    pub async fn tick(&self, domain: &Domain) -> Result<TickOutcome, EngineError> {
        let ticker = self
            .tickers
            .get(domain)
            .ok_or_else(|| EngineError::UnknownDomain(domain.clone()))?;
        Ok(ticker.tick().await)
    }

    pub fn ticker(&self, domain: &Domain) -> Option<&Arc<Ticker<C>>> {
        self.tickers.get(domain)
    }

    /// Registered domains, in order
    pub fn domains(&self) -> Vec<Domain> {
        self.tickers.keys().cloned().collect()
    }

    pub fn deliveries(&self) -> &Arc<dyn DeliveryLog> {
        self.shared.dispatcher.delivery_log()
    }

    pub fn maintenance(&self) -> &Maintenance<C> {
        &self.maintenance
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Spawn one ticker per registered domain plus the maintenance loops
    pub fn start(&self) -> EngineHandle {
        let (shutdown, rx) = watch::channel(false);
        let mut tasks = JoinSet::new();

        for ticker in self.tickers.values() {
            tasks.spawn(Arc::clone(ticker).run(rx.clone()));
        }
        tasks.spawn(Arc::clone(&self.maintenance).run(
            MaintenanceTask::CacheSweep,
            self.config.sweep_interval,
            rx.clone(),
        ));
        tasks.spawn(Arc::clone(&self.maintenance).run(
            MaintenanceTask::RetentionPurge,
            self.config.retention_check_interval,
            rx,
        ));

        tracing::info!(domains = self.tickers.len(), "engine started");
        EngineHandle { shutdown, tasks }
    }
}

/// Running engine tasks
pub struct EngineHandle {
    shutdown: watch::Sender<bool>,
    tasks: JoinSet<()>,
}

impl EngineHandle {
    /// Signal every task to stop and wait for in-flight ticks to finish
    pub async fn shutdown(mut self) {
        if self.shutdown.send(true).is_err() {
            tracing::debug!("engine tasks already gone");
        }
        while let Some(joined) = self.tasks.join_next().await {
            if let Err(e) = joined {
                tracing::error!(error = %e, "engine task failed");
            }
        }
        tracing::info!("engine stopped");
    }
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
