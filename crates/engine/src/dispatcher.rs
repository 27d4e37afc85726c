// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Notification dispatch for firing watches

use crate::format::MessageFormatter;
use std::sync::Arc;
use std::time::Duration;
use tw_adapters::{Notifier, NotifyError, TracedNotifier};
use tw_core::{Clock, Observation, Watch};
use tw_storage::{DeliveryLog, DeliveryRecord, DeliveryStatus};

/// Result of handing one firing to the notifier
#[derive(Debug, Clone, PartialEq)]
pub enum DeliveryOutcome {
    Delivered,
    Failed(NotifyError),
}

impl DeliveryOutcome {
    pub fn is_delivered(&self) -> bool {
        matches!(self, DeliveryOutcome::Delivered)
    }
}

/// Default bound on a single send
pub const DEFAULT_SEND_TIMEOUT: Duration = Duration::from_secs(10);

/// Formats firings, sends them, and records every attempt.
///
/// Failures are reported, never retried: the watch's state transition
/// happens regardless. A send that outlives the timeout counts as failed.
pub struct NotificationDispatcher<C: Clock> {
    notifier: Arc<dyn Notifier>,
    log: Arc<dyn DeliveryLog>,
    clock: C,
    send_timeout: Duration,
}

impl<C: Clock> NotificationDispatcher<C> {
    pub fn new(notifier: impl Notifier, log: Arc<dyn DeliveryLog>, clock: C) -> Self {
        Self {
            notifier: Arc::new(TracedNotifier::new(notifier)),
            log,
            clock,
            send_timeout: DEFAULT_SEND_TIMEOUT,
        }
    }

    pub fn with_send_timeout(mut self, timeout: Duration) -> Self {
        self.send_timeout = timeout;
        self
    }

    pub fn delivery_log(&self) -> &Arc<dyn DeliveryLog> {
        &self.log
    }

    pub async fn dispatch(
        &self,
        watch: &Watch,
        observed: &Observation,
        matched: &[String],
        formatter: &dyn MessageFormatter,
    ) -> DeliveryOutcome {
        let notification = formatter.format(watch, observed, matched);
        let sent = tokio::time::timeout(
            self.send_timeout,
            self.notifier.send(&watch.owner_id, &notification),
        )
        .await
        .unwrap_or(Err(NotifyError::Timeout(self.send_timeout)));

        let (status, outcome) = match sent {
            Ok(()) => (DeliveryStatus::Delivered, DeliveryOutcome::Delivered),
            Err(e) => {
                tracing::warn!(watch_id = %watch.id, error = %e, "delivery failed");
                (
                    DeliveryStatus::Failed {
                        reason: e.to_string(),
                    },
                    DeliveryOutcome::Failed(e),
                )
            }
        };

        self.log.record(DeliveryRecord {
            watch_id: watch.id.clone(),
            owner_id: watch.owner_id.clone(),
            domain: watch.domain.clone(),
            title: notification.title,
            message: notification.message,
            outcome: status,
            at: self.clock.now(),
        });
        outcome
    }
}

#[cfg(test)]
#[path = "dispatcher_tests.rs"]
mod tests;
