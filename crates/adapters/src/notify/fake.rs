// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake notifier for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{Notification, Notifier, NotifyError};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tw_core::OwnerId;

/// Recorded notification, including attempts that were made to fail
#[derive(Debug, Clone)]
pub struct NotifyCall {
    pub owner: OwnerId,
    pub notification: Notification,
}

/// Fake notifier for testing
#[derive(Clone, Default)]
pub struct FakeNotifier {
    calls: Arc<Mutex<Vec<NotifyCall>>>,
    failure: Arc<Mutex<Option<NotifyError>>>,
    delay: Arc<Mutex<Option<Duration>>>,
}

impl FakeNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get all recorded notifications
    pub fn calls(&self) -> Vec<NotifyCall> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Make every subsequent send fail with `error` (`None` restores success)
    pub fn set_failure(&self, error: Option<NotifyError>) {
        *self.failure.lock().unwrap_or_else(|e| e.into_inner()) = error;
    }

    /// Hold every subsequent send for `delay` before answering
    pub fn set_delay(&self, delay: Option<Duration>) {
        *self.delay.lock().unwrap_or_else(|e| e.into_inner()) = delay;
    }
}

#[async_trait]
impl Notifier for FakeNotifier {
    async fn send(&self, owner: &OwnerId, notification: &Notification) -> Result<(), NotifyError> {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(NotifyCall {
                owner: owner.clone(),
                notification: notification.clone(),
            });
        let delay = *self.delay.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        match self.failure.lock().unwrap_or_else(|e| e.into_inner()).clone() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
