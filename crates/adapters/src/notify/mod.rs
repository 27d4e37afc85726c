// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Notification delivery

mod log;

pub use log::LogNotifier;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeNotifier, NotifyCall};

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tw_core::{OwnerId, WatchId};

/// Errors from notification operations
#[derive(Debug, Clone, PartialEq, Error)]
pub enum NotifyError {
    #[error("delivery failed: {0}")]
    Failed(String),
    #[error("recipient rejected notification: {0}")]
    Rejected(String),
    #[error("delivery timed out after {0:?}")]
    Timeout(Duration),
}

/// A formatted firing, ready to deliver
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub watch_id: WatchId,
    pub title: String,
    pub message: String,
}

impl Notification {
    pub fn new(watch_id: WatchId, title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            watch_id,
            title: title.into(),
            message: message.into(),
        }
    }
}

/// Delivers notifications to a recipient
#[async_trait]
pub trait Notifier: Send + Sync + 'static {
    async fn send(&self, owner: &OwnerId, notification: &Notification) -> Result<(), NotifyError>;
}

#[async_trait]
impl<T: Notifier + ?Sized> Notifier for Arc<T> {
    async fn send(&self, owner: &OwnerId, notification: &Notification) -> Result<(), NotifyError> {
        (**self).send(owner, notification).await
    }
}
