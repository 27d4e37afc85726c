// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::{Notification, Notifier, NotifyError};
use async_trait::async_trait;
use tw_core::OwnerId;

/// Writes notifications to the log instead of a chat transport
#[derive(Clone, Debug, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, owner: &OwnerId, notification: &Notification) -> Result<(), NotifyError> {
        tracing::info!(
            %owner,
            watch_id = %notification.watch_id,
            title = %notification.title,
            "{}",
            notification.message
        );
        Ok(())
    }
}
