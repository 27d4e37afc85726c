// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Notification text for firing watches

use tw_adapters::Notification;
use tw_core::{Observation, Watch};

/// Renders a firing into the text a recipient sees
pub trait MessageFormatter: Send + Sync {
    fn format(&self, watch: &Watch, observed: &Observation, matched: &[String]) -> Notification;
}

/// Names the subject, the predicates that matched, and what was observed
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultFormatter;

impl MessageFormatter for DefaultFormatter {
    fn format(&self, watch: &Watch, observed: &Observation, matched: &[String]) -> Notification {
        let title = format!("{} alert: {}", watch.domain, watch.subject);
        let reasons = matched
            .iter()
            .map(|key| match watch.condition.get(key) {
                Some(threshold) => format!("{} {}", key, threshold),
                None => key.clone(),
            })
            .collect::<Vec<_>>()
            .join(", ");
        let message = format!("{}: {} (observed {})", watch.subject, reasons, observed);
        Notification::new(watch.id.clone(), title, message)
    }
}

/// Reminders carry their own text; the subject is the message
#[derive(Debug, Clone, Copy, Default)]
pub struct ReminderFormatter;

impl MessageFormatter for ReminderFormatter {
    fn format(&self, watch: &Watch, _observed: &Observation, _matched: &[String]) -> Notification {
        let message = match watch.interval {
            Some(interval) => format!("{} (repeats every {})", watch.subject, interval),
            None => watch.subject.clone(),
        };
        Notification::new(watch.id.clone(), "Reminder", message)
    }
}

#[cfg(test)]
#[path = "format_tests.rs"]
mod tests;
