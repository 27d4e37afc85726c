// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Observations: the current state of a subject as reported by a fetcher

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A point-in-time weather reading for a location
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    /// Degrees, in whatever unit the fetcher reports
    pub temp: f64,
    pub wind: f64,
    pub rain: bool,
    pub snow: bool,
}

/// One item from a feed (an article, a post)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedItem {
    pub id: String,
    pub title: String,
    pub published_at: DateTime<Utc>,
}

impl FeedItem {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        published_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            published_at,
        }
    }
}

/// Domain-specific current state of a subject
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Observation {
    /// A single number, e.g. a price with its currency
    Scalar {
        value: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        unit: Option<String>,
    },
    Weather(WeatherSnapshot),
    Items { items: Vec<FeedItem> },
    /// The current time, for due-date checks
    Clock { now: DateTime<Utc> },
}

impl Observation {
    pub fn scalar(value: f64) -> Self {
        Observation::Scalar { value, unit: None }
    }

    pub fn scalar_with_unit(value: f64, unit: impl Into<String>) -> Self {
        Observation::Scalar {
            value,
            unit: Some(unit.into()),
        }
    }

    pub fn items(items: Vec<FeedItem>) -> Self {
        Observation::Items { items }
    }

    pub fn clock(now: DateTime<Utc>) -> Self {
        Observation::Clock { now }
    }

    /// Short name of the observation shape, used in logs
    pub fn kind(&self) -> &'static str {
        match self {
            Observation::Scalar { .. } => "scalar",
            Observation::Weather(_) => "weather",
            Observation::Items { .. } => "items",
            Observation::Clock { .. } => "clock",
        }
    }
}

impl fmt::Display for Observation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Observation::Scalar { value, unit: Some(unit) } => write!(f, "{} {}", value, unit),
            Observation::Scalar { value, unit: None } => write!(f, "{}", value),
            Observation::Weather(w) => {
                write!(f, "temp {}, wind {}", w.temp, w.wind)?;
                if w.rain {
                    write!(f, ", rain")?;
                }
                if w.snow {
                    write!(f, ", snow")?;
                }
                Ok(())
            }
            Observation::Items { items } => match items.first() {
                Some(first) if items.len() == 1 => write!(f, "{}", first.title),
                Some(first) => write!(f, "{} (+{} more)", first.title, items.len() - 1),
                None => write!(f, "no items"),
            },
            Observation::Clock { now } => write!(f, "{}", now.to_rfc3339()),
        }
    }
}
