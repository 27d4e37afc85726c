// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Engine configuration
//!
//! Loaded from TOML; every field is optional and durations use humantime
//! syntax (`"30s"`, `"5m"`, `"30days"`).
//!
//! ```toml
//! cache_ttl = "1m"
//! fetch_timeout = "10s"
//! max_workers = 8
//! reschedule = "anchor"
//!
//! [domains.weather]
//! cadence = "30m"
//! match_mode = "all"
//! ```

use crate::condition::MatchMode;
use crate::watch::Domain;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config: {field} {reason}")]
    Invalid { field: String, reason: &'static str },
}

/// Where a recurring watch's next eligible time is measured from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReschedulePolicy {
    /// Anchored watches (due dates) keep to the anchor's calendar; missed
    /// occurrences are skipped, not replayed. Others count from the firing.
    #[default]
    Anchor,
    /// Always from the time of firing
    Now,
}

/// Per-domain overrides
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DomainConfig {
    /// How often the domain's ticker runs
    #[serde(with = "humantime_serde::option")]
    pub cadence: Option<Duration>,
    /// How compound conditions combine (weather)
    pub match_mode: Option<MatchMode>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Maximum age of a cached observation
    #[serde(with = "humantime_serde")]
    pub cache_ttl: Duration,
    /// How often stale cache entries are dropped
    #[serde(with = "humantime_serde")]
    pub sweep_interval: Duration,
    /// Upper bound on a single fetch
    #[serde(with = "humantime_serde")]
    pub fetch_timeout: Duration,
    /// Concurrent evaluations per tick
    pub max_workers: usize,
    pub reschedule: ReschedulePolicy,
    /// Inactive watches idle for longer than this are purged
    #[serde(with = "humantime_serde")]
    pub retention: Duration,
    #[serde(with = "humantime_serde")]
    pub retention_check_interval: Duration,
    /// Delivery records kept in memory
    pub delivery_log_capacity: usize,
    /// Cadence for domains with neither an override nor a built-in default
    #[serde(with = "humantime_serde")]
    pub default_cadence: Duration,
    pub domains: BTreeMap<String, DomainConfig>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            cache_ttl: Duration::from_secs(60),
            sweep_interval: Duration::from_secs(5 * 60),
            fetch_timeout: Duration::from_secs(10),
            max_workers: 8,
            reschedule: ReschedulePolicy::Anchor,
            retention: Duration::from_secs(30 * 24 * 60 * 60),
            retention_check_interval: Duration::from_secs(60 * 60),
            delivery_log_capacity: 1000,
            default_cadence: Duration::from_secs(5 * 60),
            domains: BTreeMap::new(),
        }
    }
}

/// Built-in cadences, tuned to upstream rate limits
fn builtin_cadence(domain: &str) -> Option<Duration> {
    match domain {
        Domain::PRICE => Some(Duration::from_secs(5 * 60)),
        Domain::WEATHER => Some(Duration::from_secs(30 * 60)),
        Domain::NEWS => Some(Duration::from_secs(15 * 60)),
        Domain::REMINDER => Some(Duration::from_secs(60)),
        _ => None,
    }
}

impl EngineConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a file; a missing file yields the defaults
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(text) => Self::from_toml_str(&text),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no config file, using defaults");
                Ok(Self::default())
            }
            Err(source) => Err(ConfigError::Io {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let durations = [
            ("cache_ttl", self.cache_ttl),
            ("sweep_interval", self.sweep_interval),
            ("fetch_timeout", self.fetch_timeout),
            ("retention", self.retention),
            ("retention_check_interval", self.retention_check_interval),
            ("default_cadence", self.default_cadence),
        ];
        for (field, value) in durations {
            if value.is_zero() {
                return Err(ConfigError::Invalid {
                    field: field.to_string(),
                    reason: "must be greater than zero",
                });
            }
        }
        if self.max_workers == 0 {
            return Err(ConfigError::Invalid {
                field: "max_workers".to_string(),
                reason: "must be at least 1",
            });
        }
        for (name, domain) in &self.domains {
            if domain.cadence.is_some_and(|c| c.is_zero()) {
                return Err(ConfigError::Invalid {
                    field: format!("domains.{}.cadence", name),
                    reason: "must be greater than zero",
                });
            }
        }
        Ok(())
    }

    /// Ticker period for a domain: override, then built-in, then default
    pub fn cadence_for(&self, domain: &Domain) -> Duration {
        self.domains
            .get(domain.as_str())
            .and_then(|d| d.cadence)
            .or_else(|| builtin_cadence(domain.as_str()))
            .unwrap_or(self.default_cadence)
    }

    pub fn match_mode_for(&self, domain: &Domain) -> MatchMode {
        self.domains
            .get(domain.as_str())
            .and_then(|d| d.match_mode)
            .unwrap_or_default()
    }
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
