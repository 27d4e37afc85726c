// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Recurrence intervals (`30m`, `2h`, `1d`, `1w`, `3mo`, `1y`)
//!
//! Minutes, hours, days and weeks are fixed durations. Months and years use
//! calendar arithmetic: the day of month is clamped to the last valid day, so
//! Jan 31 + 1mo lands on Feb 28 (or Feb 29 in a leap year).

use chrono::{DateTime, Months, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors from parsing an interval string
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IntervalError {
    #[error("invalid interval format: {input:?} ({reason})")]
    InvalidFormat { input: String, reason: &'static str },
}

impl IntervalError {
    fn invalid(input: &str, reason: &'static str) -> Self {
        IntervalError::InvalidFormat {
            input: input.to_string(),
            reason,
        }
    }
}

/// Unit of a recurrence interval
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntervalUnit {
    Minutes,
    Hours,
    Days,
    Weeks,
    Months,
    Years,
}

impl IntervalUnit {
    fn from_suffix(suffix: &str) -> Option<Self> {
        match suffix {
            "m" => Some(IntervalUnit::Minutes),
            "h" => Some(IntervalUnit::Hours),
            "d" => Some(IntervalUnit::Days),
            "w" => Some(IntervalUnit::Weeks),
            "mo" => Some(IntervalUnit::Months),
            "y" => Some(IntervalUnit::Years),
            _ => None,
        }
    }

    pub fn suffix(&self) -> &'static str {
        match self {
            IntervalUnit::Minutes => "m",
            IntervalUnit::Hours => "h",
            IntervalUnit::Days => "d",
            IntervalUnit::Weeks => "w",
            IntervalUnit::Months => "mo",
            IntervalUnit::Years => "y",
        }
    }

    /// Largest amount accepted for this unit (roughly ten years)
    pub fn max_amount(&self) -> u32 {
        match self {
            IntervalUnit::Minutes => 3650 * 24 * 60,
            IntervalUnit::Hours => 3650 * 24,
            IntervalUnit::Days => 3650,
            IntervalUnit::Weeks => 521,
            IntervalUnit::Months => 120,
            IntervalUnit::Years => 10,
        }
    }

    /// Whether the unit is a fixed duration (as opposed to calendar-aware)
    pub fn is_fixed(&self) -> bool {
        !matches!(self, IntervalUnit::Months | IntervalUnit::Years)
    }
}

/// A parsed recurrence interval: a positive amount of exactly one unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct IntervalSpec {
    amount: u32,
    unit: IntervalUnit,
}

impl IntervalSpec {
    /// Build an interval directly, applying the same bounds as `parse`
    pub fn new(amount: u32, unit: IntervalUnit) -> Result<Self, IntervalError> {
        if amount == 0 {
            return Err(IntervalError::invalid(
                &format!("{}{}", amount, unit.suffix()),
                "amount must be positive",
            ));
        }
        if amount > unit.max_amount() {
            return Err(IntervalError::invalid(
                &format!("{}{}", amount, unit.suffix()),
                "exceeds ten-year ceiling",
            ));
        }
        Ok(Self { amount, unit })
    }

    /// Parse `<digits><unit>` where unit is one of `m h d w mo y`
    pub fn parse(text: &str) -> Result<Self, IntervalError> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(IntervalError::invalid(text, "empty"));
        }

        let split = trimmed
            .find(|c: char| !c.is_ascii_digit())
            .ok_or_else(|| IntervalError::invalid(text, "missing unit"))?;
        let (digits, suffix) = trimmed.split_at(split);
        if digits.is_empty() {
            return Err(IntervalError::invalid(text, "missing amount"));
        }

        let unit = IntervalUnit::from_suffix(&suffix.to_ascii_lowercase())
            .ok_or_else(|| IntervalError::invalid(text, "unknown unit"))?;
        let amount: u32 = digits
            .parse()
            .map_err(|_| IntervalError::invalid(text, "amount out of range"))?;

        if amount == 0 {
            return Err(IntervalError::invalid(text, "amount must be positive"));
        }
        if amount > unit.max_amount() {
            return Err(IntervalError::invalid(text, "exceeds ten-year ceiling"));
        }

        Ok(Self { amount, unit })
    }

    pub fn amount(&self) -> u32 {
        self.amount
    }

    pub fn unit(&self) -> IntervalUnit {
        self.unit
    }

    /// The time one interval after `from`.
    ///
    /// Saturates at the maximum representable time instead of overflowing.
    pub fn next_occurrence(&self, from: DateTime<Utc>) -> DateTime<Utc> {
        let next = match self.unit {
            IntervalUnit::Months => from.checked_add_months(Months::new(self.amount)),
            IntervalUnit::Years => from.checked_add_months(Months::new(self.amount * 12)),
            _ => self
                .fixed_delta()
                .and_then(|delta| from.checked_add_signed(delta)),
        };
        next.unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    /// Exact length for fixed units, `None` for months and years
    pub fn fixed_delta(&self) -> Option<TimeDelta> {
        let amount = i64::from(self.amount);
        match self.unit {
            IntervalUnit::Minutes => Some(TimeDelta::minutes(amount)),
            IntervalUnit::Hours => Some(TimeDelta::hours(amount)),
            IntervalUnit::Days => Some(TimeDelta::days(amount)),
            IntervalUnit::Weeks => Some(TimeDelta::weeks(amount)),
            IntervalUnit::Months | IntervalUnit::Years => None,
        }
    }
}

impl fmt::Display for IntervalSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.amount, self.unit.suffix())
    }
}

impl FromStr for IntervalSpec {
    type Err = IntervalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for IntervalSpec {
    type Error = IntervalError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<IntervalSpec> for String {
    fn from(spec: IntervalSpec) -> Self {
        spec.to_string()
    }
}

#[cfg(test)]
#[path = "interval_tests.rs"]
mod tests;
