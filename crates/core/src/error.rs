// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Creation-time validation errors

use crate::interval::IntervalError;
use thiserror::Error;

/// Bad input at watch creation. Nothing that fails validation is persisted.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("subject must not be empty")]
    EmptySubject,
    #[error("condition must contain at least one predicate")]
    EmptyCondition,
    #[error("unknown domain: {0}")]
    UnknownDomain(String),
    #[error("unsupported condition key: {key}")]
    UnsupportedKey { key: String },
    #[error("condition key {key} expects {expected}")]
    WrongValueType { key: String, expected: &'static str },
    #[error("condition key {key} must be a finite number")]
    NonFinite { key: String },
    #[error("condition requires {key}")]
    MissingKey { key: String },
    #[error("condition key {key} must be true")]
    MustBeTrue { key: String },
    #[error(transparent)]
    Interval(#[from] IntervalError),
    #[error("expiry must be in the future")]
    ExpiryInPast,
}
