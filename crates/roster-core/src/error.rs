//! Engine error taxonomy

use chrono::NaiveDate;
use thiserror::Error;

use crate::store::StoreError;
use crate::types::EditScope;

/// Malformed input, rejected before any store call
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("start date {start} is after end date {end}")]
    InvalidDateOrder { start: NaiveDate, end: NaiveDate },

    #[error("range start {from} is after range end {to}")]
    InvalidRange { from: NaiveDate, to: NaiveDate },

    #[error("recurring shift is missing {0}")]
    MissingRecurrenceField(&'static str),

    #[error("recurrence end date {until} is before start date {start}")]
    RecurrenceEndBeforeStart { start: NaiveDate, until: NaiveDate },

    #[error("standalone shift must not carry a recurrence pattern or end date")]
    RecurrenceOnStandalone,

    #[error("recurrence fields can only be changed with series scope")]
    RecurrenceNeedsSeriesScope,

    #[error("unknown recurrence pattern: {0}")]
    UnknownPattern(String),

    #[error("unknown edit scope: {0}")]
    UnknownScope(String),

    #[error("scope '{scope}' does not apply: {reason}")]
    ScopeNotApplicable {
        scope: EditScope,
        reason: &'static str,
    },

    #[error("patch changes nothing")]
    EmptyPatch,

    #[error("date arithmetic left the supported calendar range")]
    DateOutOfRange,
}

/// Errors surfaced by engine operations
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("shift not found: {0}")]
    NotFound(String),

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl EngineError {
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}
