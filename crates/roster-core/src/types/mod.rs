//! Core type definitions for Roster
//!
//! - Shift: a persisted dated occurrence
//! - ShiftDraft / ShiftPatch / ShiftChanges: creation input and partial updates
//! - RecurrencePattern / EditScope / DateRange: closed vocabularies of the engine

mod recurrence;
mod shift;

pub use recurrence::{DateRange, EditScope, RecurrencePattern};
pub use shift::{
    sort_chronologically, SeriesId, Shift, ShiftChanges, ShiftDraft, ShiftId, ShiftPatch,
};
