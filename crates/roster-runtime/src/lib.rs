//! # Roster Runtime
//!
//! Runtime layer of the Roster engine.
//!
//! This crate provides:
//! - ShiftEngine: scoped shift operations executed against a ShiftStore
//! - Working set loading with series completion
//! - Series reconciliation and repair sweeps
//! - RosterApp bootstrap from `roster.yaml`

pub mod bootstrap;
mod cache;
mod consistency;
pub mod engine;

pub use bootstrap::{init_tracing_if_needed, BootstrapError, RosterApp};
pub use engine::{MutationOutcome, ShiftEngine};

// Re-export commonly used core types
pub use roster_core::consistency::Reconciliation;
pub use roster_core::types::{
    DateRange, EditScope, RecurrencePattern, Shift, ShiftDraft, ShiftId, ShiftPatch,
};
pub use roster_core::{EngineError, StoreError, ValidationError};
