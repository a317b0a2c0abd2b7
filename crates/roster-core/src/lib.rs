//! # Roster Core
//!
//! Core abstractions and deterministic logic of the recurring-shift series
//! engine.
//!
//! This crate contains:
//! - Shift / ShiftDraft / ShiftPatch / ShiftChanges definitions
//! - Occurrence generation for daily, weekly, biweekly and monthly series
//! - Scoped mutation planning (this occurrence / multi-day span / whole series)
//! - Series consistency decisions
//! - ShiftStore contract and the in-memory WorkingSet
//!
//! This crate does NOT care about:
//! - Which database holds the shifts
//! - How shifts are rendered or exported
//! - Who is allowed to edit them

pub mod consistency;
pub mod error;
pub mod generator;
pub mod resolver;
pub mod store;
pub mod types;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::consistency::{ReconcileAction, Reconciliation};
    pub use crate::error::{EngineError, ValidationError};
    pub use crate::generator::{Generation, OccurrenceGenerator, RecurrenceRule};
    pub use crate::resolver::{MutationPlan, MutationResolver, PlannedOp};
    pub use crate::store::{ShiftStore, StoreError, WorkingSet};
    pub use crate::types::{
        DateRange, EditScope, RecurrencePattern, SeriesId, Shift, ShiftChanges, ShiftDraft,
        ShiftId, ShiftPatch,
    };
}

// Re-export key types at crate root
pub use error::{EngineError, ValidationError};
pub use generator::{OccurrenceGenerator, RecurrenceRule};
pub use resolver::{MutationPlan, MutationResolver, PlannedOp};
pub use store::{ShiftStore, StoreError, WorkingSet};
pub use types::{
    DateRange, EditScope, RecurrencePattern, SeriesId, Shift, ShiftChanges, ShiftDraft, ShiftId,
    ShiftPatch,
};
