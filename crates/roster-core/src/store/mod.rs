//! Store module
//!
//! This module provides storage abstractions:
//! - ShiftStore: persistence collaborator contract (async trait)
//! - WorkingSet: in-memory mirror of the currently loaded date window
//!
//! Note: Implementations are in roster-stores crate

mod shift_store;
mod working_set;

pub use shift_store::ShiftStore;
pub use working_set::{distinct_series_ids, WorkingSet};

use thiserror::Error;

/// Store error types
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Item not found: {0}")]
    NotFound(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("IO error: {0}")]
    Io(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Internal error: {0}")]
    Internal(String),
}
