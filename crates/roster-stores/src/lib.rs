//! # Roster Stores
//!
//! Store implementations for the Roster engine.
//!
//! This crate provides:
//! - InMemory ShiftStore
//! - JSON snapshot file ShiftStore

mod file_store;
mod shift_store;

pub use file_store::JsonFileShiftStore;
pub use shift_store::InMemoryShiftStore;

// Re-export core traits for convenience
pub use roster_core::store::{ShiftStore, StoreError};
