//! ShiftStore - Shift persistence contract

use async_trait::async_trait;
use chrono::NaiveDate;

use super::StoreError;
use crate::types::{Shift, ShiftChanges, ShiftDraft, ShiftId};

/// ShiftStore trait - async interface to the persistence collaborator
///
/// Timeouts and retries belong to implementations; the engine awaits every
/// call before issuing the next one.
#[async_trait]
pub trait ShiftStore: Send + Sync {
    /// Persist a new shift and return the id assigned to it
    async fn create_shift(&self, fields: ShiftDraft) -> Result<ShiftId, StoreError>;

    /// Apply a partial update to an existing shift
    async fn update_shift(&self, id: &str, changes: &ShiftChanges) -> Result<(), StoreError>;

    /// Delete a shift, returning whether it existed
    async fn delete_shift(&self, id: &str) -> Result<bool, StoreError>;

    /// Shifts overlapping the closed interval `[from, to]`
    async fn get_shifts_by_date_range(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<Shift>, StoreError>;

    /// Every member of a series
    async fn get_shifts_by_series(&self, series_id: &str) -> Result<Vec<Shift>, StoreError>;

    /// Every stored shift
    async fn get_all_shifts(&self) -> Result<Vec<Shift>, StoreError>;

    /// Load a single shift by id.
    ///
    /// Backends without a point lookup fall back to scanning `get_all_shifts`.
    async fn get_shift(&self, id: &str) -> Result<Option<Shift>, StoreError> {
        Ok(self
            .get_all_shifts()
            .await?
            .into_iter()
            .find(|shift| shift.id == id))
    }
}
