//! ShiftStore in-memory implementation.

use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::RwLock;

use roster_core::store::{ShiftStore, StoreError};
use roster_core::types::{
    sort_chronologically, DateRange, Shift, ShiftChanges, ShiftDraft, ShiftId,
};

/// In-memory implementation for development and testing.
pub struct InMemoryShiftStore {
    shifts: RwLock<HashMap<String, Shift>>,
}

impl InMemoryShiftStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self {
            shifts: RwLock::new(HashMap::new()),
        }
    }

    /// Create a store pre-populated with existing records.
    pub fn with_shifts(shifts: impl IntoIterator<Item = Shift>) -> Self {
        Self {
            shifts: RwLock::new(
                shifts
                    .into_iter()
                    .map(|shift| (shift.id.clone(), shift))
                    .collect(),
            ),
        }
    }

    /// Every record in chronological order.
    pub fn snapshot(&self) -> Result<Vec<Shift>, StoreError> {
        self.select(|_| true)
    }

    /// Insert a record under its own id, replacing any previous version.
    pub fn insert(&self, shift: Shift) -> Result<(), StoreError> {
        let mut shifts = self
            .shifts
            .write()
            .map_err(|e| StoreError::Internal(e.to_string()))?;
        shifts.insert(shift.id.clone(), shift);
        Ok(())
    }

    fn select(&self, predicate: impl Fn(&Shift) -> bool) -> Result<Vec<Shift>, StoreError> {
        let shifts = self
            .shifts
            .read()
            .map_err(|e| StoreError::Internal(e.to_string()))?;
        let mut selected: Vec<Shift> = shifts
            .values()
            .filter(|shift| predicate(shift))
            .cloned()
            .collect();
        sort_chronologically(&mut selected);
        Ok(selected)
    }
}

impl Default for InMemoryShiftStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ShiftStore for InMemoryShiftStore {
    async fn create_shift(&self, fields: ShiftDraft) -> Result<ShiftId, StoreError> {
        let mut shifts = self
            .shifts
            .write()
            .map_err(|e| StoreError::Internal(e.to_string()))?;
        let id = uuid::Uuid::new_v4().to_string();
        shifts.insert(id.clone(), fields.into_shift(id.clone()));
        Ok(id)
    }

    async fn update_shift(&self, id: &str, changes: &ShiftChanges) -> Result<(), StoreError> {
        let mut shifts = self
            .shifts
            .write()
            .map_err(|e| StoreError::Internal(e.to_string()))?;
        if let Some(shift) = shifts.get_mut(id) {
            shift.apply(changes);
            Ok(())
        } else {
            Err(StoreError::NotFound(id.to_string()))
        }
    }

    async fn delete_shift(&self, id: &str) -> Result<bool, StoreError> {
        let mut shifts = self
            .shifts
            .write()
            .map_err(|e| StoreError::Internal(e.to_string()))?;
        Ok(shifts.remove(id).is_some())
    }

    async fn get_shifts_by_date_range(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<Shift>, StoreError> {
        let range = DateRange { from, to };
        self.select(|shift| range.overlaps(shift.start_date, shift.end_date))
    }

    async fn get_shifts_by_series(&self, series_id: &str) -> Result<Vec<Shift>, StoreError> {
        self.select(|shift| shift.series_id.as_deref() == Some(series_id))
    }

    async fn get_all_shifts(&self) -> Result<Vec<Shift>, StoreError> {
        self.snapshot()
    }

    async fn get_shift(&self, id: &str) -> Result<Option<Shift>, StoreError> {
        let shifts = self
            .shifts
            .read()
            .map_err(|e| StoreError::Internal(e.to_string()))?;
        Ok(shifts.get(id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use roster_core::types::RecurrencePattern;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_in_memory_store_crud() {
        tokio_test::block_on(async {
            let store = InMemoryShiftStore::new();
            let id = store
                .create_shift(ShiftDraft::new("prov-1", "clinic-a", date(2024, 1, 1)))
                .await
                .unwrap();

            let changes = ShiftChanges {
                notes: Some("cover".into()),
                ..ShiftChanges::default()
            };
            store.update_shift(&id, &changes).await.unwrap();
            let loaded = store.get_shift(&id).await.unwrap().unwrap();
            assert_eq!(loaded.notes, "cover");

            assert!(matches!(
                store.update_shift("missing", &changes).await,
                Err(StoreError::NotFound(_))
            ));
            assert!(store.delete_shift(&id).await.unwrap());
            assert!(!store.delete_shift(&id).await.unwrap());
            assert!(store.get_all_shifts().await.unwrap().is_empty());
        });
    }

    #[test]
    fn test_in_memory_store_range_uses_overlap() {
        tokio_test::block_on(async {
            let store = InMemoryShiftStore::new();
            store
                .create_shift(
                    ShiftDraft::new("prov-1", "clinic-a", date(2024, 1, 8)).ending(date(2024, 1, 11)),
                )
                .await
                .unwrap();
            store
                .create_shift(ShiftDraft::new("prov-1", "clinic-a", date(2024, 1, 15)))
                .await
                .unwrap();

            let hits = store
                .get_shifts_by_date_range(date(2024, 1, 10), date(2024, 1, 10))
                .await
                .unwrap();
            assert_eq!(hits.len(), 1);
            assert_eq!(hits[0].start_date, date(2024, 1, 8));
        });
    }

    #[test]
    fn test_in_memory_store_series_query() {
        tokio_test::block_on(async {
            let store = InMemoryShiftStore::new();
            for day in [15, 1, 8] {
                let mut draft = ShiftDraft::new("prov-1", "clinic-a", date(2024, 1, day))
                    .recurring(RecurrencePattern::Weekly, date(2024, 1, 15));
                draft.series_id = Some("series-1".into());
                store.create_shift(draft).await.unwrap();
            }
            store
                .create_shift(ShiftDraft::new("prov-2", "clinic-b", date(2024, 1, 2)))
                .await
                .unwrap();

            let members = store.get_shifts_by_series("series-1").await.unwrap();
            let starts: Vec<NaiveDate> = members.iter().map(|s| s.start_date).collect();
            assert_eq!(starts, vec![date(2024, 1, 1), date(2024, 1, 8), date(2024, 1, 15)]);
        });
    }
}
