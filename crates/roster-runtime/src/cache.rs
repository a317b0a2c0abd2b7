//! Working set loading.

use std::collections::HashMap;

use roster_core::store::{distinct_series_ids, ShiftStore, StoreError};
use roster_core::types::{sort_chronologically, DateRange, Shift, ShiftId};

/// Shifts overlapping `range`, plus every member of each series they touch.
///
/// Series members are fetched one series at a time after the base query.
/// The result is de-duplicated by id and sorted by `(start_date, id)`.
pub(crate) async fn fetch_window(
    store: &dyn ShiftStore,
    range: DateRange,
) -> Result<Vec<Shift>, StoreError> {
    let base = store.get_shifts_by_date_range(range.from, range.to).await?;
    let series = distinct_series_ids(&base);
    let base_count = base.len();

    let mut merged: HashMap<ShiftId, Shift> = base
        .into_iter()
        .map(|shift| (shift.id.clone(), shift))
        .collect();
    for series_id in &series {
        for member in store.get_shifts_by_series(series_id).await? {
            merged.entry(member.id.clone()).or_insert(member);
        }
    }

    let mut shifts: Vec<Shift> = merged.into_values().collect();
    sort_chronologically(&mut shifts);
    tracing::debug!(
        from = %range.from,
        to = %range.to,
        base = base_count,
        series = series.len(),
        total = shifts.len(),
        "working set window fetched"
    );
    Ok(shifts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use roster_core::types::{RecurrencePattern, ShiftDraft};
    use roster_stores::InMemoryShiftStore;

    fn date(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, m, d).unwrap()
    }

    #[test]
    fn test_fetch_window_completes_series() {
        tokio_test::block_on(async {
            let mut shifts = Vec::new();
            for (i, day) in [1, 8, 15, 22].into_iter().enumerate() {
                let mut shift = ShiftDraft::new("prov-1", "clinic-a", date(1, day))
                    .recurring(RecurrencePattern::Weekly, date(1, 22))
                    .into_shift(format!("w{i}"));
                shift.series_id = Some("weekly".into());
                shifts.push(shift);
            }
            shifts.push(ShiftDraft::new("prov-2", "clinic-b", date(1, 10)).into_shift("solo"));
            shifts.push(ShiftDraft::new("prov-2", "clinic-b", date(3, 1)).into_shift("later"));
            let store = InMemoryShiftStore::with_shifts(shifts);

            let range = DateRange::new(date(1, 8), date(1, 10)).unwrap();
            let window = fetch_window(&store, range).await.unwrap();
            let ids: Vec<&str> = window.iter().map(|s| s.id.as_str()).collect();
            assert_eq!(ids, vec!["w0", "w1", "solo", "w2", "w3"]);
        });
    }
}
