//! WorkingSet - in-memory mirror of the loaded date window

use std::collections::{BTreeSet, HashMap};

use crate::types::{DateRange, SeriesId, Shift, ShiftChanges};

/// Working set - the shifts currently loaded for one session
///
/// Content is replaced wholesale by `replace` after an authoritative read and
/// patched by the engine after each successful mutation. A failed mutation
/// marks it stale; stale content must be reloaded before it is trusted.
#[derive(Debug, Clone, Default)]
pub struct WorkingSet {
    shifts: HashMap<String, Shift>,
    range: Option<DateRange>,
    stale: bool,
}

impl WorkingSet {
    /// Create a new empty working set
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole content with a freshly loaded window.
    ///
    /// Duplicate ids keep the last occurrence.
    pub fn replace(&mut self, range: DateRange, shifts: impl IntoIterator<Item = Shift>) {
        self.shifts = shifts
            .into_iter()
            .map(|shift| (shift.id.clone(), shift))
            .collect();
        self.range = Some(range);
        self.stale = false;
    }

    /// Range of the last load, if any
    pub fn range(&self) -> Option<DateRange> {
        self.range
    }

    pub fn len(&self) -> usize {
        self.shifts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shifts.is_empty()
    }

    /// Drop content and range, as if nothing had been loaded
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Mark content as untrustworthy until the next reload
    pub fn invalidate(&mut self) {
        self.stale = true;
    }

    pub fn is_stale(&self) -> bool {
        self.stale
    }

    pub fn get(&self, id: &str) -> Option<&Shift> {
        self.shifts.get(id)
    }

    /// Insert or overwrite a shift
    pub fn upsert(&mut self, shift: Shift) {
        self.shifts.insert(shift.id.clone(), shift);
    }

    /// Apply a partial update; returns false when the id is not cached
    pub fn apply(&mut self, id: &str, changes: &ShiftChanges) -> bool {
        match self.shifts.get_mut(id) {
            Some(shift) => {
                shift.apply(changes);
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, id: &str) -> Option<Shift> {
        self.shifts.remove(id)
    }

    /// Replace every cached member of a series with `members`
    pub fn replace_series(&mut self, series_id: &str, members: impl IntoIterator<Item = Shift>) {
        self.shifts
            .retain(|_, shift| shift.series_id.as_deref() != Some(series_id));
        for shift in members {
            self.upsert(shift);
        }
    }
}

/// Distinct series ids referenced by `shifts`, in sorted order
pub fn distinct_series_ids<'a>(shifts: impl IntoIterator<Item = &'a Shift>) -> BTreeSet<SeriesId> {
    shifts
        .into_iter()
        .filter_map(|shift| shift.series_id.clone())
        .collect()
}
