//! Shift type definitions
//!
//! A shift is the atomic persisted occurrence. Series are not stored; they are
//! the set of shifts sharing a `series_id`.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::RecurrencePattern;
use crate::error::ValidationError;

/// Type alias for Shift ID
pub type ShiftId = String;

/// Type alias for Series ID
pub type SeriesId = String;

/// One concrete dated occurrence, standalone or part of a series
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Shift {
    /// Store-assigned identifier
    pub id: ShiftId,
    pub assignee_id: String,
    pub location_id: String,
    /// First calendar day, inclusive
    pub start_date: NaiveDate,
    /// Last calendar day, inclusive
    pub end_date: NaiveDate,
    /// Vacation/blackout occurrence rather than a working one
    #[serde(default)]
    pub is_blocking_time: bool,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub is_recurring: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recurrence_pattern: Option<RecurrencePattern>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recurrence_end_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub series_id: Option<SeriesId>,
}

impl Shift {
    pub fn is_multi_day(&self) -> bool {
        self.start_date != self.end_date
    }

    /// Whether this shift can be edited with series scope.
    pub fn is_series_member(&self) -> bool {
        self.is_recurring && self.series_id.is_some()
    }

    /// Series fields either all describe a series or are all cleared.
    pub fn has_consistent_series_fields(&self) -> bool {
        if self.is_recurring {
            self.series_id.is_some()
                && self.recurrence_pattern.is_some()
                && self.recurrence_end_date.is_some()
        } else {
            self.series_id.is_none()
                && self.recurrence_pattern.is_none()
                && self.recurrence_end_date.is_none()
        }
    }

    /// Drop series membership and every recurrence field.
    pub fn detach(&mut self) {
        self.apply(&ShiftChanges::detach());
    }

    pub fn to_draft(&self) -> ShiftDraft {
        ShiftDraft {
            assignee_id: self.assignee_id.clone(),
            location_id: self.location_id.clone(),
            start_date: self.start_date,
            end_date: self.end_date,
            is_blocking_time: self.is_blocking_time,
            notes: self.notes.clone(),
            is_recurring: self.is_recurring,
            recurrence_pattern: self.recurrence_pattern,
            recurrence_end_date: self.recurrence_end_date,
            series_id: self.series_id.clone(),
        }
    }

    /// Apply a store-level partial update in place.
    pub fn apply(&mut self, changes: &ShiftChanges) {
        if let Some(v) = &changes.assignee_id {
            self.assignee_id = v.clone();
        }
        if let Some(v) = &changes.location_id {
            self.location_id = v.clone();
        }
        if let Some(v) = changes.start_date {
            self.start_date = v;
        }
        if let Some(v) = changes.end_date {
            self.end_date = v;
        }
        if let Some(v) = changes.is_blocking_time {
            self.is_blocking_time = v;
        }
        if let Some(v) = &changes.notes {
            self.notes = v.clone();
        }
        if let Some(v) = changes.is_recurring {
            self.is_recurring = v;
        }
        if let Some(v) = changes.recurrence_pattern {
            self.recurrence_pattern = v;
        }
        if let Some(v) = changes.recurrence_end_date {
            self.recurrence_end_date = v;
        }
        if let Some(v) = &changes.series_id {
            self.series_id = v.clone();
        }
    }
}

/// Order shifts by `(start_date, id)`, the order series members are written in.
pub fn sort_chronologically(shifts: &mut [Shift]) {
    shifts.sort_by(|a, b| a.start_date.cmp(&b.start_date).then_with(|| a.id.cmp(&b.id)));
}

/// Shift fields without an id: input to creation and to the generator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShiftDraft {
    pub assignee_id: String,
    pub location_id: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub is_blocking_time: bool,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub is_recurring: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recurrence_pattern: Option<RecurrencePattern>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recurrence_end_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub series_id: Option<SeriesId>,
}

impl ShiftDraft {
    /// Create a standalone single-day draft
    pub fn new(
        assignee_id: impl Into<String>,
        location_id: impl Into<String>,
        date: NaiveDate,
    ) -> Self {
        Self {
            assignee_id: assignee_id.into(),
            location_id: location_id.into(),
            start_date: date,
            end_date: date,
            is_blocking_time: false,
            notes: String::new(),
            is_recurring: false,
            recurrence_pattern: None,
            recurrence_end_date: None,
            series_id: None,
        }
    }

    pub fn ending(mut self, end_date: NaiveDate) -> Self {
        self.end_date = end_date;
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = notes.into();
        self
    }

    pub fn blocking(mut self, is_blocking_time: bool) -> Self {
        self.is_blocking_time = is_blocking_time;
        self
    }

    /// Turn the draft into a series definition
    pub fn recurring(mut self, pattern: RecurrencePattern, until: NaiveDate) -> Self {
        self.is_recurring = true;
        self.recurrence_pattern = Some(pattern);
        self.recurrence_end_date = Some(until);
        self
    }

    pub fn into_shift(self, id: impl Into<ShiftId>) -> Shift {
        Shift {
            id: id.into(),
            assignee_id: self.assignee_id,
            location_id: self.location_id,
            start_date: self.start_date,
            end_date: self.end_date,
            is_blocking_time: self.is_blocking_time,
            notes: self.notes,
            is_recurring: self.is_recurring,
            recurrence_pattern: self.recurrence_pattern,
            recurrence_end_date: self.recurrence_end_date,
            series_id: self.series_id,
        }
    }

    /// Reject malformed drafts before any store call.
    ///
    /// `series_id` is not checked: callers assign it after validation.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.start_date > self.end_date {
            return Err(ValidationError::InvalidDateOrder {
                start: self.start_date,
                end: self.end_date,
            });
        }
        if !self.is_recurring {
            if self.recurrence_pattern.is_some() || self.recurrence_end_date.is_some() {
                return Err(ValidationError::RecurrenceOnStandalone);
            }
            return Ok(());
        }
        if self.recurrence_pattern.is_none() {
            return Err(ValidationError::MissingRecurrenceField("recurrencePattern"));
        }
        match self.recurrence_end_date {
            None => Err(ValidationError::MissingRecurrenceField("recurrenceEndDate")),
            Some(until) if until < self.start_date => Err(ValidationError::RecurrenceEndBeforeStart {
                start: self.start_date,
                until,
            }),
            Some(_) => Ok(()),
        }
    }
}

/// Caller-level partial update; every field is optional
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShiftPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_blocking_time: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recurrence_pattern: Option<RecurrencePattern>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recurrence_end_date: Option<NaiveDate>,
}

impl ShiftPatch {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Touches a field that drives date generation.
    pub fn is_structural(&self) -> bool {
        self.start_date.is_some()
            || self.end_date.is_some()
            || self.recurrence_pattern.is_some()
            || self.recurrence_end_date.is_some()
    }

    pub fn has_recurrence_fields(&self) -> bool {
        self.recurrence_pattern.is_some() || self.recurrence_end_date.is_some()
    }

    /// Non-date fields only.
    pub fn cosmetic_changes(&self) -> ShiftChanges {
        ShiftChanges {
            assignee_id: self.assignee_id.clone(),
            location_id: self.location_id.clone(),
            is_blocking_time: self.is_blocking_time,
            notes: self.notes.clone(),
            ..ShiftChanges::default()
        }
    }

    /// Every field except the recurrence ones.
    pub fn occurrence_changes(&self) -> ShiftChanges {
        ShiftChanges {
            start_date: self.start_date,
            end_date: self.end_date,
            ..self.cosmetic_changes()
        }
    }
}

/// Store-level partial update.
///
/// Clearable fields are tri-state: `None` leaves the field alone,
/// `Some(None)` clears it, `Some(Some(v))` sets it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShiftChanges {
    pub assignee_id: Option<String>,
    pub location_id: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub is_blocking_time: Option<bool>,
    pub notes: Option<String>,
    pub is_recurring: Option<bool>,
    pub recurrence_pattern: Option<Option<RecurrencePattern>>,
    pub recurrence_end_date: Option<Option<NaiveDate>>,
    pub series_id: Option<Option<SeriesId>>,
}

impl ShiftChanges {
    /// Changes that turn a series member into a standalone shift
    pub fn detach() -> Self {
        Self {
            is_recurring: Some(false),
            recurrence_pattern: Some(None),
            recurrence_end_date: Some(None),
            series_id: Some(None),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Overlay `other` on top of `self`; fields set in `other` win.
    pub fn merge(mut self, other: ShiftChanges) -> Self {
        macro_rules! overlay {
            ($($field:ident),*) => {
                $(if other.$field.is_some() {
                    self.$field = other.$field;
                })*
            };
        }
        overlay!(
            assignee_id,
            location_id,
            start_date,
            end_date,
            is_blocking_time,
            notes,
            is_recurring,
            recurrence_pattern,
            recurrence_end_date,
            series_id
        );
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_draft_validation() {
        let ok = ShiftDraft::new("prov-1", "clinic-a", date(2024, 1, 1))
            .recurring(RecurrencePattern::Weekly, date(2024, 1, 22));
        assert!(ok.validate().is_ok());

        let inverted = ShiftDraft::new("prov-1", "clinic-a", date(2024, 1, 3)).ending(date(2024, 1, 1));
        assert!(matches!(
            inverted.validate(),
            Err(ValidationError::InvalidDateOrder { .. })
        ));

        let mut missing = ok.clone();
        missing.recurrence_pattern = None;
        assert!(matches!(
            missing.validate(),
            Err(ValidationError::MissingRecurrenceField("recurrencePattern"))
        ));

        let early_end = ShiftDraft::new("prov-1", "clinic-a", date(2024, 1, 10))
            .recurring(RecurrencePattern::Daily, date(2024, 1, 9));
        assert!(matches!(
            early_end.validate(),
            Err(ValidationError::RecurrenceEndBeforeStart { .. })
        ));

        let mut standalone_with_rule = ShiftDraft::new("prov-1", "clinic-a", date(2024, 1, 1));
        standalone_with_rule.recurrence_pattern = Some(RecurrencePattern::Daily);
        assert!(matches!(
            standalone_with_rule.validate(),
            Err(ValidationError::RecurrenceOnStandalone)
        ));
    }

    #[test]
    fn test_detach_clears_series_fields() {
        let mut shift = ShiftDraft::new("prov-1", "clinic-a", date(2024, 1, 1))
            .recurring(RecurrencePattern::Weekly, date(2024, 2, 1))
            .into_shift("s-1");
        shift.series_id = Some("series-1".into());
        assert!(shift.has_consistent_series_fields());

        shift.detach();
        assert!(!shift.is_recurring);
        assert_eq!(shift.series_id, None);
        assert_eq!(shift.recurrence_pattern, None);
        assert_eq!(shift.recurrence_end_date, None);
        assert!(shift.has_consistent_series_fields());
    }

    #[test]
    fn test_patch_classification() {
        let cosmetic = ShiftPatch {
            notes: Some("bring badge".into()),
            location_id: Some("clinic-b".into()),
            ..ShiftPatch::default()
        };
        assert!(!cosmetic.is_structural());
        assert_eq!(cosmetic.cosmetic_changes().notes.as_deref(), Some("bring badge"));

        let structural = ShiftPatch {
            recurrence_end_date: Some(date(2024, 4, 1)),
            ..ShiftPatch::default()
        };
        assert!(structural.is_structural());
        assert!(structural.has_recurrence_fields());
        assert!(structural.cosmetic_changes().is_empty());
    }

    #[test]
    fn test_changes_merge_prefers_overlay() {
        let base = ShiftChanges {
            notes: Some("a".into()),
            start_date: Some(date(2024, 1, 1)),
            ..ShiftChanges::default()
        };
        let merged = base.merge(ShiftChanges::detach());
        assert_eq!(merged.notes.as_deref(), Some("a"));
        assert_eq!(merged.series_id, Some(None));
        assert_eq!(merged.is_recurring, Some(false));
    }

    #[test]
    fn test_shift_serializes_camel_case_without_absent_series_fields() {
        let shift = ShiftDraft::new("prov-1", "clinic-a", date(2024, 2, 1))
            .ending(date(2024, 2, 3))
            .into_shift("s-1");
        let value = serde_json::to_value(&shift).unwrap();
        assert_eq!(value["assigneeId"], "prov-1");
        assert_eq!(value["startDate"], "2024-02-01");
        assert!(value.get("seriesId").is_none());
        assert!(shift.is_multi_day());
    }
}
