//! Occurrence generator
//!
//! Expands a series template into its bounded, dated occurrences. Pure and
//! deterministic: the same template and rule always yield the same output.

use chrono::{Days, Months, NaiveDate};

use crate::error::ValidationError;
use crate::types::{RecurrencePattern, ShiftDraft};

/// Hard cap on occurrences produced by one generation pass.
pub const DEFAULT_MAX_OCCURRENCES: usize = 300;

/// Pattern and last allowed start date of a series
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecurrenceRule {
    pub pattern: RecurrencePattern,
    pub until: NaiveDate,
}

impl RecurrenceRule {
    pub fn new(pattern: RecurrencePattern, until: NaiveDate) -> Self {
        Self { pattern, until }
    }

    /// Read the rule carried by a recurring draft
    pub fn from_draft(draft: &ShiftDraft) -> Result<Self, ValidationError> {
        let pattern = draft
            .recurrence_pattern
            .ok_or(ValidationError::MissingRecurrenceField("recurrencePattern"))?;
        let until = draft
            .recurrence_end_date
            .ok_or(ValidationError::MissingRecurrenceField("recurrenceEndDate"))?;
        Ok(Self { pattern, until })
    }
}

/// Output of one generation pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Generation {
    /// Occurrences in increasing start order, anchor first
    pub occurrences: Vec<ShiftDraft>,
    /// The cap stopped generation while in-window starts remained
    pub bound_reached: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OccurrenceGenerator {
    max_occurrences: usize,
}

impl Default for OccurrenceGenerator {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_OCCURRENCES)
    }
}

impl OccurrenceGenerator {
    pub fn new(max_occurrences: usize) -> Self {
        Self {
            max_occurrences: max_occurrences.max(1),
        }
    }

    /// Expand `template` under `rule`.
    ///
    /// The template's own dates are the first occurrence. Every emitted
    /// occurrence keeps the template's span and non-date fields, its series
    /// id, and carries `rule` as its recurrence fields.
    pub fn generate(&self, template: &ShiftDraft, rule: RecurrenceRule) -> Generation {
        let span = template.end_date - template.start_date;
        let mut occurrences = Vec::new();
        let mut bound_reached = false;

        let mut k: u32 = 0;
        loop {
            let Some(start) = nth_start(template.start_date, rule.pattern, k) else {
                break;
            };
            if k > 0 && start > rule.until {
                break;
            }
            if occurrences.len() >= self.max_occurrences {
                bound_reached = true;
                tracing::warn!(
                    max_occurrences = self.max_occurrences,
                    pattern = %rule.pattern,
                    until = %rule.until,
                    next_start = %start,
                    "occurrence cap reached before recurrence end date"
                );
                break;
            }
            let Some(end) = start.checked_add_signed(span) else {
                break;
            };
            occurrences.push(ShiftDraft {
                start_date: start,
                end_date: end,
                is_recurring: true,
                recurrence_pattern: Some(rule.pattern),
                recurrence_end_date: Some(rule.until),
                ..template.clone()
            });
            k = match k.checked_add(1) {
                Some(next) => next,
                None => break,
            };
        }

        Generation {
            occurrences,
            bound_reached,
        }
    }
}

/// Start of the k-th occurrence, computed from the anchor so monthly series
/// return to the anchor's day-of-month after a short month.
fn nth_start(anchor: NaiveDate, pattern: RecurrencePattern, k: u32) -> Option<NaiveDate> {
    match pattern.day_step() {
        Some(step) => anchor.checked_add_days(Days::new(step.checked_mul(u64::from(k))?)),
        None => anchor.checked_add_months(Months::new(k)),
    }
}
