//! Recurrence pattern, edit scope and date range definitions

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// How far apart consecutive occurrences of a series start
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecurrencePattern {
    /// Every calendar day
    Daily,
    /// Every 7 days
    Weekly,
    /// Every 14 days
    Biweekly,
    /// Same day-of-month, one calendar month later
    Monthly,
}

impl RecurrencePattern {
    /// Day step for fixed-width patterns, `None` for calendar-month advancement.
    pub fn day_step(&self) -> Option<u64> {
        match self {
            Self::Daily => Some(1),
            Self::Weekly => Some(7),
            Self::Biweekly => Some(14),
            Self::Monthly => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Biweekly => "biweekly",
            Self::Monthly => "monthly",
        }
    }
}

impl fmt::Display for RecurrencePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecurrencePattern {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "daily" => Ok(Self::Daily),
            "weekly" => Ok(Self::Weekly),
            "biweekly" => Ok(Self::Biweekly),
            "monthly" => Ok(Self::Monthly),
            other => Err(ValidationError::UnknownPattern(other.to_string())),
        }
    }
}

/// Breadth of an update or delete
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EditScope {
    /// The targeted occurrence only
    This,
    /// The targeted multi-day block; stored the same way as `This`
    Span,
    /// Every occurrence sharing the target's series id
    Series,
}

impl EditScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::This => "this",
            Self::Span => "span",
            Self::Series => "series",
        }
    }
}

impl fmt::Display for EditScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EditScope {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "this" => Ok(Self::This),
            "span" => Ok(Self::Span),
            "series" => Ok(Self::Series),
            other => Err(ValidationError::UnknownScope(other.to_string())),
        }
    }
}

/// Closed calendar interval `[from, to]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl DateRange {
    pub fn new(from: NaiveDate, to: NaiveDate) -> Result<Self, ValidationError> {
        if from > to {
            return Err(ValidationError::InvalidRange { from, to });
        }
        Ok(Self { from, to })
    }

    /// Standard interval overlap with another closed interval.
    pub fn overlaps(&self, start: NaiveDate, end: NaiveDate) -> bool {
        start <= self.to && end >= self.from
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_pattern_parse_rejects_unknown_instead_of_defaulting() {
        assert_eq!("Weekly".parse::<RecurrencePattern>().unwrap(), RecurrencePattern::Weekly);
        assert_eq!(" biweekly ".parse::<RecurrencePattern>().unwrap(), RecurrencePattern::Biweekly);
        assert!(matches!(
            "fortnightly".parse::<RecurrencePattern>(),
            Err(ValidationError::UnknownPattern(p)) if p == "fortnightly"
        ));
    }

    #[test]
    fn test_scope_parse() {
        assert_eq!("SERIES".parse::<EditScope>().unwrap(), EditScope::Series);
        assert!("all".parse::<EditScope>().is_err());
    }

    #[test]
    fn test_range_overlap_is_not_containment() {
        let range = DateRange::new(date(2024, 1, 10), date(2024, 1, 10)).unwrap();
        assert!(range.overlaps(date(2024, 1, 8), date(2024, 1, 12)));
        assert!(range.overlaps(date(2024, 1, 10), date(2024, 1, 10)));
        assert!(!range.overlaps(date(2024, 1, 8), date(2024, 1, 9)));
        assert!(!range.overlaps(date(2024, 1, 11), date(2024, 1, 11)));
    }

    #[test]
    fn test_range_rejects_inverted_bounds() {
        assert!(DateRange::new(date(2024, 2, 1), date(2024, 1, 1)).is_err());
    }
}
