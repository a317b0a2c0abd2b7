//! Series consistency decisions
//!
//! A series id with a single member is invalid at rest. These functions
//! decide what to detach; the runtime applies the decision to the store in
//! the same logical operation as the mutation that triggered it.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::types::{Shift, ShiftId};

/// Result of reconciling one series
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Reconciliation {
    /// No member remains
    Empty,
    /// Two or more members remain; nothing changed
    Intact { members: usize },
    /// The lone remaining member was turned into a standalone shift
    Detached { shift: Shift },
}

/// What to do with a series after its membership changed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileAction {
    Nothing { remaining: usize },
    Detach(ShiftId),
}

/// Decide the fate of a series from its current members.
pub fn decide(members: &[Shift]) -> ReconcileAction {
    match members {
        [only] => ReconcileAction::Detach(only.id.clone()),
        _ => ReconcileAction::Nothing {
            remaining: members.len(),
        },
    }
}

/// Shifts a full repair sweep must detach, in id order.
///
/// A shift is detached when its series fields contradict each other, or when
/// it is the only consistent member left under its series id.
pub fn orphaned(shifts: &[Shift]) -> Vec<ShiftId> {
    let mut detach: BTreeSet<ShiftId> = shifts
        .iter()
        .filter(|shift| !shift.has_consistent_series_fields())
        .map(|shift| shift.id.clone())
        .collect();

    let mut by_series: BTreeMap<&str, Vec<&Shift>> = BTreeMap::new();
    for shift in shifts {
        if detach.contains(&shift.id) {
            continue;
        }
        if let Some(series_id) = shift.series_id.as_deref() {
            by_series.entry(series_id).or_default().push(shift);
        }
    }
    for members in by_series.values() {
        if let [only] = members.as_slice() {
            detach.insert(only.id.clone());
        }
    }

    detach.into_iter().collect()
}
