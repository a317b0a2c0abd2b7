//! Series mutation resolver
//!
//! Turns a scoped create/update/delete request into a `MutationPlan`: the
//! ordered store operations that realise it, plus the series that must be
//! reconciled afterwards. Planning is pure; executing a plan is the job of
//! the runtime engine.

use chrono::{Days, NaiveDate};

use crate::error::ValidationError;
use crate::generator::{OccurrenceGenerator, RecurrenceRule};
use crate::types::{
    sort_chronologically, EditScope, SeriesId, Shift, ShiftChanges, ShiftDraft, ShiftId,
    ShiftPatch,
};

/// Days a series is extended to when an edit moves its start past the
/// recurrence end date.
pub const DEFAULT_RECURRENCE_CLAMP_DAYS: u64 = 28;

/// A single store operation of a plan
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlannedOp {
    Create(ShiftDraft),
    Update { id: ShiftId, changes: ShiftChanges },
    Delete(ShiftId),
}

/// Ordered store operations realising one mutation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MutationPlan {
    /// Executed strictly in order
    pub ops: Vec<PlannedOp>,
    /// Series whose membership must be re-evaluated once `ops` are applied
    pub reconcile: Option<SeriesId>,
    /// The generator hit its cap while building this plan
    pub bound_reached: bool,
}

impl MutationPlan {
    fn single(op: PlannedOp) -> Self {
        Self {
            ops: vec![op],
            ..Self::default()
        }
    }

    pub fn creates(&self) -> usize {
        self.ops
            .iter()
            .filter(|op| matches!(op, PlannedOp::Create(_)))
            .count()
    }

    pub fn deletes(&self) -> usize {
        self.ops
            .iter()
            .filter(|op| matches!(op, PlannedOp::Delete(_)))
            .count()
    }
}

/// Earliest-starting member; ties break on id.
pub fn anchor_of(members: &[Shift]) -> Option<&Shift> {
    members
        .iter()
        .min_by(|a, b| a.start_date.cmp(&b.start_date).then_with(|| a.id.cmp(&b.id)))
}

#[derive(Debug, Clone, Copy)]
pub struct MutationResolver {
    generator: OccurrenceGenerator,
    clamp_days: u64,
}

impl Default for MutationResolver {
    fn default() -> Self {
        Self::new(OccurrenceGenerator::default(), DEFAULT_RECURRENCE_CLAMP_DAYS)
    }
}

impl MutationResolver {
    pub fn new(generator: OccurrenceGenerator, clamp_days: u64) -> Self {
        Self {
            generator,
            clamp_days: clamp_days.max(1),
        }
    }

    /// Plan creation of a standalone shift or a whole series.
    ///
    /// `series_id` is used only when the draft is recurring. A recurring draft
    /// whose expansion yields a single occurrence is created standalone.
    pub fn plan_create(
        &self,
        draft: &ShiftDraft,
        series_id: &str,
    ) -> Result<MutationPlan, ValidationError> {
        draft.validate()?;

        if !draft.is_recurring {
            let mut standalone = draft.clone();
            standalone.series_id = None;
            return Ok(MutationPlan::single(PlannedOp::Create(standalone)));
        }

        let rule = RecurrenceRule::from_draft(draft)?;
        let mut template = draft.clone();
        template.series_id = Some(series_id.to_string());
        let generation = self.generator.generate(&template, rule);

        if generation.occurrences.len() <= 1 {
            tracing::debug!(
                start = %draft.start_date,
                until = %rule.until,
                "recurring draft expands to one occurrence; creating standalone"
            );
            let mut standalone = draft.clone();
            standalone.is_recurring = false;
            standalone.recurrence_pattern = None;
            standalone.recurrence_end_date = None;
            standalone.series_id = None;
            return Ok(MutationPlan::single(PlannedOp::Create(standalone)));
        }

        Ok(MutationPlan {
            ops: generation
                .occurrences
                .into_iter()
                .map(PlannedOp::Create)
                .collect(),
            reconcile: None,
            bound_reached: generation.bound_reached,
        })
    }

    /// Plan a scoped update of `target`.
    ///
    /// `members` are the current members of the target's series (may be empty
    /// for standalone shifts).
    pub fn plan_update(
        &self,
        target: &Shift,
        members: &[Shift],
        patch: &ShiftPatch,
        scope: EditScope,
    ) -> Result<MutationPlan, ValidationError> {
        if patch.is_empty() {
            return Err(ValidationError::EmptyPatch);
        }
        check_scope(target, scope)?;

        match scope {
            EditScope::This | EditScope::Span => self.plan_occurrence_update(target, patch),
            EditScope::Series if patch.is_structural() => {
                self.plan_regeneration(target, members, patch)
            }
            EditScope::Series => Ok(self.plan_cosmetic_update(target, members, patch)),
        }
    }

    /// Plan a scoped delete of `target`.
    pub fn plan_delete(
        &self,
        target: &Shift,
        members: &[Shift],
        scope: EditScope,
    ) -> Result<MutationPlan, ValidationError> {
        check_scope(target, scope)?;

        match scope {
            EditScope::This | EditScope::Span => Ok(MutationPlan {
                ops: vec![PlannedOp::Delete(target.id.clone())],
                reconcile: target.series_id.clone(),
                bound_reached: false,
            }),
            EditScope::Series => Ok(MutationPlan {
                ops: ordered_members(target, members)
                    .into_iter()
                    .map(|member| PlannedOp::Delete(member.id))
                    .collect(),
                reconcile: None,
                bound_reached: false,
            }),
        }
    }

    fn plan_occurrence_update(
        &self,
        target: &Shift,
        patch: &ShiftPatch,
    ) -> Result<MutationPlan, ValidationError> {
        if patch.has_recurrence_fields() {
            return Err(ValidationError::RecurrenceNeedsSeriesScope);
        }
        let start = patch.start_date.unwrap_or(target.start_date);
        let end = patch.end_date.unwrap_or(target.end_date);
        if start > end {
            return Err(ValidationError::InvalidDateOrder { start, end });
        }

        let mut changes = patch.occurrence_changes();
        if target.is_recurring || target.series_id.is_some() {
            changes = changes.merge(ShiftChanges::detach());
        }

        Ok(MutationPlan {
            ops: vec![PlannedOp::Update {
                id: target.id.clone(),
                changes,
            }],
            reconcile: target.series_id.clone(),
            bound_reached: false,
        })
    }

    fn plan_cosmetic_update(
        &self,
        target: &Shift,
        members: &[Shift],
        patch: &ShiftPatch,
    ) -> MutationPlan {
        let changes = patch.cosmetic_changes();
        MutationPlan {
            ops: ordered_members(target, members)
                .into_iter()
                .map(|member| PlannedOp::Update {
                    id: member.id,
                    changes: changes.clone(),
                })
                .collect(),
            reconcile: None,
            bound_reached: false,
        }
    }

    /// Structural series edit: keep the anchor's id, drop every other member
    /// and regenerate from the rebuilt anchor.
    ///
    /// Patch dates are read against the targeted occurrence; the anchor moves
    /// by the same offset and takes the patched span.
    fn plan_regeneration(
        &self,
        target: &Shift,
        members: &[Shift],
        patch: &ShiftPatch,
    ) -> Result<MutationPlan, ValidationError> {
        let members = ordered_members(target, members);
        let Some(anchor) = anchor_of(&members) else {
            return Err(ValidationError::ScopeNotApplicable {
                scope: EditScope::Series,
                reason: "series has no members",
            });
        };
        let series_id = anchor
            .series_id
            .clone()
            .or_else(|| target.series_id.clone())
            .ok_or(ValidationError::ScopeNotApplicable {
                scope: EditScope::Series,
                reason: "target is not part of a recurring series",
            })?;

        let target_start = patch.start_date.unwrap_or(target.start_date);
        let target_end = patch.end_date.unwrap_or(target.end_date);
        if target_start > target_end {
            return Err(ValidationError::InvalidDateOrder {
                start: target_start,
                end: target_end,
            });
        }
        let start = anchor
            .start_date
            .checked_add_signed(target_start - target.start_date)
            .ok_or(ValidationError::DateOutOfRange)?;
        let end = start
            .checked_add_signed(target_end - target_start)
            .ok_or(ValidationError::DateOutOfRange)?;

        let pattern = patch
            .recurrence_pattern
            .or(anchor.recurrence_pattern)
            .ok_or(ValidationError::MissingRecurrenceField("recurrencePattern"))?;
        let until = self.resolve_until(&series_id, start, patch, anchor.recurrence_end_date)?;

        let mut rebuilt = anchor.clone();
        rebuilt.apply(&patch.cosmetic_changes());
        rebuilt.start_date = start;
        rebuilt.end_date = end;
        rebuilt.series_id = Some(series_id.clone());
        let generation = self
            .generator
            .generate(&rebuilt.to_draft(), RecurrenceRule::new(pattern, until));

        tracing::info!(
            series_id = %series_id,
            anchor_id = %anchor.id,
            removed = members.len().saturating_sub(1),
            generated = generation.occurrences.len(),
            pattern = %pattern,
            until = %until,
            "regenerating series"
        );

        let anchor_changes = patch.cosmetic_changes().merge(ShiftChanges {
            start_date: Some(start),
            end_date: Some(end),
            is_recurring: Some(true),
            recurrence_pattern: Some(Some(pattern)),
            recurrence_end_date: Some(Some(until)),
            series_id: Some(Some(series_id.clone())),
            ..ShiftChanges::default()
        });

        let mut ops: Vec<PlannedOp> = members
            .iter()
            .filter(|member| member.id != anchor.id)
            .map(|member| PlannedOp::Delete(member.id.clone()))
            .collect();
        ops.push(PlannedOp::Update {
            id: anchor.id.clone(),
            changes: anchor_changes,
        });
        ops.extend(
            generation
                .occurrences
                .into_iter()
                .skip(1)
                .map(PlannedOp::Create),
        );

        Ok(MutationPlan {
            ops,
            reconcile: Some(series_id),
            bound_reached: generation.bound_reached,
        })
    }

    /// Recurrence end after a structural edit.
    ///
    /// An explicit end before the new start is rejected; an inherited end that
    /// the edit overtook is clamped to `start + clamp_days`.
    fn resolve_until(
        &self,
        series_id: &str,
        start: NaiveDate,
        patch: &ShiftPatch,
        inherited: Option<NaiveDate>,
    ) -> Result<NaiveDate, ValidationError> {
        match (patch.recurrence_end_date, inherited) {
            (Some(until), _) if until < start => {
                Err(ValidationError::RecurrenceEndBeforeStart { start, until })
            }
            (Some(until), _) => Ok(until),
            (None, Some(until)) if until >= start => Ok(until),
            (None, previous) => {
                let clamped = start
                    .checked_add_days(Days::new(self.clamp_days))
                    .ok_or(ValidationError::DateOutOfRange)?;
                tracing::warn!(
                    series_id = %series_id,
                    previous = ?previous,
                    clamped = %clamped,
                    clamp_days = self.clamp_days,
                    "edit moved series start past its recurrence end; clamping"
                );
                Ok(clamped)
            }
        }
    }
}

fn check_scope(target: &Shift, scope: EditScope) -> Result<(), ValidationError> {
    match scope {
        EditScope::This => Ok(()),
        EditScope::Span if !target.is_multi_day() => Err(ValidationError::ScopeNotApplicable {
            scope,
            reason: "target is a single-day shift",
        }),
        EditScope::Span => Ok(()),
        EditScope::Series if !target.is_series_member() => {
            Err(ValidationError::ScopeNotApplicable {
                scope,
                reason: "target is not part of a recurring series",
            })
        }
        EditScope::Series => Ok(()),
    }
}

/// Series members in write order, guaranteed to include `target`.
fn ordered_members(target: &Shift, members: &[Shift]) -> Vec<Shift> {
    let mut ordered: Vec<Shift> = members.to_vec();
    if !ordered.iter().any(|member| member.id == target.id) {
        ordered.push(target.clone());
    }
    sort_chronologically(&mut ordered);
    ordered
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RecurrencePattern;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn weekly_series(days: &[u32]) -> Vec<Shift> {
        days.iter()
            .enumerate()
            .map(|(i, day)| {
                let mut shift = ShiftDraft::new("prov-1", "clinic-a", date(2024, 1, *day))
                    .recurring(RecurrencePattern::Weekly, date(2024, 1, 22))
                    .into_shift(format!("m{i}"));
                shift.series_id = Some("series-1".to_string());
                shift
            })
            .collect()
    }

    fn created(plan: &MutationPlan) -> Vec<&ShiftDraft> {
        plan.ops
            .iter()
            .filter_map(|op| match op {
                PlannedOp::Create(draft) => Some(draft),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_plan_create_expands_series_anchor_first() {
        let resolver = MutationResolver::default();
        let draft = ShiftDraft::new("prov-1", "clinic-a", date(2024, 1, 1))
            .recurring(RecurrencePattern::Weekly, date(2024, 1, 22));
        let plan = resolver.plan_create(&draft, "series-9").unwrap();

        let drafts = created(&plan);
        assert_eq!(drafts.len(), 4);
        assert_eq!(drafts[0].start_date, date(2024, 1, 1));
        assert!(drafts
            .iter()
            .all(|d| d.series_id.as_deref() == Some("series-9")));
    }

    #[test]
    fn test_plan_create_single_occurrence_is_standalone() {
        let resolver = MutationResolver::default();
        let draft = ShiftDraft::new("prov-1", "clinic-a", date(2024, 1, 1))
            .recurring(RecurrencePattern::Monthly, date(2024, 1, 20));
        let plan = resolver.plan_create(&draft, "series-9").unwrap();

        let drafts = created(&plan);
        assert_eq!(drafts.len(), 1);
        assert!(!drafts[0].is_recurring);
        assert_eq!(drafts[0].series_id, None);
        assert_eq!(drafts[0].recurrence_pattern, None);
    }

    #[test]
    fn test_plan_create_rejects_invalid_draft() {
        let resolver = MutationResolver::default();
        let draft = ShiftDraft::new("prov-1", "clinic-a", date(2024, 1, 5)).ending(date(2024, 1, 1));
        assert!(resolver.plan_create(&draft, "s").is_err());
    }

    #[test]
    fn test_update_this_detaches_and_reconciles() {
        let resolver = MutationResolver::default();
        let members = weekly_series(&[1, 8, 15, 22]);
        let patch = ShiftPatch {
            notes: Some("swap".into()),
            ..ShiftPatch::default()
        };
        let plan = resolver
            .plan_update(&members[1], &members, &patch, EditScope::This)
            .unwrap();

        assert_eq!(plan.ops.len(), 1);
        let PlannedOp::Update { id, changes } = &plan.ops[0] else {
            panic!("expected update");
        };
        assert_eq!(id, "m1");
        assert_eq!(changes.series_id, Some(None));
        assert_eq!(changes.is_recurring, Some(false));
        assert_eq!(changes.notes.as_deref(), Some("swap"));
        assert_eq!(plan.reconcile.as_deref(), Some("series-1"));
    }

    #[test]
    fn test_update_this_rejects_recurrence_fields() {
        let resolver = MutationResolver::default();
        let members = weekly_series(&[1, 8]);
        let patch = ShiftPatch {
            recurrence_pattern: Some(RecurrencePattern::Daily),
            ..ShiftPatch::default()
        };
        assert_eq!(
            resolver.plan_update(&members[0], &members, &patch, EditScope::This),
            Err(ValidationError::RecurrenceNeedsSeriesScope)
        );
    }

    #[test]
    fn test_scope_applicability() {
        let resolver = MutationResolver::default();
        let standalone = ShiftDraft::new("prov-1", "clinic-a", date(2024, 1, 1)).into_shift("x");
        let patch = ShiftPatch {
            notes: Some("n".into()),
            ..ShiftPatch::default()
        };

        assert!(matches!(
            resolver.plan_update(&standalone, &[], &patch, EditScope::Series),
            Err(ValidationError::ScopeNotApplicable { scope: EditScope::Series, .. })
        ));
        assert!(matches!(
            resolver.plan_delete(&standalone, &[], EditScope::Span),
            Err(ValidationError::ScopeNotApplicable { scope: EditScope::Span, .. })
        ));
    }

    #[test]
    fn test_update_series_cosmetic_touches_every_member_in_place() {
        let resolver = MutationResolver::default();
        let members = weekly_series(&[1, 8, 15, 22]);
        let patch = ShiftPatch {
            location_id: Some("clinic-b".into()),
            ..ShiftPatch::default()
        };
        let plan = resolver
            .plan_update(&members[2], &members, &patch, EditScope::Series)
            .unwrap();

        assert_eq!(plan.ops.len(), 4);
        assert_eq!(plan.creates(), 0);
        assert_eq!(plan.deletes(), 0);
        assert!(plan.reconcile.is_none());
        for op in &plan.ops {
            let PlannedOp::Update { changes, .. } = op else {
                panic!("expected update");
            };
            assert_eq!(changes.location_id.as_deref(), Some("clinic-b"));
            assert!(changes.start_date.is_none());
        }
    }

    #[test]
    fn test_update_series_structural_keeps_anchor_and_regenerates() {
        let resolver = MutationResolver::default();
        let members = weekly_series(&[1, 8, 15, 22]);
        let patch = ShiftPatch {
            recurrence_pattern: Some(RecurrencePattern::Monthly),
            recurrence_end_date: Some(date(2024, 4, 1)),
            ..ShiftPatch::default()
        };
        let plan = resolver
            .plan_update(&members[3], &members, &patch, EditScope::Series)
            .unwrap();

        let deleted: Vec<&str> = plan
            .ops
            .iter()
            .filter_map(|op| match op {
                PlannedOp::Delete(id) => Some(id.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(deleted, vec!["m1", "m2", "m3"]);

        let anchor_update = plan.ops.iter().find_map(|op| match op {
            PlannedOp::Update { id, changes } => Some((id, changes)),
            _ => None,
        });
        let (anchor_id, changes) = anchor_update.unwrap();
        assert_eq!(anchor_id, "m0");
        assert_eq!(changes.start_date, Some(date(2024, 1, 1)));
        assert_eq!(changes.recurrence_pattern, Some(Some(RecurrencePattern::Monthly)));

        let starts: Vec<NaiveDate> = created(&plan).iter().map(|d| d.start_date).collect();
        assert_eq!(starts, vec![date(2024, 2, 1), date(2024, 3, 1), date(2024, 4, 1)]);
        assert_eq!(plan.reconcile.as_deref(), Some("series-1"));
    }

    #[test]
    fn test_structural_dates_move_anchor_by_target_offset() {
        let resolver = MutationResolver::default();
        let members = weekly_series(&[1, 8, 15, 22]);
        // push the third occurrence one day later and make it two days long
        let patch = ShiftPatch {
            start_date: Some(date(2024, 1, 16)),
            end_date: Some(date(2024, 1, 17)),
            ..ShiftPatch::default()
        };
        let plan = resolver
            .plan_update(&members[2], &members, &patch, EditScope::Series)
            .unwrap();

        let (_, changes) = plan
            .ops
            .iter()
            .find_map(|op| match op {
                PlannedOp::Update { id, changes } => Some((id, changes)),
                _ => None,
            })
            .unwrap();
        assert_eq!(changes.start_date, Some(date(2024, 1, 2)));
        assert_eq!(changes.end_date, Some(date(2024, 1, 3)));
        let drafts = created(&plan);
        assert_eq!(drafts.len(), 2);
        assert!(drafts.iter().all(|d| (d.end_date - d.start_date).num_days() == 1));
    }

    #[test]
    fn test_structural_explicit_end_before_start_is_rejected() {
        let resolver = MutationResolver::default();
        let members = weekly_series(&[1, 8, 15, 22]);
        let patch = ShiftPatch {
            start_date: Some(date(2024, 1, 5)),
            end_date: Some(date(2024, 1, 5)),
            recurrence_end_date: Some(date(2024, 1, 3)),
            ..ShiftPatch::default()
        };
        assert!(matches!(
            resolver.plan_update(&members[0], &members, &patch, EditScope::Series),
            Err(ValidationError::RecurrenceEndBeforeStart { .. })
        ));
    }

    #[test]
    fn test_structural_overtaken_end_is_clamped() {
        let resolver = MutationResolver::new(OccurrenceGenerator::default(), 14);
        let members = weekly_series(&[1, 8, 15, 22]);
        let patch = ShiftPatch {
            start_date: Some(date(2024, 2, 1)),
            end_date: Some(date(2024, 2, 1)),
            ..ShiftPatch::default()
        };
        let plan = resolver
            .plan_update(&members[0], &members, &patch, EditScope::Series)
            .unwrap();

        let starts: Vec<NaiveDate> = created(&plan).iter().map(|d| d.start_date).collect();
        assert_eq!(starts, vec![date(2024, 2, 8), date(2024, 2, 15)]);
        assert!(created(&plan)
            .iter()
            .all(|d| d.recurrence_end_date == Some(date(2024, 2, 15))));
    }

    #[test]
    fn test_delete_scopes() {
        let resolver = MutationResolver::default();
        let members = weekly_series(&[1, 8, 15, 22]);

        let this = resolver
            .plan_delete(&members[1], &members, EditScope::This)
            .unwrap();
        assert_eq!(this.ops, vec![PlannedOp::Delete("m1".into())]);
        assert_eq!(this.reconcile.as_deref(), Some("series-1"));

        let series = resolver
            .plan_delete(&members[1], &members, EditScope::Series)
            .unwrap();
        assert_eq!(series.deletes(), 4);
        assert!(series.reconcile.is_none());

        let block = ShiftDraft::new("prov-1", "clinic-a", date(2024, 2, 1))
            .ending(date(2024, 2, 3))
            .into_shift("block");
        let span = resolver.plan_delete(&block, &[], EditScope::Span).unwrap();
        assert_eq!(span.ops, vec![PlannedOp::Delete("block".into())]);
        assert!(span.reconcile.is_none());
    }

    #[test]
    fn test_regeneration_keeps_smallest_id_on_start_tie() {
        let resolver = MutationResolver::default();
        let mut members = weekly_series(&[1, 1, 8]);
        members[0].id = "b".into();
        members[1].id = "a".into();
        members.reverse();

        let patch = ShiftPatch {
            recurrence_end_date: Some(date(2024, 1, 15)),
            ..ShiftPatch::default()
        };
        let plan = resolver
            .plan_update(&members[0], &members, &patch, EditScope::Series)
            .unwrap();

        let updated: Vec<&str> = plan
            .ops
            .iter()
            .filter_map(|op| match op {
                PlannedOp::Update { id, .. } => Some(id.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(updated, vec!["a"]);
        assert_eq!(
            &plan.ops[..2],
            &[PlannedOp::Delete("b".into()), PlannedOp::Delete("m2".into())]
        );
        assert_eq!(plan.deletes(), 2);
        assert_eq!(plan.creates(), 2);
    }
}
