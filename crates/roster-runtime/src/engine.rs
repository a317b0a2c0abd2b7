//! ShiftEngine - scoped shift operations over a ShiftStore
//!
//! The engine owns the working set and a `MutationResolver`. Every mutation
//! holds the working set lock from target lookup to reconciliation, awaits
//! each store call before issuing the next, and writes series members in
//! increasing start order. A store failure mid-plan leaves the already
//! written records in place and marks the working set stale; the next call
//! reloads it from the store before doing anything else.

use std::sync::Arc;

use chrono::NaiveDate;
use serde::Serialize;
use tokio::sync::Mutex;

use roster_core::consistency::Reconciliation;
use roster_core::error::EngineError;
use roster_core::resolver::{MutationPlan, MutationResolver, PlannedOp};
use roster_core::store::{ShiftStore, StoreError, WorkingSet};
use roster_core::types::{
    sort_chronologically, DateRange, EditScope, SeriesId, Shift, ShiftDraft, ShiftId, ShiftPatch,
};

use crate::{cache, consistency};

/// What a mutation did to the store
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MutationOutcome {
    /// Ids assigned to created shifts, in write order
    pub created: Vec<ShiftId>,
    pub updated: Vec<ShiftId>,
    pub deleted: Vec<ShiftId>,
    /// Series created or regenerated by the mutation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub series_id: Option<SeriesId>,
    /// Result of re-evaluating the series the mutation touched
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reconciliation: Option<Reconciliation>,
    /// Occurrence generation stopped at the configured cap
    pub bound_reached: bool,
}

impl MutationOutcome {
    /// Id of the shift detached by reconciliation, if any
    pub fn detached(&self) -> Option<&str> {
        match &self.reconciliation {
            Some(Reconciliation::Detached { shift }) => Some(shift.id.as_str()),
            _ => None,
        }
    }
}

/// Recurring-shift engine
pub struct ShiftEngine {
    store: Arc<dyn ShiftStore>,
    resolver: MutationResolver,
    working_set: Mutex<WorkingSet>,
}

impl ShiftEngine {
    pub fn new(store: Arc<dyn ShiftStore>, resolver: MutationResolver) -> Self {
        Self {
            store,
            resolver,
            working_set: Mutex::new(WorkingSet::new()),
        }
    }

    /// Engine with the default generator cap and clamp span.
    pub fn with_store(store: Arc<dyn ShiftStore>) -> Self {
        Self::new(store, MutationResolver::default())
    }

    pub fn store(&self) -> &Arc<dyn ShiftStore> {
        &self.store
    }

    /// Create a standalone shift, or a whole series when `draft` is recurring.
    pub async fn add_shift(&self, draft: ShiftDraft) -> Result<MutationOutcome, EngineError> {
        let series_id = uuid::Uuid::new_v4().to_string();
        let plan = self.resolver.plan_create(&draft, &series_id)?;

        let mut working_set = self.working_set.lock().await;
        self.ensure_fresh(&mut working_set).await?;

        let mut outcome = self.execute(&mut working_set, plan).await?;
        if outcome.created.len() > 1 {
            tracing::info!(
                series_id = %series_id,
                count = outcome.created.len(),
                "series created"
            );
            outcome.series_id = Some(series_id);
        }
        Ok(outcome)
    }

    /// Apply `patch` to a shift with the given scope.
    pub async fn update_shift(
        &self,
        id: &str,
        patch: ShiftPatch,
        scope: EditScope,
    ) -> Result<MutationOutcome, EngineError> {
        let mut working_set = self.working_set.lock().await;
        self.ensure_fresh(&mut working_set).await?;

        let target = self.find_target(&working_set, id).await?;
        let members = self.series_members_for(&target, scope).await?;
        let plan = self
            .resolver
            .plan_update(&target, &members, &patch, scope)?;
        let regenerated = scope == EditScope::Series && patch.is_structural();

        tracing::debug!(
            shift_id = %id,
            scope = %scope,
            ops = plan.ops.len(),
            "executing update plan"
        );
        let mut outcome = self.execute(&mut working_set, plan).await?;
        if regenerated {
            outcome.series_id = target.series_id.clone();
        }
        Ok(outcome)
    }

    /// Delete a shift with the given scope.
    pub async fn delete_shift(
        &self,
        id: &str,
        scope: EditScope,
    ) -> Result<MutationOutcome, EngineError> {
        let mut working_set = self.working_set.lock().await;
        self.ensure_fresh(&mut working_set).await?;

        let target = self.find_target(&working_set, id).await?;
        let members = self.series_members_for(&target, scope).await?;
        let plan = self.resolver.plan_delete(&target, &members, scope)?;

        tracing::debug!(
            shift_id = %id,
            scope = %scope,
            ops = plan.ops.len(),
            "executing delete plan"
        );
        self.execute(&mut working_set, plan).await
    }

    /// Load `[from, to]` into the working set and return its content.
    ///
    /// The result holds every shift overlapping the range plus all members
    /// of each series those shifts belong to.
    pub async fn get_shifts_by_date_range(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<Shift>, EngineError> {
        let range = DateRange::new(from, to)?;
        let mut working_set = self.working_set.lock().await;
        self.load(&mut working_set, range).await
    }

    /// Every stored shift assigned to `assignee_id`.
    pub async fn get_shifts_by_assignee(
        &self,
        assignee_id: &str,
    ) -> Result<Vec<Shift>, EngineError> {
        let mut working_set = self.working_set.lock().await;
        self.ensure_fresh(&mut working_set).await?;

        let mut shifts: Vec<Shift> = self
            .store
            .get_all_shifts()
            .await?
            .into_iter()
            .filter(|shift| shift.assignee_id == assignee_id)
            .collect();
        sort_chronologically(&mut shifts);
        Ok(shifts)
    }

    /// Every stored shift.
    pub async fn get_all_shifts(&self) -> Result<Vec<Shift>, EngineError> {
        let mut shifts = self.store.get_all_shifts().await?;
        sort_chronologically(&mut shifts);
        Ok(shifts)
    }

    /// Re-evaluate one series and detach its last member if it stands alone.
    pub async fn reconcile(&self, series_id: &str) -> Result<Reconciliation, EngineError> {
        let mut working_set = self.working_set.lock().await;
        self.ensure_fresh(&mut working_set).await?;
        let reconciled =
            consistency::reconcile_series(self.store.as_ref(), &mut working_set, series_id).await;
        self.guard(&mut working_set, reconciled)
    }

    /// Detach every orphaned or inconsistent series member in the store.
    pub async fn repair(&self) -> Result<Vec<ShiftId>, EngineError> {
        let mut working_set = self.working_set.lock().await;
        self.ensure_fresh(&mut working_set).await?;
        let repaired = consistency::repair_all(self.store.as_ref(), &mut working_set).await;
        self.guard(&mut working_set, repaired)
    }

    /// Mark the working set stale; the next call reloads it.
    pub async fn invalidate(&self) {
        self.working_set.lock().await.invalidate();
    }

    /// Re-run the last window load, if there was one.
    pub async fn reload(&self) -> Result<Vec<Shift>, EngineError> {
        let mut working_set = self.working_set.lock().await;
        match working_set.range() {
            Some(range) => self.load(&mut working_set, range).await,
            None => {
                working_set.clear();
                Ok(Vec::new())
            }
        }
    }

    /// Snapshot of the working set content.
    pub async fn working_set(&self) -> WorkingSet {
        self.working_set.lock().await.clone()
    }

    async fn load(
        &self,
        working_set: &mut WorkingSet,
        range: DateRange,
    ) -> Result<Vec<Shift>, EngineError> {
        let fetched = cache::fetch_window(self.store.as_ref(), range).await;
        let shifts = self.guard(working_set, fetched)?;
        working_set.replace(range, shifts.iter().cloned());
        Ok(shifts)
    }

    async fn ensure_fresh(&self, working_set: &mut WorkingSet) -> Result<(), EngineError> {
        if !working_set.is_stale() {
            return Ok(());
        }
        match working_set.range() {
            Some(range) => {
                tracing::debug!(from = %range.from, to = %range.to, "reloading stale working set");
                self.load(working_set, range).await?;
            }
            None => working_set.clear(),
        }
        Ok(())
    }

    /// Working set first, then a forced store lookup.
    async fn find_target(&self, working_set: &WorkingSet, id: &str) -> Result<Shift, EngineError> {
        if let Some(shift) = working_set.get(id) {
            return Ok(shift.clone());
        }
        tracing::debug!(shift_id = %id, "target not cached; fetching from store");
        self.store
            .get_shift(id)
            .await?
            .ok_or_else(|| EngineError::NotFound(id.to_string()))
    }

    /// Stored members of the target's series, when the scope needs them.
    async fn series_members_for(
        &self,
        target: &Shift,
        scope: EditScope,
    ) -> Result<Vec<Shift>, EngineError> {
        match (&target.series_id, scope) {
            (Some(series_id), EditScope::Series) => {
                Ok(self.store.get_shifts_by_series(series_id).await?)
            }
            _ => Ok(Vec::new()),
        }
    }

    /// Run a plan's operations in order, then reconcile.
    async fn execute(
        &self,
        working_set: &mut WorkingSet,
        plan: MutationPlan,
    ) -> Result<MutationOutcome, EngineError> {
        let mut outcome = MutationOutcome {
            bound_reached: plan.bound_reached,
            ..MutationOutcome::default()
        };
        tracing::debug!(
            ops = plan.ops.len(),
            creates = plan.creates(),
            deletes = plan.deletes(),
            reconcile = ?plan.reconcile,
            "executing mutation plan"
        );
        if plan.bound_reached {
            tracing::warn!(
                creates = plan.creates(),
                "occurrence cap reached; series truncated"
            );
        }

        for op in plan.ops {
            let applied = self.apply_op(working_set, op, &mut outcome).await;
            self.guard(working_set, applied)?;
        }

        if let Some(series_id) = plan.reconcile {
            let reconciled =
                consistency::reconcile_series(self.store.as_ref(), working_set, &series_id).await;
            outcome.reconciliation = Some(self.guard(working_set, reconciled)?);
        }
        Ok(outcome)
    }

    async fn apply_op(
        &self,
        working_set: &mut WorkingSet,
        op: PlannedOp,
        outcome: &mut MutationOutcome,
    ) -> Result<(), StoreError> {
        match op {
            PlannedOp::Create(draft) => {
                let id = self.store.create_shift(draft.clone()).await?;
                tracing::debug!(shift_id = %id, start = %draft.start_date, "shift created");
                working_set.upsert(draft.into_shift(id.clone()));
                outcome.created.push(id);
            }
            PlannedOp::Update { id, changes } => {
                self.store.update_shift(&id, &changes).await?;
                tracing::debug!(shift_id = %id, "shift updated");
                if !working_set.apply(&id, &changes) {
                    if let Some(shift) = self.store.get_shift(&id).await? {
                        working_set.upsert(shift);
                    }
                }
                outcome.updated.push(id);
            }
            PlannedOp::Delete(id) => {
                let existed = self.store.delete_shift(&id).await?;
                working_set.remove(&id);
                if existed {
                    tracing::debug!(shift_id = %id, "shift deleted");
                    outcome.deleted.push(id);
                } else {
                    tracing::debug!(shift_id = %id, "shift already absent");
                }
            }
        }
        Ok(())
    }

    /// Pass a store result through, invalidating the working set on failure.
    fn guard<T>(
        &self,
        working_set: &mut WorkingSet,
        result: Result<T, StoreError>,
    ) -> Result<T, EngineError> {
        result.map_err(|err| {
            tracing::error!(error = %err, "store failure; working set invalidated");
            working_set.invalidate();
            EngineError::Store(err)
        })
    }
}
