//! Series reconciliation against the store.

use roster_core::consistency::{decide, orphaned, ReconcileAction, Reconciliation};
use roster_core::store::{ShiftStore, StoreError, WorkingSet};
use roster_core::types::{ShiftChanges, ShiftId};

/// Re-evaluate one series from its stored members and detach a lone member.
///
/// The working set mirrors the stored series afterwards.
pub(crate) async fn reconcile_series(
    store: &dyn ShiftStore,
    working_set: &mut WorkingSet,
    series_id: &str,
) -> Result<Reconciliation, StoreError> {
    let members = store.get_shifts_by_series(series_id).await?;

    match decide(&members) {
        ReconcileAction::Nothing { remaining } => {
            working_set.replace_series(series_id, members);
            Ok(if remaining == 0 {
                Reconciliation::Empty
            } else {
                Reconciliation::Intact { members: remaining }
            })
        }
        ReconcileAction::Detach(id) => {
            let changes = ShiftChanges::detach();
            store.update_shift(&id, &changes).await?;
            working_set.replace_series(series_id, std::iter::empty());

            let mut shift = members
                .into_iter()
                .find(|member| member.id == id)
                .ok_or_else(|| StoreError::NotFound(id.clone()))?;
            shift.apply(&changes);
            tracing::info!(series_id = %series_id, shift_id = %id, "detached last series member");
            working_set.upsert(shift.clone());
            Ok(Reconciliation::Detached { shift })
        }
    }
}

/// Detach every orphaned or inconsistent series member in the store.
pub(crate) async fn repair_all(
    store: &dyn ShiftStore,
    working_set: &mut WorkingSet,
) -> Result<Vec<ShiftId>, StoreError> {
    let shifts = store.get_all_shifts().await?;
    let detach = orphaned(&shifts);

    let changes = ShiftChanges::detach();
    for id in &detach {
        store.update_shift(id, &changes).await?;
        working_set.apply(id, &changes);
        tracing::info!(shift_id = %id, "repair detached shift");
    }
    tracing::info!(
        scanned = shifts.len(),
        detached = detach.len(),
        "repair sweep finished"
    );
    Ok(detach)
}
