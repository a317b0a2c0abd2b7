//! ShiftStore backed by a JSON snapshot file.
//!
//! Every mutation writes the candidate snapshot through a synced temporary
//! sibling file and a rename before the in-memory records change, so a
//! failed write leaves both the file and the served records untouched.

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

use roster_core::store::{ShiftStore, StoreError};
use roster_core::types::{sort_chronologically, Shift, ShiftChanges, ShiftDraft, ShiftId};

use crate::shift_store::InMemoryShiftStore;

const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct Snapshot {
    version: u32,
    #[serde(default)]
    shifts: Vec<Shift>,
}

/// JSON file store; records are served from memory and flushed on write.
pub struct JsonFileShiftStore {
    path: PathBuf,
    inner: InMemoryShiftStore,
    write_lock: tokio::sync::Mutex<()>,
}

impl JsonFileShiftStore {
    /// Open a snapshot file, starting empty when it does not exist yet.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let shifts = match tokio::fs::read_to_string(&path).await {
            Ok(raw) => parse_snapshot(&raw)?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = %path.display(), "shift snapshot not found, starting empty");
                Vec::new()
            }
            Err(err) => return Err(StoreError::Io(format!("{}: {}", path.display(), err))),
        };
        tracing::debug!(path = %path.display(), shifts = shifts.len(), "shift snapshot loaded");

        Ok(Self {
            path,
            inner: InMemoryShiftStore::with_shifts(shifts),
            write_lock: tokio::sync::Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn flush(&self, mut shifts: Vec<Shift>) -> Result<(), StoreError> {
        sort_chronologically(&mut shifts);
        let snapshot = Snapshot {
            version: SNAPSHOT_VERSION,
            shifts,
        };
        let body = serde_json::to_vec_pretty(&snapshot)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(io_error)?;
        }
        let tmp = self.path.with_extension("json.tmp");
        let mut file = tokio::fs::File::create(&tmp).await.map_err(io_error)?;
        file.write_all(&body).await.map_err(io_error)?;
        file.sync_all().await.map_err(io_error)?;
        drop(file);
        tokio::fs::rename(&tmp, &self.path).await.map_err(io_error)?;
        tracing::debug!(
            path = %self.path.display(),
            shifts = snapshot.shifts.len(),
            "shift snapshot flushed"
        );
        Ok(())
    }
}

fn io_error(err: std::io::Error) -> StoreError {
    StoreError::Io(err.to_string())
}

fn parse_snapshot(raw: &str) -> Result<Vec<Shift>, StoreError> {
    if raw.trim().is_empty() {
        return Ok(Vec::new());
    }
    let snapshot: Snapshot =
        serde_json::from_str(raw).map_err(|e| StoreError::Serialization(e.to_string()))?;
    if snapshot.version != SNAPSHOT_VERSION {
        return Err(StoreError::Serialization(format!(
            "unsupported snapshot version {}",
            snapshot.version
        )));
    }
    Ok(snapshot.shifts)
}

#[async_trait]
impl ShiftStore for JsonFileShiftStore {
    async fn create_shift(&self, fields: ShiftDraft) -> Result<ShiftId, StoreError> {
        let _guard = self.write_lock.lock().await;
        let id = uuid::Uuid::new_v4().to_string();
        let shift = fields.into_shift(id.clone());

        let mut candidate = self.inner.snapshot()?;
        candidate.push(shift.clone());
        self.flush(candidate).await?;
        self.inner.insert(shift)?;
        Ok(id)
    }

    async fn update_shift(&self, id: &str, changes: &ShiftChanges) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut candidate = self.inner.snapshot()?;
        let shift = candidate
            .iter_mut()
            .find(|shift| shift.id == id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        shift.apply(changes);
        let updated = shift.clone();

        self.flush(candidate).await?;
        self.inner.insert(updated)
    }

    async fn delete_shift(&self, id: &str) -> Result<bool, StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut candidate = self.inner.snapshot()?;
        let before = candidate.len();
        candidate.retain(|shift| shift.id != id);
        if candidate.len() == before {
            return Ok(false);
        }

        self.flush(candidate).await?;
        self.inner.delete_shift(id).await
    }

    async fn get_shifts_by_date_range(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<Shift>, StoreError> {
        self.inner.get_shifts_by_date_range(from, to).await
    }

    async fn get_shifts_by_series(&self, series_id: &str) -> Result<Vec<Shift>, StoreError> {
        self.inner.get_shifts_by_series(series_id).await
    }

    async fn get_all_shifts(&self) -> Result<Vec<Shift>, StoreError> {
        self.inner.get_all_shifts().await
    }

    async fn get_shift(&self, id: &str) -> Result<Option<Shift>, StoreError> {
        self.inner.get_shift(id).await
    }
}
