use crate::clock::{Clock, SystemClock};
use crate::error::AppError;
use crate::model::{ServiceType, Snapshot, Task};
use crate::storage::{JsonFileBackend, SnapshotBackend};
use std::path::PathBuf;
use time::format_description::well_known::Rfc3339;
use uuid::Uuid;

/// Owns the pending and completed collections.
///
/// Every mutation is applied to a copy of the snapshot, written through the
/// backend, and only then committed in memory. A failed write leaves the
/// store exactly as it was.
///
/// Operations that name an id which is not in the expected collection are
/// no-ops and return `Ok(None)`.
pub struct TaskStore {
    snapshot: Snapshot,
    backend: Box<dyn SnapshotBackend>,
    clock: Box<dyn Clock>,
}

impl TaskStore {
    /// Loads the stored snapshot, or starts empty when nothing is stored.
    pub fn open(
        backend: Box<dyn SnapshotBackend>,
        clock: Box<dyn Clock>,
    ) -> Result<Self, AppError> {
        let snapshot = backend.load()?.unwrap_or_default();
        Ok(Self {
            snapshot,
            backend,
            clock,
        })
    }

    pub fn open_file<P: Into<PathBuf>>(path: P) -> Result<Self, AppError> {
        Self::open(
            Box::new(JsonFileBackend::new(path)),
            Box::new(SystemClock),
        )
    }

    pub fn create(
        &mut self,
        name: &str,
        service_type: ServiceType,
        description: &str,
    ) -> Result<Task, AppError> {
        let trimmed_name = name.trim();
        let trimmed_description = description.trim();

        if !service_type.is_listed() {
            return Err(AppError::invalid_input(format!(
                "unknown service type: {service_type}"
            )));
        }
        if service_type.requires_description() && trimmed_description.is_empty() {
            return Err(AppError::invalid_input(format!(
                "description is required for {service_type} service"
            )));
        }
        if trimmed_name.is_empty() {
            return Err(AppError::invalid_input("name is required"));
        }

        let description = if service_type.requires_description() {
            trimmed_description.to_string()
        } else {
            String::new()
        };

        let task = Task {
            id: self.fresh_id(),
            name: trimmed_name.to_string(),
            service_type,
            description,
            remarks: String::new(),
            created_time: self.timestamp()?,
            completed_time: None,
        };

        let mut next = self.snapshot.clone();
        next.pending.push(task.clone());
        self.commit(next)?;

        tracing::info!(id = %task.id, service_type = %task.service_type, "created task");
        Ok(task)
    }

    /// Moves a pending task to completed and stamps its completion time.
    pub fn complete(&mut self, id: &str) -> Result<Option<Task>, AppError> {
        let Some(index) = self.pending_index(id) else {
            tracing::debug!(id = id.trim(), "complete skipped, no pending task");
            return Ok(None);
        };

        let completed_time = self.timestamp()?;
        let mut next = self.snapshot.clone();
        let mut task = next.pending.remove(index);
        task.completed_time = Some(completed_time);
        next.completed.push(task.clone());
        self.commit(next)?;

        tracing::info!(id = %task.id, "completed task");
        Ok(Some(task))
    }

    /// Replaces the remarks of a pending task. Completed tasks are frozen.
    pub fn update_remarks(&mut self, id: &str, text: &str) -> Result<Option<Task>, AppError> {
        let Some(index) = self.pending_index(id) else {
            tracing::debug!(id = id.trim(), "remarks skipped, no pending task");
            return Ok(None);
        };

        let mut next = self.snapshot.clone();
        next.pending[index].remarks = text.trim().to_string();
        let task = next.pending[index].clone();
        self.commit(next)?;

        tracing::info!(id = %task.id, "updated remarks");
        Ok(Some(task))
    }

    /// Deletes the first task with `id`, looking in pending before completed.
    pub fn remove(&mut self, id: &str) -> Result<Option<Task>, AppError> {
        let trimmed_id = id.trim();
        let mut next = self.snapshot.clone();

        let removed = if let Some(index) = position(&next.pending, trimmed_id) {
            next.pending.remove(index)
        } else if let Some(index) = position(&next.completed, trimmed_id) {
            next.completed.remove(index)
        } else {
            tracing::debug!(id = trimmed_id, "remove skipped, no such task");
            return Ok(None);
        };
        self.commit(next)?;

        tracing::info!(id = %removed.id, "removed task");
        Ok(Some(removed))
    }

    pub fn get(&self, id: &str) -> Result<&Task, AppError> {
        let trimmed_id = id.trim();
        self.snapshot
            .find(trimmed_id)
            .ok_or_else(|| AppError::not_found(format!("task {trimmed_id} not found")))
    }

    /// The whole state, in storage order, as a JSON document.
    pub fn export_snapshot(&self) -> Result<String, AppError> {
        self.snapshot.to_document()
    }

    /// Replaces the whole state with an exported document.
    ///
    /// The current state is untouched unless the document parses, has both
    /// collections, and is persisted.
    pub fn import_snapshot(&mut self, document: &str) -> Result<(), AppError> {
        let next = Snapshot::from_document(document)?;
        let (pending, completed) = (next.pending.len(), next.completed.len());
        self.commit(next)?;

        tracing::info!(pending, completed, "imported snapshot");
        Ok(())
    }

    /// Pending tasks, oldest first.
    pub fn pending(&self) -> Vec<&Task> {
        self.snapshot.pending_sorted()
    }

    /// Completed tasks, most recently completed first.
    pub fn completed(&self) -> Vec<&Task> {
        self.snapshot.completed_sorted()
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    pub fn len(&self) -> usize {
        self.snapshot.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshot.is_empty()
    }

    fn commit(&mut self, next: Snapshot) -> Result<(), AppError> {
        if let Err(err) = self.backend.save(&next) {
            tracing::warn!(error = %err, "snapshot not persisted");
            return Err(err);
        }
        self.snapshot = next;
        Ok(())
    }

    fn pending_index(&self, id: &str) -> Option<usize> {
        position(&self.snapshot.pending, id.trim())
    }

    fn timestamp(&self) -> Result<String, AppError> {
        self.clock
            .now()
            .format(&Rfc3339)
            .map_err(|err| AppError::invalid_data(err.to_string()))
    }

    // Imported documents may carry arbitrary ids, so a fresh one is checked
    // against both collections.
    fn fresh_id(&self) -> String {
        loop {
            let id = Uuid::new_v4().to_string();
            if self.snapshot.find(&id).is_none() {
                return id;
            }
        }
    }
}

fn position(tasks: &[Task], id: &str) -> Option<usize> {
    tasks.iter().position(|task| task.id == id)
}
