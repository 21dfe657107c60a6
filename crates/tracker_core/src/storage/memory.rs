use crate::error::AppError;
use crate::model::Snapshot;
use crate::storage::SnapshotBackend;
use std::cell::RefCell;
use std::rc::Rc;

#[derive(Debug, Default)]
struct Slot {
    stored: Option<Snapshot>,
    fail_writes: bool,
    writes: usize,
}

/// Keeps the snapshot in process memory.
///
/// Clones share the same slot, so a caller can keep a handle after moving a
/// clone into a store and inspect what was written.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    slot: Rc<RefCell<Slot>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_snapshot(snapshot: Snapshot) -> Self {
        let backend = Self::new();
        backend.slot.borrow_mut().stored = Some(snapshot);
        backend
    }

    /// Makes every following `save` fail with an I/O error.
    pub fn fail_writes(&self, fail: bool) {
        self.slot.borrow_mut().fail_writes = fail;
    }

    pub fn stored(&self) -> Option<Snapshot> {
        self.slot.borrow().stored.clone()
    }

    pub fn writes(&self) -> usize {
        self.slot.borrow().writes
    }
}

impl SnapshotBackend for MemoryBackend {
    fn load(&self) -> Result<Option<Snapshot>, AppError> {
        Ok(self.slot.borrow().stored.clone())
    }

    fn save(&mut self, snapshot: &Snapshot) -> Result<(), AppError> {
        let mut slot = self.slot.borrow_mut();
        if slot.fail_writes {
            return Err(AppError::io("storage unavailable"));
        }
        slot.stored = Some(snapshot.clone());
        slot.writes += 1;
        Ok(())
    }
}
