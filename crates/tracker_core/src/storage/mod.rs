use crate::error::AppError;
use crate::model::Snapshot;

pub mod json_store;
pub mod memory;

pub use json_store::JsonFileBackend;
pub use memory::MemoryBackend;

/// Durable home of the task snapshot.
///
/// `save` must not return `Ok` until the snapshot would survive a crash.
pub trait SnapshotBackend {
    /// `None` when nothing has been stored yet.
    fn load(&self) -> Result<Option<Snapshot>, AppError>;

    fn save(&mut self, snapshot: &Snapshot) -> Result<(), AppError>;
}
