pub mod clock;
pub mod config;
pub mod error;
pub mod model;
pub mod storage;
pub mod store;

pub use error::AppError;
pub use model::{ServiceType, Snapshot, Task};
pub use store::TaskStore;
