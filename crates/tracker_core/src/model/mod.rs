mod service_type;
mod snapshot;
mod task;

pub use service_type::ServiceType;
pub use snapshot::Snapshot;
pub use task::Task;
