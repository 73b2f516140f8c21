//! Scheduler errors
//!
//! Failures of individual jobs are not errors: they are recorded on the job
//! (`status`, `ok`, `error`) and reported through the aggregate status.
//! These variants cover misuse of the scheduler itself.

use scalemgmt_core::dto::queue::QueueStatus;
use thiserror::Error;
use uuid::Uuid;

/// Result type alias for scheduler operations
pub type Result<T> = std::result::Result<T, SchedulerError>;

#[derive(Debug, Error)]
pub enum SchedulerError {
    /// A job was registered with a dependency that is not in the queue
    #[error("Required job {0} is not registered with this scheduler")]
    UnknownDependency(Uuid),

    /// The run loop hit its tick limit before every job was terminal
    #[error("Queue still {} after {ticks} tick(s): {} awaiting submission, {} running", .status.label, .status.new_count, .status.running_count)]
    TickLimitExceeded {
        ticks: u64,
        status: Box<QueueStatus>,
    },
}
