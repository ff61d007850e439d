//! Job lifecycle tracking for long-running capability executions.

pub mod error;
pub mod events;
pub mod job;
pub mod manager;

pub use error::JobError;
pub use events::{handler_fn, FnHandler, HandlerError, JobEventHandler, SubscriptionId};
pub use job::{Job, JobEvent, JobEventKind, JobStatus};
pub use manager::JobManager;
