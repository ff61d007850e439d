use crate::job::JobStatus;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum JobError {
    #[error("Job not found: {0}")]
    NotFound(String),
    #[error("Job already exists: {0}")]
    DuplicateJob(String),
    #[error("Invalid transition for job {job_id}: {from} -> {to}")]
    InvalidJobTransition {
        job_id: String,
        from: JobStatus,
        to: JobStatus,
    },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
