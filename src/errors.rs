use thiserror::Error;

use crate::granule::Granule;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serde JSON error: {0}")]
    SerdeJson(#[from] serde_json::Error),

    /// The probe could not tell whether the object exists.
    #[error("Storage error checking s3://{bucket}/{key}: {message}")]
    Storage {
        bucket: String,
        key: String,
        message: String,
    },

    /// A single restore submission was rejected by the backend.
    #[error("Restore request for s3://{bucket}/{key} rejected: {message}")]
    Restore {
        bucket: String,
        key: String,
        message: String,
    },

    #[error("Failed to deliver {table} status event after {attempts} attempt(s): {message}")]
    QueueDelivery {
        table: String,
        attempts: u32,
        message: String,
    },

    #[error("Invalid status event: {0}")]
    InvalidEvent(String),

    /// One or more files never had a restore accepted. Carries every per-file result.
    #[error(
        "One or more files failed to be requested for granule {granule_id} (job {job_id})",
        granule_id = .granule.granule_id
    )]
    RestoreRequest { job_id: String, granule: Box<Granule> },
}

impl AppError {
    /// Job id and per-file results when the run completed but some files were
    /// never accepted for restore.
    pub fn partial_result(&self) -> Option<(&str, &Granule)> {
        match self {
            AppError::RestoreRequest { job_id, granule } => Some((job_id.as_str(), granule.as_ref())),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
