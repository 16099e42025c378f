//! Status events emitted to the recovery database queue.
//!
//! The numeric status codes and the table/method names are fixed by the
//! consumer that drains the queue.

pub(crate) mod publisher;
pub(crate) mod sqs_queue;

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};

use crate::errors::{AppError, Result};
use crate::granule::RecoverFile;

pub use publisher::{QueueTransport, StatusEventPublisher};

/// Status values shared with the recovery database.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrcaStatus {
    Pending = 1,
    // Staged and Success are written by the downstream copy/ingest steps.
    #[allow(dead_code)]
    Staged = 2,
    Failed = 3,
    #[allow(dead_code)]
    Success = 4,
}

impl OrcaStatus {
    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, OrcaStatus::Failed | OrcaStatus::Success)
    }
}

impl Serialize for OrcaStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.code())
    }
}

/// Action the consumer takes for a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestMethod {
    NewJob,
    UpdateFile,
}

impl RequestMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestMethod::NewJob => "new_job",
            RequestMethod::UpdateFile => "update_file",
        }
    }
}

impl fmt::Display for RequestMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Destination table for a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableName {
    RecoveryJob,
    RecoverFile,
}

impl TableName {
    pub fn as_str(&self) -> &'static str {
        match self {
            TableName::RecoveryJob => "orca_recoveryjob",
            TableName::RecoverFile => "orca_recoverfile",
        }
    }
}

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One restore session for one granule.
#[derive(Debug, Clone, PartialEq)]
pub struct Job {
    pub job_id: String,
    pub granule_id: String,
    pub request_time: DateTime<Utc>,
    pub archive_destination: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobStatusEvent {
    job_id: String,
    granule_id: String,
    status_id: OrcaStatus,
    request_time: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    completion_time: Option<DateTime<Utc>>,
    archive_destination: String,
}

impl JobStatusEvent {
    /// The "job started" record.
    pub fn started(job: &Job) -> Self {
        Self {
            job_id: job.job_id.clone(),
            granule_id: job.granule_id.clone(),
            status_id: OrcaStatus::Pending,
            request_time: job.request_time,
            completion_time: None,
            archive_destination: job.archive_destination.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileStatusEvent {
    job_id: String,
    granule_id: String,
    filename: String,
    key_path: String,
    restore_destination: String,
    status_id: OrcaStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    error_message: Option<String>,
    request_time: DateTime<Utc>,
    last_update: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    completion_time: Option<DateTime<Utc>>,
}

impl FileStatusEvent {
    /// Builds a file event. Terminal statuses get `completion_time = now`;
    /// `Failed` requires a non-empty error message.
    pub fn new(
        job: &Job,
        file: &RecoverFile,
        status: OrcaStatus,
        error_message: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<Self> {
        let error_message = error_message.filter(|m| !m.is_empty()).map(str::to_string);
        if status == OrcaStatus::Failed && error_message.is_none() {
            return Err(AppError::InvalidEvent(format!(
                "error message is required for a failed status on {}",
                file.key
            )));
        }

        Ok(Self {
            job_id: job.job_id.clone(),
            granule_id: job.granule_id.clone(),
            filename: file.filename().to_string(),
            key_path: file.key.clone(),
            restore_destination: file.dest_bucket.clone(),
            status_id: status,
            error_message,
            request_time: job.request_time,
            last_update: now,
            completion_time: status.is_terminal().then_some(now),
        })
    }

    /// Restore request accepted; completion is reported downstream.
    pub fn pending(job: &Job, file: &RecoverFile, now: DateTime<Utc>) -> Self {
        Self {
            job_id: job.job_id.clone(),
            granule_id: job.granule_id.clone(),
            filename: file.filename().to_string(),
            key_path: file.key.clone(),
            restore_destination: file.dest_bucket.clone(),
            status_id: OrcaStatus::Pending,
            error_message: None,
            request_time: job.request_time,
            last_update: now,
            completion_time: None,
        }
    }

    pub fn failed(job: &Job, file: &RecoverFile, error_message: &str, now: DateTime<Utc>) -> Result<Self> {
        Self::new(job, file, OrcaStatus::Failed, Some(error_message), now)
    }

    #[cfg(test)]
    pub fn status(&self) -> OrcaStatus {
        self.status_id
    }

    #[cfg(test)]
    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    #[cfg(test)]
    pub fn completion_time(&self) -> Option<DateTime<Utc>> {
        self.completion_time
    }
}
