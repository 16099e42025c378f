//! Entry point for one request-files invocation.
//!
//! Validates the incoming event, filters the requested keys down to objects
//! that exist in the archive bucket, and hands the granule to the
//! orchestrator.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::RuntimeConfig;
use crate::errors::{AppError, Result};
use crate::granule::{FileKey, Granule, RecoverFile};
use crate::restore::{ColdStorageProbe, GranuleRestoreOrchestrator, RestoreInvoker, RestoreSettings};
use crate::status::{QueueTransport, StatusEventPublisher};

#[derive(Debug, Clone, Deserialize)]
pub struct TaskEvent {
    #[serde(default)]
    pub config: TaskConfig,
    pub input: TaskInput,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskConfig {
    #[serde(rename = "glacier-bucket", alias = "cold_storage_bucket", default)]
    pub cold_storage_bucket: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TaskInput {
    #[serde(default)]
    pub granules: Vec<Granule>,
    #[serde(default)]
    pub job_id: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TaskOutput {
    pub granules: Vec<Granule>,
    pub job_id: String,
}

impl TaskOutput {
    /// Output for a run where some files were never accepted, so operators
    /// still see every per-file result.
    pub fn from_partial_failure(err: &AppError) -> Option<Self> {
        err.partial_result().map(|(job_id, granule)| Self {
            granules: vec![granule.clone()],
            job_id: job_id.to_string(),
        })
    }
}

pub fn parse_event(raw: &str) -> Result<TaskEvent> {
    Ok(serde_json::from_str(raw)?)
}

pub fn load_event_from_path(path: &Path) -> Result<TaskEvent> {
    let raw = fs::read_to_string(path)?;
    parse_event(&raw)
}

pub struct RequestFilesTask<'a, P, R, Q> {
    probe: &'a P,
    invoker: &'a R,
    publisher: &'a StatusEventPublisher<Q>,
    config: &'a RuntimeConfig,
}

impl<'a, P, R, Q> RequestFilesTask<'a, P, R, Q>
where
    P: ColdStorageProbe,
    R: RestoreInvoker,
    Q: QueueTransport,
{
    pub fn new(
        probe: &'a P,
        invoker: &'a R,
        publisher: &'a StatusEventPublisher<Q>,
        config: &'a RuntimeConfig,
    ) -> Self {
        Self {
            probe,
            invoker,
            publisher,
            config,
        }
    }

    pub async fn run(&self, event: TaskEvent) -> Result<TaskOutput> {
        let bucket = event
            .config
            .cold_storage_bucket
            .filter(|b| !b.trim().is_empty())
            .ok_or_else(|| {
                AppError::Config("request does not contain a config value for glacier-bucket".to_string())
            })?;

        let mut granules = event.input.granules;
        if granules.len() != 1 {
            return Err(AppError::Config(format!(
                "request_files can only accept 1 granule in the list. This input contains {}",
                granules.len()
            )));
        }
        let mut granule = granules.remove(0);

        let job_id = event
            .input
            .job_id
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        granule.recover_files = self.collect_recoverable_files(&bucket, &granule.keys).await?;

        let settings = RestoreSettings {
            cold_storage_bucket: bucket,
            restore_expire_days: self.config.restore_expire_days,
            retrieval_tier: self.config.retrieval_tier,
            retry: self.config.restore_retry,
        };
        let orchestrator = GranuleRestoreOrchestrator::new(self.invoker, self.publisher, &settings);
        let granule = orchestrator.process_granule(granule, &job_id).await?;

        Ok(TaskOutput {
            granules: vec![granule],
            job_id,
        })
    }

    /// Keys confirmed present in the archive. A probe error aborts the run.
    async fn collect_recoverable_files(&self, bucket: &str, keys: &[FileKey]) -> Result<Vec<RecoverFile>> {
        let mut files = Vec::with_capacity(keys.len());
        for file_key in keys {
            if self.probe.exists(bucket, &file_key.key).await? {
                info!("Added {} to the list of files we'll attempt to recover.", file_key.key);
                files.push(RecoverFile::new(file_key));
            } else {
                warn!(bucket, key = %file_key.key, "Object not found in archive, skipping");
            }
        }
        Ok(files)
    }
}
