// request-files/src/restore/logic.rs
use chrono::Utc;
use tracing::{error, info, warn};

use super::RestoreInvoker;
use crate::config::{RetrievalTier, RetryPolicy};
use crate::errors::{AppError, Result};
use crate::granule::Granule;
use crate::status::{FileStatusEvent, Job, JobStatusEvent, QueueTransport, StatusEventPublisher};

/// Reported for a file that never succeeded and never recorded an error.
pub const UNKNOWN_RESTORE_ERROR: &str = "Unknown error occurred while requesting restore.";

/// Parameters shared by every restore request in one run.
#[derive(Debug, Clone)]
pub struct RestoreSettings {
    pub cold_storage_bucket: String,
    pub restore_expire_days: i32,
    pub retrieval_tier: RetrievalTier,
    pub retry: RetryPolicy,
}

/// Drives restore requests for one granule and reports every status change.
pub struct GranuleRestoreOrchestrator<'a, R, Q> {
    invoker: &'a R,
    publisher: &'a StatusEventPublisher<Q>,
    settings: &'a RestoreSettings,
}

impl<'a, R: RestoreInvoker, Q: QueueTransport> GranuleRestoreOrchestrator<'a, R, Q> {
    pub fn new(invoker: &'a R, publisher: &'a StatusEventPublisher<Q>, settings: &'a RestoreSettings) -> Self {
        Self {
            invoker,
            publisher,
            settings,
        }
    }

    /// Requests a restore for every file in `granule.recover_files`.
    ///
    /// Files that fail are retried together once per pass, sleeping between
    /// passes, until they succeed or the attempt budget runs out. Returns the
    /// updated granule, or `AppError::RestoreRequest` carrying it when any file
    /// was never accepted.
    pub async fn process_granule(&self, mut granule: Granule, job_id: &str) -> Result<Granule> {
        let job = Job {
            job_id: job_id.to_string(),
            granule_id: granule.granule_id.clone(),
            request_time: Utc::now(),
            archive_destination: self.settings.cold_storage_bucket.clone(),
        };

        self.publisher
            .post_job_status(&JobStatusEvent::started(&job))
            .await?;

        let total_attempts = self.settings.retry.total_attempts();
        let mut attempt = 1;
        while attempt <= total_attempts {
            self.request_pass(&job, &mut granule, attempt).await?;

            attempt += 1;
            if attempt <= total_attempts {
                if granule.all_succeeded() {
                    break;
                }
                tokio::time::sleep(self.settings.retry.retry_sleep).await;
            }
        }

        self.report_failures(&job, &granule).await?;

        if !granule.all_succeeded() {
            error!(
                job_id = %job.job_id,
                granule_id = %granule.granule_id,
                failed = granule.failed_files().count(),
                "One or more files failed to be requested from {}",
                self.settings.cold_storage_bucket
            );
            return Err(AppError::RestoreRequest {
                job_id: job.job_id,
                granule: Box::new(granule),
            });
        }

        Ok(granule)
    }

    /// One attempt for every file that has not succeeded yet.
    async fn request_pass(&self, job: &Job, granule: &mut Granule, attempt: u32) -> Result<()> {
        let bucket = &self.settings.cold_storage_bucket;
        for file in granule.recover_files.iter_mut().filter(|f| !f.success) {
            let outcome = self
                .invoker
                .restore(
                    bucket,
                    &file.key,
                    self.settings.restore_expire_days,
                    self.settings.retrieval_tier,
                )
                .await;

            match outcome {
                Ok(()) => {
                    file.mark_accepted();
                    info!(
                        job_id = %job.job_id,
                        attempt,
                        "Restore {} from {} attempt {} successful.",
                        file.key,
                        bucket,
                        attempt
                    );
                    self.publisher
                        .post_file_status(&FileStatusEvent::pending(job, file, Utc::now()))
                        .await?;
                }
                Err(AppError::Restore { message, .. }) => {
                    warn!(
                        job_id = %job.job_id,
                        attempt,
                        key = %file.key,
                        "Restore request failed: {}",
                        message
                    );
                    file.record_failure(message);
                }
                Err(other) => return Err(other),
            }
        }
        Ok(())
    }

    /// Emits exactly one FAILED event per file that never succeeded.
    ///
    /// Every failed file gets its delivery attempt; the first delivery error is returned afterwards.
    async fn report_failures(&self, job: &Job, granule: &Granule) -> Result<()> {
        let mut first_delivery_error = None;
        for file in granule.failed_files() {
            let message = if file.error_message.is_empty() {
                UNKNOWN_RESTORE_ERROR
            } else {
                file.error_message.as_str()
            };
            let event = FileStatusEvent::failed(job, file, message, Utc::now())?;
            if let Err(err) = self.publisher.post_file_status(&event).await {
                first_delivery_error.get_or_insert(err);
            }
        }
        match first_delivery_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}
