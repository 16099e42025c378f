// request-files/src/restore/s3_restore.rs
use async_trait::async_trait;
use aws_sdk_s3 as s3;
use s3::error::DisplayErrorContext;
use s3::types::{GlacierJobParameters, RestoreRequest, Tier};

use super::RestoreInvoker;
use crate::config::RetrievalTier;
use crate::errors::{AppError, Result};

/// Restore submitter backed by S3 `RestoreObject`.
#[derive(Clone)]
pub struct S3RestoreInvoker {
    client: s3::Client,
}

impl S3RestoreInvoker {
    pub fn new(client: s3::Client) -> Self {
        Self { client }
    }
}

impl From<RetrievalTier> for Tier {
    fn from(tier: RetrievalTier) -> Self {
        match tier {
            RetrievalTier::Standard => Tier::Standard,
            RetrievalTier::Bulk => Tier::Bulk,
            RetrievalTier::Expedited => Tier::Expedited,
        }
    }
}

/// `{Days, GlacierJobParameters: {Tier}}`
fn restore_request(retention_days: i32, tier: RetrievalTier) -> Result<RestoreRequest> {
    let job_parameters = GlacierJobParameters::builder()
        .tier(Tier::from(tier))
        .build()
        .map_err(|e| AppError::Config(format!("Invalid glacier job parameters: {}", e)))?;
    Ok(RestoreRequest::builder()
        .days(retention_days)
        .glacier_job_parameters(job_parameters)
        .build())
}

#[async_trait]
impl RestoreInvoker for S3RestoreInvoker {
    async fn restore(
        &self,
        bucket: &str,
        key: &str,
        retention_days: i32,
        tier: RetrievalTier,
    ) -> Result<()> {
        let request = restore_request(retention_days, tier)?;
        // NoSuchBucket, NoSuchKey or InvalidObjectState (object not in an archive class) all land here.
        self.client
            .restore_object()
            .bucket(bucket)
            .key(key)
            .restore_request(request)
            .send()
            .await
            .map_err(|err| AppError::Restore {
                bucket: bucket.to_string(),
                key: key.to_string(),
                message: DisplayErrorContext(&err).to_string(),
            })?;
        Ok(())
    }
}
