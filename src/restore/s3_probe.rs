// request-files/src/restore/s3_probe.rs
use async_trait::async_trait;
use aws_sdk_s3 as s3;
use s3::error::{DisplayErrorContext, ProvideErrorMetadata};
use tracing::{debug, error};

use super::ColdStorageProbe;
use crate::errors::{AppError, Result};

/// Existence probe backed by S3 `HeadObject`.
#[derive(Clone)]
pub struct S3ObjectProbe {
    client: s3::Client,
}

impl S3ObjectProbe {
    pub fn new(client: s3::Client) -> Self {
        Self { client }
    }
}

/// Error codes S3 uses for a missing object. HEAD responses report `NotFound`,
/// other calls report `NoSuchKey`.
fn is_not_found_code(code: Option<&str>) -> bool {
    matches!(code, Some("NotFound") | Some("NoSuchKey"))
}

#[async_trait]
impl ColdStorageProbe for S3ObjectProbe {
    async fn exists(&self, bucket: &str, key: &str) -> Result<bool> {
        match self.client.head_object().bucket(bucket).key(key).send().await {
            Ok(_) => Ok(true),
            Err(err) => {
                let not_found = err
                    .as_service_error()
                    .is_some_and(|e| e.is_not_found() || is_not_found_code(e.code()));
                if not_found {
                    debug!(bucket, key, "Object not found in archive");
                    return Ok(false);
                }
                let message = DisplayErrorContext(&err).to_string();
                error!(bucket, key, "Failed to check object existence: {}", message);
                Err(AppError::Storage {
                    bucket: bucket.to_string(),
                    key: key.to_string(),
                    message,
                })
            }
        }
    }
}
