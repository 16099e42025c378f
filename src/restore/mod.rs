pub(crate) mod logic; // Per-granule retry loop and status emission
pub(crate) mod s3_probe; // HeadObject existence check
pub(crate) mod s3_restore; // RestoreObject submission

use async_trait::async_trait;

use crate::config::RetrievalTier;
use crate::errors::Result;

pub use logic::{GranuleRestoreOrchestrator, RestoreSettings};
pub use s3_probe::S3ObjectProbe;
pub use s3_restore::S3RestoreInvoker;

/// Answers whether an archived object is present.
#[async_trait]
pub trait ColdStorageProbe: Send + Sync {
    /// `Ok(false)` only for a confirmed not-found. Anything indeterminate is an error.
    async fn exists(&self, bucket: &str, key: &str) -> Result<bool>;
}

/// Submits a single restore request. Retrying is the caller's job.
#[async_trait]
pub trait RestoreInvoker: Send + Sync {
    async fn restore(
        &self,
        bucket: &str,
        key: &str,
        retention_days: i32,
        tier: RetrievalTier,
    ) -> Result<()>;
}
