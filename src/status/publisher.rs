// request-files/src/status/publisher.rs
use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, error, warn};

use super::{FileStatusEvent, JobStatusEvent, RequestMethod, TableName};
use crate::config::DeliveryPolicy;
use crate::errors::{AppError, Result};

/// Every status event from this task shares one ordering group.
pub const MESSAGE_GROUP_ID: &str = "request_files";

/// A fully built queue message, ready to hand to a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueMessage {
    pub table: TableName,
    pub method: RequestMethod,
    pub body: String,
    pub deduplication_id: String,
    pub group_id: String,
}

impl QueueMessage {
    pub fn build<T: Serialize + ?Sized>(table: TableName, payload: &T, method: RequestMethod) -> Result<Self> {
        let body = serde_json::to_string(payload)?;
        Ok(Self {
            table,
            method,
            deduplication_id: deduplication_id(table, method, &body),
            body,
            group_id: MESSAGE_GROUP_ID.to_string(),
        })
    }
}

/// `table ‖ method ‖ body`. Identical payloads collapse, any field change yields a new id.
///
/// Not truncated: SQS FIFO queues reject deduplication ids over 128 characters,
/// which most real bodies exceed.
pub fn deduplication_id(table: TableName, method: RequestMethod, body: &str) -> String {
    format!("{}{}{}", table.as_str(), method.as_str(), body)
}

/// Sends one message to the queue. Implementations make exactly one attempt.
#[async_trait]
pub trait QueueTransport: Send + Sync {
    async fn send(&self, message: &QueueMessage) -> anyhow::Result<()>;
}

/// Builds status messages and delivers them with a bounded retry.
pub struct StatusEventPublisher<Q> {
    transport: Q,
    policy: DeliveryPolicy,
}

impl<Q: QueueTransport> StatusEventPublisher<Q> {
    pub fn new(transport: Q, policy: DeliveryPolicy) -> Self {
        Self { transport, policy }
    }

    #[cfg(test)]
    pub fn transport(&self) -> &Q {
        &self.transport
    }

    /// Serializes `payload` and delivers it, retrying up to the policy's attempt budget.
    pub async fn publish<T: Serialize + Sync + ?Sized>(
        &self,
        table: TableName,
        payload: &T,
        method: RequestMethod,
    ) -> Result<()> {
        let message = QueueMessage::build(table, payload, method)?;
        let mut attempt = 1;
        loop {
            match self.transport.send(&message).await {
                Ok(()) => {
                    debug!(table = %table, method = %method, attempt, "Posted status event to queue");
                    return Ok(());
                }
                Err(err) if attempt < self.policy.max_attempts => {
                    warn!(
                        table = %table,
                        attempt,
                        max_attempts = self.policy.max_attempts,
                        "Queue delivery failed, retrying: {:#}",
                        err
                    );
                    tokio::time::sleep(self.policy.retry_sleep).await;
                    attempt += 1;
                }
                Err(err) => {
                    error!(
                        table = %table,
                        attempts = attempt,
                        "Error while logging row {} to table {}: {:#}",
                        message.body,
                        table,
                        err
                    );
                    return Err(AppError::QueueDelivery {
                        table: table.to_string(),
                        attempts: attempt,
                        message: format!("{:#}", err),
                    });
                }
            }
        }
    }

    pub async fn post_job_status(&self, event: &JobStatusEvent) -> Result<()> {
        self.publish(TableName::RecoveryJob, event, RequestMethod::NewJob).await
    }

    pub async fn post_file_status(&self, event: &FileStatusEvent) -> Result<()> {
        self.publish(TableName::RecoverFile, event, RequestMethod::UpdateFile).await
    }
}
