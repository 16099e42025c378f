// request-files/src/status/sqs_queue.rs
use anyhow::{Context, Result};
use async_trait::async_trait;
use aws_sdk_sqs as sqs;
use sqs::error::DisplayErrorContext;
use sqs::types::MessageAttributeValue;

use super::publisher::{QueueMessage, QueueTransport};

const ATTRIBUTE_REQUEST_METHOD: &str = "RequestMethod";
const ATTRIBUTE_TABLE_NAME: &str = "TableName";

/// FIFO queue feeding the recovery database.
pub struct SqsQueue {
    client: sqs::Client,
    queue_url: String,
}

impl SqsQueue {
    pub fn new(client: sqs::Client, queue_url: impl Into<String>) -> Self {
        Self {
            client,
            queue_url: queue_url.into(),
        }
    }
}

fn string_attribute(value: &str) -> Result<MessageAttributeValue> {
    MessageAttributeValue::builder()
        .data_type("String")
        .string_value(value)
        .build()
        .with_context(|| format!("Failed to build message attribute for '{}'", value))
}

#[async_trait]
impl QueueTransport for SqsQueue {
    async fn send(&self, message: &QueueMessage) -> Result<()> {
        self.client
            .send_message()
            .queue_url(&self.queue_url)
            .message_body(&message.body)
            .message_deduplication_id(&message.deduplication_id)
            .message_group_id(&message.group_id)
            .message_attributes(ATTRIBUTE_REQUEST_METHOD, string_attribute(message.method.as_str())?)
            .message_attributes(ATTRIBUTE_TABLE_NAME, string_attribute(message.table.as_str())?)
            .send()
            .await
            .map_err(|e| anyhow::anyhow!("{}", DisplayErrorContext(&e)))
            .with_context(|| {
                format!(
                    "Failed to send {} message to queue {}",
                    message.table, self.queue_url
                )
            })?;
        Ok(())
    }
}
