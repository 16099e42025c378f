//! In-memory stand-ins for S3 and the queue, shared by the unit tests.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;

use crate::config::RetrievalTier;
use crate::errors::{AppError, Result};
use crate::restore::{ColdStorageProbe, RestoreInvoker};
use crate::status::QueueTransport;
use crate::status::publisher::QueueMessage;

/// Records delivered messages. Can be told to fail the first N sends, or
/// specific sends by their 1-based position.
#[derive(Default)]
pub struct RecordingQueue {
    delivered: Mutex<Vec<QueueMessage>>,
    send_calls: AtomicU32,
    failures_remaining: AtomicU32,
    failing_sends: HashSet<u32>,
}

impl RecordingQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_first(failures: u32) -> Self {
        Self {
            failures_remaining: AtomicU32::new(failures),
            ..Self::default()
        }
    }

    pub fn failing_sends(sends: &[u32]) -> Self {
        Self {
            failing_sends: sends.iter().copied().collect(),
            ..Self::default()
        }
    }

    pub fn delivered(&self) -> Vec<QueueMessage> {
        self.delivered.lock().unwrap().clone()
    }

    pub fn send_calls(&self) -> u32 {
        self.send_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl QueueTransport for RecordingQueue {
    async fn send(&self, message: &QueueMessage) -> anyhow::Result<()> {
        let call = self.send_calls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.failing_sends.contains(&call) {
            anyhow::bail!("queue unavailable");
        }
        let remaining = self.failures_remaining.load(Ordering::SeqCst);
        if remaining > 0 {
            self.failures_remaining.store(remaining - 1, Ordering::SeqCst);
            anyhow::bail!("queue unavailable");
        }
        self.delivered.lock().unwrap().push(message.clone());
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RestoreCall {
    pub bucket: String,
    pub key: String,
    pub retention_days: i32,
    pub tier: RetrievalTier,
}

/// Restore outcomes scripted per key. Keys without a script succeed.
#[derive(Default)]
pub struct ScriptedInvoker {
    scripts: Mutex<HashMap<String, VecDeque<std::result::Result<(), String>>>>,
    always_failing: HashMap<String, String>,
    calls: Mutex<Vec<RestoreCall>>,
}

impl ScriptedInvoker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Outcomes returned in order; once exhausted the key succeeds.
    pub fn script(self, key: &str, outcomes: Vec<std::result::Result<(), String>>) -> Self {
        self.scripts
            .lock()
            .unwrap()
            .insert(key.to_string(), outcomes.into());
        self
    }

    pub fn always_fail(mut self, key: &str, message: &str) -> Self {
        self.always_failing.insert(key.to_string(), message.to_string());
        self
    }

    pub fn calls(&self) -> Vec<RestoreCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_for(&self, key: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| c.key == key).count()
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl RestoreInvoker for ScriptedInvoker {
    async fn restore(
        &self,
        bucket: &str,
        key: &str,
        retention_days: i32,
        tier: RetrievalTier,
    ) -> Result<()> {
        self.calls.lock().unwrap().push(RestoreCall {
            bucket: bucket.to_string(),
            key: key.to_string(),
            retention_days,
            tier,
        });

        let outcome = match self.always_failing.get(key) {
            Some(message) => Err(message.clone()),
            None => self
                .scripts
                .lock()
                .unwrap()
                .get_mut(key)
                .and_then(|outcomes| outcomes.pop_front())
                .unwrap_or(Ok(())),
        };

        outcome.map_err(|message| AppError::Restore {
            bucket: bucket.to_string(),
            key: key.to_string(),
            message,
        })
    }
}

/// Existence answers per key. Unknown keys are absent.
#[derive(Default)]
pub struct FakeProbe {
    present: HashSet<String>,
    broken: HashMap<String, String>,
    calls: Mutex<Vec<String>>,
}

impl FakeProbe {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_object(mut self, key: &str) -> Self {
        self.present.insert(key.to_string());
        self
    }

    /// The probe cannot answer for this key.
    pub fn with_error(mut self, key: &str, message: &str) -> Self {
        self.broken.insert(key.to_string(), message.to_string());
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ColdStorageProbe for FakeProbe {
    async fn exists(&self, bucket: &str, key: &str) -> Result<bool> {
        self.calls.lock().unwrap().push(key.to_string());
        if let Some(message) = self.broken.get(key) {
            return Err(AppError::Storage {
                bucket: bucket.to_string(),
                key: key.to_string(),
                message: message.clone(),
            });
        }
        Ok(self.present.contains(key))
    }
}
