// request-files/src/config/mod.rs
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use tracing::warn;
use url::Url;

use crate::errors::{AppError, Result};

pub const DEFAULT_RESTORE_EXPIRE_DAYS: i32 = 5;
pub const DEFAULT_MAX_REQUEST_RETRIES: u32 = 2;
pub const DEFAULT_RESTORE_RETRY_SLEEP_SECS: f64 = 0.0;

pub const ENV_RESTORE_EXPIRE_DAYS: &str = "RESTORE_EXPIRE_DAYS";
pub const ENV_RESTORE_REQUEST_RETRIES: &str = "RESTORE_REQUEST_RETRIES";
pub const ENV_RESTORE_RETRY_SLEEP_SECS: &str = "RESTORE_RETRY_SLEEP_SECS";
pub const ENV_RESTORE_RETRIEVAL_TYPE: &str = "RESTORE_RETRIEVAL_TYPE";
pub const ENV_DB_QUEUE_URL: &str = "DB_QUEUE_URL";
pub const ENV_DB_QUEUE_MAX_ATTEMPTS: &str = "DB_QUEUE_MAX_ATTEMPTS";
pub const ENV_DB_QUEUE_RETRY_SLEEP_SECS: &str = "DB_QUEUE_RETRY_SLEEP_SECS";
pub const ENV_AWS_ENDPOINT_URL: &str = "AWS_ENDPOINT_URL";
pub const ENV_AWS_REGION: &str = "AWS_REGION";

/// Speed/cost class of a restore request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RetrievalTier {
    #[default]
    Standard,
    Bulk,
    Expedited,
}

impl RetrievalTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            RetrievalTier::Standard => "Standard",
            RetrievalTier::Bulk => "Bulk",
            RetrievalTier::Expedited => "Expedited",
        }
    }

    /// Parses a tier name, falling back to `Standard` with a warning on anything unknown.
    pub fn parse_or_default(raw: &str) -> Self {
        raw.parse().unwrap_or_else(|_| {
            warn!(
                retrieval_type = raw,
                "Invalid {}: '{}' defaulting to '{}'",
                ENV_RESTORE_RETRIEVAL_TYPE,
                raw,
                RetrievalTier::default()
            );
            RetrievalTier::default()
        })
    }
}

impl FromStr for RetrievalTier {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "Standard" => Ok(RetrievalTier::Standard),
            "Bulk" => Ok(RetrievalTier::Bulk),
            "Expedited" => Ok(RetrievalTier::Expedited),
            other => Err(AppError::Config(format!("unknown retrieval tier '{}'", other))),
        }
    }
}

impl fmt::Display for RetrievalTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pass-level retry budget for restore submissions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub retry_sleep: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, retry_sleep: Duration) -> Self {
        Self {
            max_retries,
            retry_sleep,
        }
    }

    /// Initial attempt plus retries.
    pub fn total_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }
}

/// Delivery budget for a single queue message. Always at least one attempt.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeliveryPolicy {
    pub max_attempts: u32,
    pub retry_sleep: Duration,
}

impl DeliveryPolicy {
    pub fn new(max_attempts: u32, retry_sleep: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            retry_sleep,
        }
    }
}

/// Configuration resolved once per invocation and immutable afterwards.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub restore_expire_days: i32,
    pub restore_retry: RetryPolicy,
    pub retrieval_tier: RetrievalTier,
    pub db_queue_url: String,
    pub queue_delivery: DeliveryPolicy,
    pub aws_endpoint_url: Option<String>,
    pub aws_region: Option<String>,
}

impl RuntimeConfig {
    /// Reads the process environment. Call `dotenv::dotenv()` first to pick up a `.env` file.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolves configuration from an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let restore_expire_days = parse_var::<i32>(get(ENV_RESTORE_EXPIRE_DAYS), ENV_RESTORE_EXPIRE_DAYS)?
            .unwrap_or(DEFAULT_RESTORE_EXPIRE_DAYS);
        if restore_expire_days < 1 {
            return Err(AppError::Config(format!(
                "{} must be at least 1, got {}",
                ENV_RESTORE_EXPIRE_DAYS, restore_expire_days
            )));
        }

        let max_retries = parse_var::<u32>(get(ENV_RESTORE_REQUEST_RETRIES), ENV_RESTORE_REQUEST_RETRIES)?
            .unwrap_or(DEFAULT_MAX_REQUEST_RETRIES);
        let retry_sleep = parse_seconds(get(ENV_RESTORE_RETRY_SLEEP_SECS), ENV_RESTORE_RETRY_SLEEP_SECS)?
            .unwrap_or_else(|| Duration::from_secs_f64(DEFAULT_RESTORE_RETRY_SLEEP_SECS));

        let retrieval_tier = get(ENV_RESTORE_RETRIEVAL_TYPE)
            .map(|raw| RetrievalTier::parse_or_default(&raw))
            .unwrap_or_default();

        let db_queue_url = get(ENV_DB_QUEUE_URL)
            .ok_or_else(|| AppError::Config(format!("{} must be set", ENV_DB_QUEUE_URL)))?;
        Url::parse(&db_queue_url).map_err(|e| {
            AppError::Config(format!("{} is not a valid URL ({}): {}", ENV_DB_QUEUE_URL, db_queue_url, e))
        })?;

        let delivery_attempts = parse_var::<u32>(get(ENV_DB_QUEUE_MAX_ATTEMPTS), ENV_DB_QUEUE_MAX_ATTEMPTS)?
            .unwrap_or(max_retries);
        let delivery_sleep = parse_seconds(get(ENV_DB_QUEUE_RETRY_SLEEP_SECS), ENV_DB_QUEUE_RETRY_SLEEP_SECS)?
            .unwrap_or(retry_sleep);

        Ok(RuntimeConfig {
            restore_expire_days,
            restore_retry: RetryPolicy::new(max_retries, retry_sleep),
            retrieval_tier,
            db_queue_url,
            queue_delivery: DeliveryPolicy::new(delivery_attempts, delivery_sleep),
            aws_endpoint_url: get(ENV_AWS_ENDPOINT_URL),
            aws_region: get(ENV_AWS_REGION),
        })
    }
}

fn parse_var<T: FromStr>(raw: Option<String>, key: &str) -> Result<Option<T>>
where
    T::Err: fmt::Display,
{
    raw.map(|value| {
        value
            .parse::<T>()
            .map_err(|e| AppError::Config(format!("{} has invalid value '{}': {}", key, value, e)))
    })
    .transpose()
}

fn parse_seconds(raw: Option<String>, key: &str) -> Result<Option<Duration>> {
    match parse_var::<f64>(raw, key)? {
        Some(secs) if secs < 0.0 => Err(AppError::Config(format!(
            "{} must be a non-negative number of seconds, got {}",
            key, secs
        ))),
        Some(secs) => Duration::try_from_secs_f64(secs)
            .map(Some)
            .map_err(|e| AppError::Config(format!("{} is not a usable number of seconds ({}): {}", key, secs, e))),
        None => Ok(None),
    }
}
