//! Request Files
//!
//! Requests restores from the archive tier for every file of a granule and
//! posts each status change to the recovery database queue.

// request-files/src/main.rs
mod config;
mod errors;
mod granule;
mod restore;
mod status;
mod task;
mod utils;

#[cfg(test)]
mod test_support;

use anyhow::{Context, Result};
use std::env;
use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};

use config::RuntimeConfig;
use errors::AppError;
use restore::{S3ObjectProbe, S3RestoreInvoker};
use status::StatusEventPublisher;
use status::sqs_queue::SqsQueue;
use task::{RequestFilesTask, TaskEvent, TaskOutput};

/// Reads the task event from the path given as the first argument, or stdin,
/// and prints the task output as JSON on stdout.
#[tokio::main]
async fn main() -> ExitCode {
    dotenv::dotenv().ok();
    utils::logging::init_logging();

    match run_app().await {
        Ok(output) => {
            println!("{}", output);
            info!("✅ Restore requests submitted.");
            ExitCode::SUCCESS
        }
        Err(e) => {
            let partial = e.downcast_ref::<AppError>().and_then(TaskOutput::from_partial_failure);
            if let Some(output) = partial {
                match serde_json::to_string(&output) {
                    Ok(json) => println!("{}", json),
                    Err(err) => error!("❌ Failed to serialize partial output: {}", err),
                }
            }
            error!("❌ Error: {:?}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run_app() -> Result<String> {
    let event = read_event().context("Failed to read task event")?;
    let config = RuntimeConfig::from_env().context("Failed to resolve runtime configuration")?;

    let sdk_config = utils::aws::load_sdk_config(&config).await;
    let s3_client = utils::aws::s3_client(&sdk_config, &config);
    let probe = S3ObjectProbe::new(s3_client.clone());
    let invoker = S3RestoreInvoker::new(s3_client);
    let queue = SqsQueue::new(aws_sdk_sqs::Client::new(&sdk_config), config.db_queue_url.clone());
    let publisher = StatusEventPublisher::new(queue, config.queue_delivery);

    let task = RequestFilesTask::new(&probe, &invoker, &publisher, &config);
    let output = task.run(event).await.context("Request files task failed")?;

    serde_json::to_string(&output).context("Failed to serialize task output")
}

fn read_event() -> Result<TaskEvent> {
    let args: Vec<String> = env::args().collect();
    if args.len() > 1 {
        let path = PathBuf::from(args[1].trim());
        return task::load_event_from_path(&path)
            .with_context(|| format!("Failed to load task event from {}", path.display()));
    }

    let mut raw = String::new();
    std::io::stdin()
        .read_to_string(&mut raw)
        .context("Failed to read task event from stdin")?;
    Ok(task::parse_event(&raw)?)
}
