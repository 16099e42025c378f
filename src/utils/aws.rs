// request-files/src/utils/aws.rs
use aws_config::SdkConfig;
use aws_sdk_s3 as s3;
use s3::config::{BehaviorVersion, Region};

use crate::config::RuntimeConfig;

/// Shared SDK configuration for the S3 and SQS clients.
pub async fn load_sdk_config(config: &RuntimeConfig) -> SdkConfig {
    let mut loader = aws_config::defaults(BehaviorVersion::latest());
    if let Some(endpoint) = &config.aws_endpoint_url {
        loader = loader.endpoint_url(endpoint);
    }
    if let Some(region) = &config.aws_region {
        loader = loader.region(Region::new(region.clone()));
    }
    loader.load().await
}

/// S3 client. Path-style addressing when an endpoint override points at an S3-compatible service.
pub fn s3_client(sdk_config: &SdkConfig, config: &RuntimeConfig) -> s3::Client {
    let s3_config = s3::config::Builder::from(sdk_config)
        .force_path_style(config.aws_endpoint_url.is_some())
        .build();
    s3::Client::from_conf(s3_config)
}
