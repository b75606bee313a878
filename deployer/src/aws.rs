//! AWS client construction

use std::time::Duration;

use aws_config::{retry::RetryConfig, timeout::TimeoutConfig, BehaviorVersion, Region};
use aws_credential_types::Credentials;
use tracing::debug;

use crate::types::{CdnTarget, CredentialSource, DeployTarget};

const MAX_ATTEMPTS: u32 = 3;
const INITIAL_BACKOFF: Duration = Duration::from_millis(50);
const OPERATION_TIMEOUT: Duration = Duration::from_secs(30);
const CREDENTIALS_PROVIDER_NAME: &str = "deployer-static";

/// Shared AWS configuration with retry and timeout settings
pub async fn sdk_config(
    region: Option<&str>,
    credentials: &CredentialSource,
    endpoint_url: Option<&str>,
) -> aws_config::SdkConfig {
    let retry_config = RetryConfig::standard()
        .with_max_attempts(MAX_ATTEMPTS)
        .with_initial_backoff(INITIAL_BACKOFF);

    let timeout_config = TimeoutConfig::builder()
        .operation_timeout(OPERATION_TIMEOUT)
        .build();

    let mut loader = aws_config::defaults(BehaviorVersion::latest())
        .retry_config(retry_config)
        .timeout_config(timeout_config);

    if let Some(region) = region {
        loader = loader.region(Region::new(region.to_string()));
    }

    match credentials {
        CredentialSource::Static {
            access_key_id,
            secret_access_key,
        } => {
            debug!("Using static AWS credentials");
            loader = loader.credentials_provider(Credentials::new(
                access_key_id,
                secret_access_key,
                None,
                None,
                CREDENTIALS_PROVIDER_NAME,
            ));
        }
        CredentialSource::Profile(name) => {
            debug!("Using AWS credentials profile {}", name);
            loader = loader.profile_name(name);
        }
        CredentialSource::Ambient => {
            debug!("Using ambient AWS credentials");
        }
    }

    if let Some(endpoint_url) = endpoint_url {
        loader = loader.endpoint_url(endpoint_url);
    }

    loader.load().await
}

/// S3 client for a deploy target
pub async fn s3_client(target: &DeployTarget) -> aws_sdk_s3::Client {
    let sdk_config = sdk_config(
        target.region.as_deref(),
        &target.credentials,
        target.endpoint_url.as_deref(),
    )
    .await;

    let s3_config: aws_sdk_s3::Config = (&sdk_config).into();
    let mut builder = s3_config.to_builder();

    // Path style is needed for LocalStack and most S3-compatible servers
    // https://github.com/awslabs/aws-sdk-rust/discussions/874
    if target.force_path_style {
        builder.set_force_path_style(Some(true));
    }

    aws_sdk_s3::Client::from_conf(builder.build())
}

/// CloudFront client for an invalidation target
pub async fn cloudfront_client(target: &CdnTarget) -> aws_sdk_cloudfront::Client {
    let sdk_config = sdk_config(target.region.as_deref(), &target.credentials, None).await;
    aws_sdk_cloudfront::Client::new(&sdk_config)
}
