//! Error types for CDN operations

use aws_sdk_cloudfront::error::{BuildError, DisplayErrorContext, SdkError};
use thiserror::Error;

/// Result type for CDN operations
pub type CdnResult<T> = Result<T, CdnError>;

/// Errors that can occur during CDN operations
#[derive(Error, Debug)]
pub enum CdnError {
    /// CloudFront service error
    #[error("CloudFront service error: {0}")]
    CloudFrontError(String),

    /// AWS SDK error (transport, credentials, timeouts)
    #[error("AWS SDK error: {0}")]
    AwsError(String),

    /// Request could not be built
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl<E> From<SdkError<E>> for CdnError
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn from(error: SdkError<E>) -> Self {
        let message = DisplayErrorContext(&error).to_string();
        match error {
            SdkError::ServiceError(_) => Self::CloudFrontError(message),
            _ => Self::AwsError(message),
        }
    }
}

impl From<BuildError> for CdnError {
    fn from(error: BuildError) -> Self {
        Self::ConfigError(error.to_string())
    }
}
