//! Error types for bucket operations

use std::path::PathBuf;

use aws_sdk_s3::error::{BuildError, DisplayErrorContext, SdkError};
use thiserror::Error;

/// Result type for bucket operations
pub type BucketResult<T> = Result<T, BucketError>;

/// Errors that can occur during bucket operations
#[derive(Error, Debug)]
pub enum BucketError {
    /// The bucket does not exist
    #[error("Bucket not found: {0}")]
    BucketNotFound(String),

    /// S3 service error
    #[error("S3 service error: {0}")]
    S3Error(String),

    /// AWS SDK error (transport, credentials, timeouts)
    #[error("AWS SDK error: {0}")]
    AwsError(String),

    /// Upstream service error (5xx from S3)
    #[error("Upstream service error: {0}")]
    UpstreamError(String),

    /// Request could not be built
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Local file could not be read
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        /// Local file path
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

impl<E> From<SdkError<E>> for BucketError
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn from(error: SdkError<E>) -> Self {
        let status = error.raw_response().map(|raw| raw.status().as_u16());
        let message = DisplayErrorContext(&error).to_string();

        match (&error, status) {
            (_, Some(status)) if status >= 500 => Self::UpstreamError(message),
            (SdkError::ServiceError(_), _) => Self::S3Error(message),
            _ => Self::AwsError(message),
        }
    }
}

impl From<BuildError> for BucketError {
    fn from(error: BuildError) -> Self {
        Self::ConfigError(error.to_string())
    }
}
