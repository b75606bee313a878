//! CloudFront client implementation

use std::sync::Arc;

use aws_sdk_cloudfront::{
    types::{InvalidationBatch, Paths},
    Client as CloudFrontClient,
};
use chrono::{DateTime, Utc};

use super::{CdnError, CdnResult};

/// Path pattern matching every object in a distribution
pub const ALL_PATHS: &str = "/*";

const CALLER_REFERENCE_PREFIX: &str = "site-deployer";

/// A cache invalidation for one distribution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidationRequest {
    /// Distribution to invalidate
    pub distribution_id: String,
    /// Idempotency key, unique per request
    pub caller_reference: String,
    /// Path patterns to invalidate
    pub paths: Vec<String>,
}

impl InvalidationRequest {
    /// Invalidation of every path, with a time based caller reference
    #[must_use]
    pub fn all_paths(distribution_id: &str) -> Self {
        Self {
            distribution_id: distribution_id.to_string(),
            caller_reference: caller_reference(Utc::now()),
            paths: vec![ALL_PATHS.to_string()],
        }
    }
}

/// Caller reference derived from a point in time
///
/// Includes sub-second precision so two requests in the same second differ.
#[must_use]
pub fn caller_reference(at: DateTime<Utc>) -> String {
    format!(
        "{CALLER_REFERENCE_PREFIX} {}-{:09}",
        at.timestamp(),
        at.timestamp_subsec_nanos()
    )
}

/// CDN operations used after a deploy
#[async_trait::async_trait]
pub trait CdnBackend: Send + Sync {
    /// Submits an invalidation and returns its id
    async fn create_invalidation(&self, request: &InvalidationRequest) -> CdnResult<String>;
}

/// `CdnBackend` backed by Amazon CloudFront
pub struct CloudFrontBackend {
    cloudfront_client: Arc<CloudFrontClient>,
}

impl CloudFrontBackend {
    /// Creates a new backend from a pre-configured client
    #[must_use]
    pub const fn new(cloudfront_client: Arc<CloudFrontClient>) -> Self {
        Self { cloudfront_client }
    }
}

#[async_trait::async_trait]
impl CdnBackend for CloudFrontBackend {
    async fn create_invalidation(&self, request: &InvalidationRequest) -> CdnResult<String> {
        let quantity = i32::try_from(request.paths.len())
            .map_err(|_| CdnError::ConfigError("Too many invalidation paths".to_string()))?;

        let paths = Paths::builder()
            .quantity(quantity)
            .set_items(Some(request.paths.clone()))
            .build()?;

        let batch = InvalidationBatch::builder()
            .paths(paths)
            .caller_reference(&request.caller_reference)
            .build()?;

        let output = self
            .cloudfront_client
            .create_invalidation()
            .distribution_id(&request.distribution_id)
            .invalidation_batch(batch)
            .send()
            .await?;

        Ok(output
            .invalidation()
            .map(|invalidation| invalidation.id().to_string())
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};

    use super::*;

    #[test]
    fn test_all_paths_request() {
        let request = InvalidationRequest::all_paths("E123");

        assert_eq!(request.distribution_id, "E123");
        assert_eq!(request.paths, vec!["/*".to_string()]);
        assert!(request.caller_reference.starts_with("site-deployer "));
    }

    #[test]
    fn test_caller_reference_is_unique_within_a_second() {
        let at = Utc.timestamp_opt(1_700_000_000, 0).unwrap();

        let first = caller_reference(at);
        let second = caller_reference(at + Duration::milliseconds(1));

        assert_eq!(first, "site-deployer 1700000000-000000000");
        assert_ne!(first, second);
    }
}
