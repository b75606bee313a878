//! Post-deploy CloudFront invalidation

use std::sync::Arc;

use tracing::{debug, error, info};

use super::{CdnBackend, InvalidationRequest};
use crate::types::non_blank;

/// Purges a CDN distribution after a deploy
///
/// Invalidation is best-effort: failures are logged and never returned.
pub struct CdnInvalidator {
    backend: Arc<dyn CdnBackend>,
    distribution_id: Option<String>,
}

impl CdnInvalidator {
    /// Creates an invalidator; a missing or blank distribution id disables it
    #[must_use]
    pub fn new(backend: Arc<dyn CdnBackend>, distribution_id: Option<String>) -> Self {
        Self {
            backend,
            distribution_id: non_blank(distribution_id),
        }
    }

    /// Invalidates every path of the distribution
    ///
    /// Returns the invalidation id, or `None` when disabled or on failure.
    pub async fn invalidate_all(&self) -> Option<String> {
        let Some(distribution_id) = self.distribution_id.as_deref() else {
            debug!("No CloudFront distribution configured, skipping invalidation");
            return None;
        };

        info!("Invalidating all CloudFront items of {}", distribution_id);
        let request = InvalidationRequest::all_paths(distribution_id);

        match self.backend.create_invalidation(&request).await {
            Ok(invalidation_id) => {
                info!(
                    "Created CloudFront invalidation {} for {} ({})",
                    invalidation_id, distribution_id, request.caller_reference
                );
                Some(invalidation_id)
            }
            Err(e) => {
                error!("Failed to invalidate CloudFront distribution {}: {}", distribution_id, e);
                None
            }
        }
    }
}
