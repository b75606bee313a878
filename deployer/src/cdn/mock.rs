//! Recording `CdnBackend` for tests

use std::sync::Mutex;

use super::{CdnBackend, CdnError, CdnResult, InvalidationRequest};

/// CDN backend that records requests and optionally fails them
#[derive(Debug, Default)]
pub struct MockCdnBackend {
    fail: bool,
    requests: Mutex<Vec<InvalidationRequest>>,
}

impl MockCdnBackend {
    /// Backend that accepts every invalidation
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Backend that rejects every invalidation
    #[must_use]
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// Every request received, in call order
    #[must_use]
    pub fn requests(&self) -> Vec<InvalidationRequest> {
        self.requests
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }
}

#[async_trait::async_trait]
impl CdnBackend for MockCdnBackend {
    async fn create_invalidation(&self, request: &InvalidationRequest) -> CdnResult<String> {
        let count = {
            let mut requests = self
                .requests
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner);
            requests.push(request.clone());
            requests.len()
        };

        if self.fail {
            Err(CdnError::CloudFrontError("NoSuchDistribution".to_string()))
        } else {
            Ok(format!("I{count}"))
        }
    }
}
