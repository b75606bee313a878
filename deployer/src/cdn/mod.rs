//! CloudFront cache invalidation

mod client;
mod error;
mod invalidator;

#[cfg(any(test, feature = "test-utils"))]
pub mod mock;

pub use client::{caller_reference, CdnBackend, CloudFrontBackend, InvalidationRequest, ALL_PATHS};
pub use error::{CdnError, CdnResult};
pub use invalidator::CdnInvalidator;
