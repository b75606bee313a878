//! One-time creation of the public website bucket

use std::sync::Arc;

use tokio::sync::OnceCell;
use tracing::{debug, info};

use super::{BucketError, BucketResult, ObjectStore};

/// Index document served for directory requests
pub const INDEX_DOCUMENT: &str = "index.html";
/// Document served for missing keys
pub const ERROR_DOCUMENT: &str = "error.html";

/// Makes sure the target bucket exists and serves a public website
///
/// The check runs at most once successfully per provisioner. Concurrent
/// callers wait for the attempt in flight; after a failure the next caller
/// tries again.
pub struct BucketProvisioner {
    store: Arc<dyn ObjectStore>,
    provisioned: OnceCell<()>,
}

impl BucketProvisioner {
    /// Creates a provisioner for the store's bucket
    #[must_use]
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self {
            store,
            provisioned: OnceCell::new(),
        }
    }

    /// Whether a previous call already confirmed the bucket
    #[must_use]
    pub fn is_provisioned(&self) -> bool {
        self.provisioned.initialized()
    }

    /// Ensures the bucket exists, creating and configuring it if needed
    ///
    /// # Errors
    ///
    /// Returns `BucketError` if the existence probe fails for a reason other
    /// than a missing bucket, or if creation or website configuration fails
    pub async fn ensure_website_bucket(&self) -> BucketResult<()> {
        self.provisioned
            .get_or_try_init(|| self.provision())
            .await
            .map(|_| ())
    }

    async fn provision(&self) -> BucketResult<()> {
        let bucket = self.store.bucket();

        match self.store.head_bucket().await {
            Ok(()) => {
                debug!("Bucket {} exists", bucket);
                return Ok(());
            }
            Err(BucketError::BucketNotFound(_)) => {}
            Err(e) => return Err(e),
        }

        info!("Creating public website bucket {}", bucket);
        self.store.create_bucket().await?;
        self.store
            .put_bucket_website(INDEX_DOCUMENT, ERROR_DOCUMENT)
            .await?;
        info!(
            "Configured {} as static website ({}, {})",
            bucket, INDEX_DOCUMENT, ERROR_DOCUMENT
        );

        Ok(())
    }
}
