//! Single file uploads

use std::path::Path;
use std::sync::Arc;

use mime::Mime;
use tracing::debug;

use super::{BucketError, BucketResult, ObjectStore};

/// Object written by a successful upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedObject {
    /// Object key in the bucket
    pub key: String,
    /// Body size in bytes
    pub size: usize,
}

/// Uploads single files as public objects
pub struct ObjectUploader {
    store: Arc<dyn ObjectStore>,
}

impl ObjectUploader {
    /// Creates an uploader for the store's bucket
    #[must_use]
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }

    /// Reads `local_path` into memory and writes it to `remote_key`
    ///
    /// # Errors
    ///
    /// Returns `BucketError::Io` if the file cannot be read, or the store's
    /// error if the write is not confirmed
    pub async fn upload(
        &self,
        local_path: &Path,
        remote_key: &str,
        content_type: &Mime,
    ) -> BucketResult<UploadedObject> {
        let body = tokio::fs::read(local_path)
            .await
            .map_err(|source| BucketError::Io {
                path: local_path.to_path_buf(),
                source,
            })?;
        let size = body.len();

        self.store
            .put_object(remote_key, body, content_type.as_ref())
            .await?;

        debug!("Uploaded {} ({} bytes, {})", remote_key, size, content_type);

        Ok(UploadedObject {
            key: remote_key.to_string(),
            size,
        })
    }
}
