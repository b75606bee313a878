//! S3 bucket operations for site deploys

mod client;
mod error;
mod provisioner;
mod uploader;

#[cfg(any(test, feature = "test-utils"))]
pub mod mock;

pub use client::{ObjectStore, S3ObjectStore};
pub use error::{BucketError, BucketResult};
pub use provisioner::{BucketProvisioner, ERROR_DOCUMENT, INDEX_DOCUMENT};
pub use uploader::{ObjectUploader, UploadedObject};
