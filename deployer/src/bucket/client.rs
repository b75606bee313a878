//! S3 bucket client implementation

use std::sync::Arc;

use aws_sdk_s3::{
    error::SdkError,
    operation::{create_bucket::CreateBucketError, head_bucket::HeadBucketError},
    primitives::ByteStream,
    types::{
        BucketCannedAcl, BucketLocationConstraint, CreateBucketConfiguration, ErrorDocument,
        IndexDocument, ObjectCannedAcl, ObjectOwnership, WebsiteConfiguration,
    },
    Client as S3Client,
};
use tracing::debug;

use super::{BucketError, BucketResult};

/// Region where S3 rejects an explicit location constraint
const DEFAULT_REGION: &str = "us-east-1";

/// Object storage operations needed to deploy a site into one bucket
#[async_trait::async_trait]
pub trait ObjectStore: Send + Sync {
    /// Name of the bucket this store writes to
    fn bucket(&self) -> &str;

    /// Checks that the bucket exists and is reachable
    ///
    /// Returns `BucketError::BucketNotFound` when the bucket does not exist.
    async fn head_bucket(&self) -> BucketResult<()>;

    /// Creates the bucket with a public-read ACL
    ///
    /// Succeeds if the bucket already exists and is owned by the caller.
    async fn create_bucket(&self) -> BucketResult<()>;

    /// Configures the bucket to serve a static website
    async fn put_bucket_website(&self, index_document: &str, error_document: &str)
        -> BucketResult<()>;

    /// Writes an object with a public-read ACL
    async fn put_object(&self, key: &str, body: Vec<u8>, content_type: &str) -> BucketResult<()>;
}

/// `ObjectStore` backed by Amazon S3
pub struct S3ObjectStore {
    s3_client: Arc<S3Client>,
    bucket_name: String,
    region: Option<String>,
}

impl S3ObjectStore {
    /// Creates a new store
    ///
    /// # Arguments
    ///
    /// * `s3_client` - Pre-configured S3 client
    /// * `bucket_name` - Bucket the site is deployed to
    /// * `region` - Location constraint on bucket creation, the client's region when `None`
    #[must_use]
    pub const fn new(s3_client: Arc<S3Client>, bucket_name: String, region: Option<String>) -> Self {
        Self {
            s3_client,
            bucket_name,
            region,
        }
    }

    // Falls back to the client's region, which the SDK resolves from the
    // environment or profile when none is configured
    fn create_bucket_configuration(&self) -> Option<CreateBucketConfiguration> {
        let region = match &self.region {
            Some(region) => region.clone(),
            None => self.s3_client.config().region()?.to_string(),
        };

        (region != DEFAULT_REGION).then(|| {
            CreateBucketConfiguration::builder()
                .location_constraint(BucketLocationConstraint::from(region.as_str()))
                .build()
        })
    }
}

#[async_trait::async_trait]
impl ObjectStore for S3ObjectStore {
    fn bucket(&self) -> &str {
        &self.bucket_name
    }

    async fn head_bucket(&self) -> BucketResult<()> {
        let result = self
            .s3_client
            .head_bucket()
            .bucket(&self.bucket_name)
            .send()
            .await;

        match result {
            Ok(_) => Ok(()),
            Err(SdkError::ServiceError(service_err))
                if matches!(service_err.err(), HeadBucketError::NotFound(_)) =>
            {
                Err(BucketError::BucketNotFound(self.bucket_name.clone()))
            }
            Err(e) => Err(BucketError::from(e)),
        }
    }

    async fn create_bucket(&self) -> BucketResult<()> {
        let result = self
            .s3_client
            .create_bucket()
            .bucket(&self.bucket_name)
            .acl(BucketCannedAcl::PublicRead)
            .object_ownership(ObjectOwnership::BucketOwnerPreferred)
            .set_create_bucket_configuration(self.create_bucket_configuration())
            .send()
            .await;

        match result {
            Ok(_) => Ok(()),
            Err(SdkError::ServiceError(service_err))
                if matches!(
                    service_err.err(),
                    CreateBucketError::BucketAlreadyOwnedByYou(_)
                ) =>
            {
                debug!("Bucket {} already owned by caller", self.bucket_name);
                Ok(())
            }
            Err(e) => Err(BucketError::from(e)),
        }
    }

    async fn put_bucket_website(
        &self,
        index_document: &str,
        error_document: &str,
    ) -> BucketResult<()> {
        let website = WebsiteConfiguration::builder()
            .index_document(IndexDocument::builder().suffix(index_document).build()?)
            .error_document(ErrorDocument::builder().key(error_document).build()?)
            .build();

        self.s3_client
            .put_bucket_website()
            .bucket(&self.bucket_name)
            .website_configuration(website)
            .send()
            .await?;

        Ok(())
    }

    async fn put_object(&self, key: &str, body: Vec<u8>, content_type: &str) -> BucketResult<()> {
        self.s3_client
            .put_object()
            .bucket(&self.bucket_name)
            .key(key)
            .body(ByteStream::from(body))
            .acl(ObjectCannedAcl::PublicRead)
            .content_type(content_type)
            .send()
            .await?;

        Ok(())
    }
}
