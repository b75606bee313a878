//! Round trip against LocalStack on `localhost:4566`
//!
//! Run with `cargo test -- --ignored` while LocalStack is up.

mod common;

use std::sync::Arc;

use common::create_site;
use deploy_cache::MemoryDeployCache;
use deployer::aws;
use deployer::bucket::S3ObjectStore;
use deployer::types::{CredentialSource, DeployTarget};
use deployer::Deployer;
use tokio_util::sync::CancellationToken;

const LOCALSTACK_ENDPOINT: &str = "http://localhost:4566";

fn setup_test_env() {
    dotenvy::from_path(".env.example").ok();

    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .try_init()
        .ok();
}

fn localstack_target() -> DeployTarget {
    DeployTarget {
        bucket: format!("site-{}", uuid::Uuid::new_v4()),
        region: Some("us-east-1".to_string()),
        credentials: CredentialSource::Static {
            access_key_id: "test".to_string(),
            secret_access_key: "test".to_string(),
        },
        remote_prefix: None,
        endpoint_url: Some(
            std::env::var("LOCALSTACK_ENDPOINT").unwrap_or_else(|_| LOCALSTACK_ENDPOINT.to_string()),
        ),
        force_path_style: true,
    }
}

#[tokio::test]
#[ignore = "requires LocalStack"]
async fn test_deploy_creates_website_bucket_and_objects() {
    setup_test_env();

    let target = localstack_target();
    let client = Arc::new(aws::s3_client(&target).await);
    let store = Arc::new(S3ObjectStore::new(
        client.clone(),
        target.bucket.clone(),
        target.region.clone(),
    ));
    let cache = Arc::new(MemoryDeployCache::new());
    let site = create_site(&["index.html", "assets/style.css"]);

    let summary = Deployer::new(store, cache)
        .deploy(site.path(), &CancellationToken::new())
        .await;

    assert_eq!(summary.uploaded, 2);
    assert_eq!(summary.failed, 0);

    let website = client
        .get_bucket_website()
        .bucket(&target.bucket)
        .send()
        .await
        .unwrap();
    assert_eq!(
        website.index_document().map(|d| d.suffix()),
        Some("index.html")
    );

    let object = client
        .get_object()
        .bucket(&target.bucket)
        .key("assets/style.css")
        .send()
        .await
        .unwrap();
    assert_eq!(object.content_type(), Some("text/css"));
    let body = object.body.collect().await.unwrap().into_bytes();
    assert_eq!(body.as_ref(), b"assets/style.css");
}
