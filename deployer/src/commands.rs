//! Command handlers wiring configuration, AWS clients and the deploy engine

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use deploy_cache::{DeployCache, FileDeployCache};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::aws;
use crate::bucket::S3ObjectStore;
use crate::cdn::{CdnInvalidator, CloudFrontBackend};
use crate::cli::DeployArgs;
use crate::engine::{DeploySummary, Deployer};
use crate::types::{CdnTarget, DeployConfig, DeployEnvironment, DeployTarget};

/// Runs `deploy`: uploads new files, then optionally invalidates the CDN
///
/// # Errors
///
/// Returns an error if no site directory is configured or the deploy cache
/// cannot be opened. Per-file failures are counted in the summary instead.
pub async fn deploy(
    config: &DeployConfig,
    args: &DeployArgs,
    cancel: &CancellationToken,
) -> anyhow::Result<DeploySummary> {
    let site_path = site_path(config, args)?;
    let target = DeployTarget::resolve(config, args.env);
    let concurrency = args
        .concurrency
        .map_or(config.deploy.concurrency, usize::from);

    info!(
        "Deploying {} to {} bucket {}",
        site_path.display(),
        args.env,
        target.bucket
    );

    let cache = open_cache(config, &target.bucket).await?;
    let client = Arc::new(aws::s3_client(&target).await);
    let store = Arc::new(S3ObjectStore::new(
        client,
        target.bucket.clone(),
        target.region.clone(),
    ));

    let summary = Deployer::new(store, Arc::new(cache))
        .with_remote_prefix(target.remote_prefix.clone())
        .with_concurrency(concurrency)
        .deploy(&site_path, cancel)
        .await;

    if args.invalidate || config.cdn.invalidate_after_deploy {
        if summary.cancelled {
            warn!("Skipping CloudFront invalidation after cancelled deploy");
        } else {
            invalidate(config).await;
        }
    }

    Ok(summary)
}

/// Runs `invalidate` and returns the invalidation id when one was created
pub async fn invalidate(config: &DeployConfig) -> Option<String> {
    let target = CdnTarget::resolve(config);
    let client = Arc::new(aws::cloudfront_client(&target).await);
    let backend = Arc::new(CloudFrontBackend::new(client));

    CdnInvalidator::new(backend, target.distribution_id)
        .invalidate_all()
        .await
}

/// Runs `cache status` and returns the number of recorded files
///
/// # Errors
///
/// Returns an error if the cache file cannot be read
pub async fn cache_status(config: &DeployConfig, environment: DeployEnvironment) -> anyhow::Result<usize> {
    let target = DeployTarget::resolve(config, environment);
    let cache = open_cache(config, &target.bucket).await?;
    let count = cache.len().await?;

    info!(
        "{} files recorded for {} in {}",
        count,
        target.bucket,
        cache.path().display()
    );

    Ok(count)
}

/// Runs `cache clear`
///
/// # Errors
///
/// Returns an error if the cache file cannot be removed
pub async fn cache_clear(config: &DeployConfig, environment: DeployEnvironment) -> anyhow::Result<()> {
    let target = DeployTarget::resolve(config, environment);
    let cache = open_cache(config, &target.bucket).await?;
    cache.clear().await?;

    info!("Cleared deploy cache for {} at {}", target.bucket, cache.path().display());
    Ok(())
}

fn site_path(config: &DeployConfig, args: &DeployArgs) -> anyhow::Result<PathBuf> {
    args.path
        .clone()
        .or_else(|| config.deploy.site_path.clone())
        .context("No site directory given, pass --path or set deploy.site_path")
}

async fn open_cache(config: &DeployConfig, bucket: &str) -> anyhow::Result<FileDeployCache> {
    FileDeployCache::open(&config.deploy.cache_dir, bucket)
        .await
        .with_context(|| {
            format!(
                "Failed to open deploy cache in {}",
                config.deploy.cache_dir.display()
            )
        })
}
