//! Incremental deploy of a site directory into a bucket

use std::path::Path;
use std::sync::Arc;

use deploy_cache::DeployCache;
use futures::{future, stream, StreamExt};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, trace, warn};

use crate::bucket::{BucketProvisioner, ObjectStore, ObjectUploader};
use crate::content_type;
use crate::walker::{DeployableFile, FileWalker};

/// Upload concurrency used unless configured otherwise
pub const DEFAULT_CONCURRENCY: usize = 8;

/// Counters for one deploy run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeploySummary {
    /// Files written to the bucket
    pub uploaded: usize,
    /// Files skipped because the deploy cache already had them
    pub skipped: usize,
    /// Files whose upload failed
    pub failed: usize,
    /// Whether the run stopped early on cancellation
    pub cancelled: bool,
}

impl DeploySummary {
    fn record(mut self, outcome: FileOutcome) -> Self {
        match outcome {
            FileOutcome::Uploaded => self.uploaded += 1,
            FileOutcome::Skipped => self.skipped += 1,
            FileOutcome::Failed => self.failed += 1,
        }
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FileOutcome {
    Uploaded,
    Skipped,
    Failed,
}

/// Deploys a rendered site, skipping files recorded in the deploy cache
///
/// Every file is handled independently: a failed upload is logged and the
/// run moves on. A cache key is recorded only after its upload succeeded.
pub struct Deployer {
    store: Arc<dyn ObjectStore>,
    provisioner: BucketProvisioner,
    uploader: ObjectUploader,
    cache: Arc<dyn DeployCache>,
    remote_prefix: Option<String>,
    concurrency: usize,
}

impl Deployer {
    /// Creates a deployer writing to `store` and recording into `cache`
    #[must_use]
    pub fn new(store: Arc<dyn ObjectStore>, cache: Arc<dyn DeployCache>) -> Self {
        Self {
            provisioner: BucketProvisioner::new(store.clone()),
            uploader: ObjectUploader::new(store.clone()),
            store,
            cache,
            remote_prefix: None,
            concurrency: DEFAULT_CONCURRENCY,
        }
    }

    /// Deploys under a path prefix inside the bucket
    #[must_use]
    pub fn with_remote_prefix(mut self, remote_prefix: Option<String>) -> Self {
        self.remote_prefix = remote_prefix;
        self
    }

    /// Sets the number of concurrent uploads (at least one)
    #[must_use]
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Deploys every file below `root`
    ///
    /// A missing root is a no-op. Once `cancel` fires no new uploads start;
    /// uploads already running finish and are recorded.
    #[instrument(skip_all, fields(root = %root.display(), bucket = %self.store.bucket()))]
    pub async fn deploy(&self, root: &Path, cancel: &CancellationToken) -> DeploySummary {
        let walker = match FileWalker::new(root) {
            Ok(walker) => walker,
            Err(e) => {
                info!("Nothing to deploy: {}", e);
                return DeploySummary::default();
            }
        };

        info!(
            "Deploying {} to {} ({} concurrent uploads)",
            root.display(),
            self.store.bucket(),
            self.concurrency
        );

        let mut summary = stream::iter(walker)
            .take_while(|_| future::ready(!cancel.is_cancelled()))
            .map(|file| self.deploy_file(file))
            .buffer_unordered(self.concurrency)
            .fold(DeploySummary::default(), |summary, outcome| {
                future::ready(summary.record(outcome))
            })
            .await;

        summary.cancelled = cancel.is_cancelled();
        if summary.cancelled {
            warn!(
                uploaded = summary.uploaded,
                skipped = summary.skipped,
                failed = summary.failed,
                "Deploy cancelled"
            );
        } else {
            info!(
                uploaded = summary.uploaded,
                skipped = summary.skipped,
                failed = summary.failed,
                "Deploy finished"
            );
        }

        summary
    }

    async fn deploy_file(&self, file: DeployableFile) -> FileOutcome {
        let bucket = self.store.bucket();

        match self.cache.contains(&file.cache_key).await {
            Ok(true) => {
                trace!("Skipping already deployed file: {}", file.cache_key);
                return FileOutcome::Skipped;
            }
            Ok(false) => {}
            Err(e) => {
                warn!(
                    "Failed to read deploy cache for {}, uploading anyway: {}",
                    file.cache_key, e
                );
            }
        }

        let remote_key = file.remote_key(self.remote_prefix.as_deref());
        let content_type = content_type::resolve(&file.path);

        // The upload below reports the failure for this file if provisioning fails
        if let Err(e) = self.provisioner.ensure_website_bucket().await {
            error!("Failed to provision bucket {}: {}", bucket, e);
        }

        info!("Deploying {} to {}", file.path.display(), bucket);

        match self
            .uploader
            .upload(&file.path, &remote_key, &content_type)
            .await
        {
            Ok(uploaded) => {
                debug!("Upload confirmed for {} ({} bytes)", uploaded.key, uploaded.size);
                if let Err(e) = self.cache.add(&file.cache_key).await {
                    warn!("Failed to record deployed file {}: {}", file.cache_key, e);
                }
                FileOutcome::Uploaded
            }
            Err(e) => {
                error!(
                    "Failed to deploy {} to {}/{}: {}",
                    file.cache_key, bucket, remote_key, e
                );
                FileOutcome::Failed
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use deploy_cache::MemoryDeployCache;
    use tempfile::TempDir;

    use super::*;
    use crate::bucket::mock::MockObjectStore;

    fn site(files: &[&str]) -> TempDir {
        let dir = TempDir::new().unwrap();
        for relative in files {
            let path = dir.path().join(relative);
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(path, relative).unwrap();
        }
        dir
    }

    #[test]
    fn test_summary_record() {
        let summary = DeploySummary::default()
            .record(FileOutcome::Uploaded)
            .record(FileOutcome::Uploaded)
            .record(FileOutcome::Skipped)
            .record(FileOutcome::Failed);

        assert_eq!(
            summary,
            DeploySummary {
                uploaded: 2,
                skipped: 1,
                failed: 1,
                cancelled: false,
            }
        );
    }

    #[test]
    fn test_concurrency_is_at_least_one() {
        let store = Arc::new(MockObjectStore::new("site"));
        let cache = Arc::new(MemoryDeployCache::new());
        let deployer = Deployer::new(store, cache).with_concurrency(0);
        assert_eq!(deployer.concurrency, 1);
    }

    #[tokio::test]
    async fn test_prefix_applies_to_object_key_not_cache_key() {
        let dir = site(&["a/b.html"]);
        let store = Arc::new(MockObjectStore::new("site").with_existing_bucket());
        let cache = Arc::new(MemoryDeployCache::new());

        let summary = Deployer::new(store.clone(), cache.clone())
            .with_remote_prefix(Some("site".to_string()))
            .deploy(dir.path(), &CancellationToken::new())
            .await;

        assert_eq!(summary.uploaded, 1);
        assert_eq!(store.put_keys(), vec!["site/a/b.html".to_string()]);
        assert!(cache.contains("a/b.html").await.unwrap());
    }

    #[tokio::test]
    async fn test_cancelled_before_start_uploads_nothing() {
        let dir = site(&["index.html", "about.html"]);
        let store = Arc::new(MockObjectStore::new("site").with_existing_bucket());
        let cache = Arc::new(MemoryDeployCache::new());
        let cancel = CancellationToken::new();
        cancel.cancel();

        let summary = Deployer::new(store.clone(), cache)
            .deploy(dir.path(), &cancel)
            .await;

        assert!(summary.cancelled);
        assert_eq!(summary.uploaded, 0);
        assert_eq!(store.total_calls(), 0);
    }
}
