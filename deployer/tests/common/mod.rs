// Not every helper is used in every test binary
#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;

use deploy_cache::MemoryDeployCache;
use deployer::bucket::mock::MockObjectStore;
use deployer::{DeploySummary, Deployer};
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

pub const BUCKET: &str = "example.com";

/// Writes a site tree where every file contains its own relative path
pub fn create_site(files: &[&str]) -> TempDir {
    let dir = TempDir::new().unwrap();
    for relative in files {
        write_file(dir.path(), relative, relative);
    }
    dir
}

pub fn write_file(root: &Path, relative: &str, contents: &str) {
    let path = root.join(relative);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, contents).unwrap();
}

/// Store whose bucket already exists
pub fn existing_store() -> Arc<MockObjectStore> {
    Arc::new(MockObjectStore::new(BUCKET).with_existing_bucket())
}

pub async fn deploy(
    store: &Arc<MockObjectStore>,
    cache: &Arc<MemoryDeployCache>,
    root: &Path,
) -> DeploySummary {
    Deployer::new(store.clone(), cache.clone())
        .deploy(root, &CancellationToken::new())
        .await
}

pub fn sorted(keys: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut keys: Vec<String> = keys.into_iter().collect();
    keys.sort();
    keys
}
