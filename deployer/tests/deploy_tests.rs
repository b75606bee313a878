mod common;

use std::sync::Arc;
use std::time::Duration;

use common::*;
use deploy_cache::{DeployCache, FileDeployCache, MemoryDeployCache};
use deployer::bucket::mock::MockObjectStore;
use deployer::{DeploySummary, Deployer};
use pretty_assertions::assert_eq;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

#[tokio::test]
async fn test_deploy_fresh_bucket_end_to_end() {
    let site = create_site(&["index.html", "assets/style.css"]);
    let store = Arc::new(MockObjectStore::new(BUCKET));
    let cache = Arc::new(MemoryDeployCache::new());

    let summary = deploy(&store, &cache, site.path()).await;

    assert_eq!(
        summary,
        DeploySummary {
            uploaded: 2,
            skipped: 0,
            failed: 0,
            cancelled: false,
        }
    );
    assert_eq!(store.create_calls(), 1);
    assert_eq!(
        store.website(),
        Some(("index.html".to_string(), "error.html".to_string()))
    );

    let mut puts = store.puts();
    puts.sort_by(|a, b| a.key.cmp(&b.key));
    assert_eq!(puts.len(), 2);
    assert_eq!(puts[0].key, "assets/style.css");
    assert_eq!(puts[0].content_type, "text/css");
    assert_eq!(puts[0].body, b"assets/style.css".to_vec());
    assert_eq!(puts[1].key, "index.html");
    assert_eq!(puts[1].content_type, "text/html");

    assert_eq!(
        sorted(cache.keys().await),
        vec!["assets/style.css".to_string(), "index.html".to_string()]
    );
}

#[tokio::test]
async fn test_redeploy_uploads_nothing() {
    let site = create_site(&["index.html", "about/index.html", "img/logo.png"]);
    let store = existing_store();
    let cache = Arc::new(MemoryDeployCache::new());

    let first = deploy(&store, &cache, site.path()).await;
    assert_eq!(first.uploaded, 3);

    let second = deploy(&store, &cache, site.path()).await;

    assert_eq!(second.uploaded, 0);
    assert_eq!(second.skipped, 3);
    assert_eq!(store.puts().len(), 3);
}

#[tokio::test]
async fn test_new_file_is_uploaded_on_redeploy() {
    let site = create_site(&["index.html"]);
    let store = existing_store();
    let cache = Arc::new(MemoryDeployCache::new());

    deploy(&store, &cache, site.path()).await;
    write_file(site.path(), "posts/new.html", "new");
    let summary = deploy(&store, &cache, site.path()).await;

    assert_eq!(summary.uploaded, 1);
    assert_eq!(summary.skipped, 1);
    assert_eq!(
        store.put_keys(),
        vec!["index.html".to_string(), "posts/new.html".to_string()]
    );
}

#[tokio::test]
async fn test_failed_file_does_not_stop_the_run() {
    let site = create_site(&["a.html", "b.html", "c.html"]);
    let store = Arc::new(
        MockObjectStore::new(BUCKET)
            .with_existing_bucket()
            .fail_uploads_for("b.html"),
    );
    let cache = Arc::new(MemoryDeployCache::new());

    let summary = deploy(&store, &cache, site.path()).await;

    assert_eq!(summary.uploaded, 2);
    assert_eq!(summary.failed, 1);
    assert_eq!(
        sorted(cache.keys().await),
        vec!["a.html".to_string(), "c.html".to_string()]
    );

    // The failed file is retried on the next run
    let retry = deploy(&store, &cache, site.path()).await;
    assert_eq!(retry.failed, 1);
    assert_eq!(retry.skipped, 2);
}

#[tokio::test]
async fn test_missing_root_makes_no_backend_calls() {
    let dir = TempDir::new().unwrap();
    let store = Arc::new(MockObjectStore::new(BUCKET));
    let cache = Arc::new(MemoryDeployCache::new());

    let summary = deploy(&store, &cache, &dir.path().join("public")).await;

    assert_eq!(summary, DeploySummary::default());
    assert_eq!(store.total_calls(), 0);
    assert!(cache.keys().await.is_empty());
}

#[tokio::test]
async fn test_empty_root_makes_no_backend_calls() {
    let dir = TempDir::new().unwrap();
    let store = Arc::new(MockObjectStore::new(BUCKET));
    let cache = Arc::new(MemoryDeployCache::new());

    let summary = deploy(&store, &cache, dir.path()).await;

    assert_eq!(summary, DeploySummary::default());
    assert_eq!(store.total_calls(), 0);
}

#[tokio::test]
async fn test_remote_prefix_is_applied_to_every_key() {
    let site = create_site(&["index.html", "assets/app.js"]);
    let store = existing_store();
    let cache = Arc::new(MemoryDeployCache::new());

    Deployer::new(store.clone(), cache.clone())
        .with_remote_prefix(Some("docs/v2".to_string()))
        .deploy(site.path(), &CancellationToken::new())
        .await;

    assert_eq!(
        sorted(store.put_keys()),
        vec![
            "docs/v2/assets/app.js".to_string(),
            "docs/v2/index.html".to_string()
        ]
    );
    assert_eq!(
        sorted(cache.keys().await),
        vec!["assets/app.js".to_string(), "index.html".to_string()]
    );
}

#[tokio::test]
async fn test_unknown_extension_uses_octet_stream() {
    let site = create_site(&["data.bin123", "LICENSE"]);
    let store = existing_store();
    let cache = Arc::new(MemoryDeployCache::new());

    deploy(&store, &cache, site.path()).await;

    for put in store.puts() {
        assert_eq!(put.content_type, "application/octet-stream", "{}", put.key);
    }
}

#[tokio::test]
async fn test_uploads_respect_concurrency_limit() {
    let files: Vec<String> = (0..12).map(|i| format!("page-{i}.html")).collect();
    let names: Vec<&str> = files.iter().map(String::as_str).collect();
    let site = create_site(&names);
    let store = Arc::new(
        MockObjectStore::new(BUCKET)
            .with_existing_bucket()
            .with_put_delay(Duration::from_millis(20)),
    );
    let cache = Arc::new(MemoryDeployCache::new());

    let summary = Deployer::new(store.clone(), cache)
        .with_concurrency(3)
        .deploy(site.path(), &CancellationToken::new())
        .await;

    assert_eq!(summary.uploaded, 12);
    assert!(store.max_concurrent_puts() <= 3);
    assert!(store.max_concurrent_puts() >= 2);
}

#[tokio::test]
async fn test_cancellation_stops_new_uploads() {
    let files: Vec<String> = (0..20).map(|i| format!("page-{i}.html")).collect();
    let names: Vec<&str> = files.iter().map(String::as_str).collect();
    let site = create_site(&names);
    let store = Arc::new(
        MockObjectStore::new(BUCKET)
            .with_existing_bucket()
            .with_put_delay(Duration::from_millis(50)),
    );
    let cache = Arc::new(MemoryDeployCache::new());
    let cancel = CancellationToken::new();

    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(75)).await;
        trigger.cancel();
    });

    let summary = Deployer::new(store.clone(), cache.clone())
        .with_concurrency(2)
        .deploy(site.path(), &cancel)
        .await;

    assert!(summary.cancelled);
    assert!(summary.uploaded < 20);
    // Uploads in flight when cancelled still complete and are recorded
    assert_eq!(cache.keys().await.len(), summary.uploaded);
    assert_eq!(store.puts().len(), summary.uploaded);
}

#[tokio::test]
async fn test_file_cache_persists_between_runs() {
    let site = create_site(&["index.html", "feed.xml"]);
    let cache_dir = TempDir::new().unwrap();
    let store = existing_store();

    let cache = Arc::new(FileDeployCache::open(cache_dir.path(), BUCKET).await.unwrap());
    let first = Deployer::new(store.clone(), cache)
        .deploy(site.path(), &CancellationToken::new())
        .await;
    assert_eq!(first.uploaded, 2);

    let reopened = Arc::new(FileDeployCache::open(cache_dir.path(), BUCKET).await.unwrap());
    assert_eq!(reopened.len().await.unwrap(), 2);

    let second = Deployer::new(store.clone(), reopened)
        .deploy(site.path(), &CancellationToken::new())
        .await;
    assert_eq!(second.skipped, 2);
    assert_eq!(store.puts().len(), 2);
}

#[cfg(unix)]
#[tokio::test]
async fn test_non_utf8_names_never_share_a_cache_key() {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;

    let site = create_site(&["index.html"]);
    for name in [b"\xff.html".as_slice(), b"\xfe.html".as_slice()] {
        std::fs::write(site.path().join(OsStr::from_bytes(name)), "x").unwrap();
    }
    let store = existing_store();
    let cache = Arc::new(MemoryDeployCache::new());

    let first = deploy(&store, &cache, site.path()).await;
    assert_eq!(first.uploaded, 1);
    assert_eq!(store.put_keys(), vec!["index.html".to_string()]);

    write_file(site.path(), "new.html", "new");
    let second = deploy(&store, &cache, site.path()).await;

    assert_eq!(second.uploaded, 1);
    assert_eq!(second.skipped, 1);
    assert_eq!(
        sorted(cache.keys().await),
        vec!["index.html".to_string(), "new.html".to_string()]
    );
}
