//! In-memory `ObjectStore` for tests

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use super::{BucketError, BucketResult, ObjectStore};

/// A recorded `put_object` call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PutRecord {
    /// Object key
    pub key: String,
    /// Content type
    pub content_type: String,
    /// Object body
    pub body: Vec<u8>,
}

#[derive(Debug, Default)]
struct MockState {
    exists: bool,
    head_error: bool,
    create_error: bool,
    failing_keys: HashSet<String>,
    head_calls: usize,
    create_calls: usize,
    website_calls: usize,
    website: Option<(String, String)>,
    puts: Vec<PutRecord>,
}

/// Scriptable object store that records every call
#[derive(Debug)]
pub struct MockObjectStore {
    bucket: String,
    state: Mutex<MockState>,
    put_delay: Duration,
    create_delay: Duration,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl MockObjectStore {
    /// Store whose bucket does not exist yet
    #[must_use]
    pub fn new(bucket: &str) -> Self {
        Self {
            bucket: bucket.to_string(),
            state: Mutex::new(MockState::default()),
            put_delay: Duration::ZERO,
            create_delay: Duration::ZERO,
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    /// Marks the bucket as already existing
    #[must_use]
    pub fn with_existing_bucket(self) -> Self {
        self.lock().exists = true;
        self
    }

    /// Makes `head_bucket` fail with an access error
    #[must_use]
    pub fn with_head_error(self) -> Self {
        self.lock().head_error = true;
        self
    }

    /// Makes `create_bucket` fail
    #[must_use]
    pub fn with_create_error(self) -> Self {
        self.lock().create_error = true;
        self
    }

    /// Makes uploads to `key` fail
    #[must_use]
    pub fn fail_uploads_for(self, key: &str) -> Self {
        self.lock().failing_keys.insert(key.to_string());
        self
    }

    /// Delays every upload
    #[must_use]
    pub fn with_put_delay(mut self, delay: Duration) -> Self {
        self.put_delay = delay;
        self
    }

    /// Delays bucket creation
    #[must_use]
    pub fn with_create_delay(mut self, delay: Duration) -> Self {
        self.create_delay = delay;
        self
    }

    /// Lets `head_bucket` succeed again
    pub fn clear_head_error(&self) {
        self.lock().head_error = false;
    }

    /// Number of `head_bucket` calls
    #[must_use]
    pub fn head_calls(&self) -> usize {
        self.lock().head_calls
    }

    /// Number of `create_bucket` calls
    #[must_use]
    pub fn create_calls(&self) -> usize {
        self.lock().create_calls
    }

    /// Website documents set by `put_bucket_website`
    #[must_use]
    pub fn website(&self) -> Option<(String, String)> {
        self.lock().website.clone()
    }

    /// Every attempted upload, in call order
    #[must_use]
    pub fn puts(&self) -> Vec<PutRecord> {
        self.lock().puts.clone()
    }

    /// Keys of every attempted upload, in call order
    #[must_use]
    pub fn put_keys(&self) -> Vec<String> {
        self.lock().puts.iter().map(|p| p.key.clone()).collect()
    }

    /// Total number of backend calls of any kind
    #[must_use]
    pub fn total_calls(&self) -> usize {
        let state = self.lock();
        state.head_calls + state.create_calls + state.website_calls + state.puts.len()
    }

    /// Highest number of uploads observed running at once
    #[must_use]
    pub fn max_concurrent_puts(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MockState> {
        self.state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

#[async_trait::async_trait]
impl ObjectStore for MockObjectStore {
    fn bucket(&self) -> &str {
        &self.bucket
    }

    async fn head_bucket(&self) -> BucketResult<()> {
        let mut state = self.lock();
        state.head_calls += 1;

        if state.head_error {
            return Err(BucketError::S3Error("AccessDenied".to_string()));
        }
        if state.exists {
            Ok(())
        } else {
            Err(BucketError::BucketNotFound(self.bucket.clone()))
        }
    }

    async fn create_bucket(&self) -> BucketResult<()> {
        self.lock().create_calls += 1;

        if !self.create_delay.is_zero() {
            tokio::time::sleep(self.create_delay).await;
        }

        let mut state = self.lock();
        if state.create_error {
            return Err(BucketError::S3Error("InvalidBucketName".to_string()));
        }
        state.exists = true;
        Ok(())
    }

    async fn put_bucket_website(
        &self,
        index_document: &str,
        error_document: &str,
    ) -> BucketResult<()> {
        let mut state = self.lock();
        state.website_calls += 1;
        state.website = Some((index_document.to_string(), error_document.to_string()));
        drop(state);
        Ok(())
    }

    async fn put_object(&self, key: &str, body: Vec<u8>, content_type: &str) -> BucketResult<()> {
        let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(running, Ordering::SeqCst);

        if !self.put_delay.is_zero() {
            tokio::time::sleep(self.put_delay).await;
        }

        let result = {
            let mut state = self.lock();
            state.puts.push(PutRecord {
                key: key.to_string(),
                content_type: content_type.to_string(),
                body,
            });

            if !state.exists {
                Err(BucketError::S3Error(format!("NoSuchBucket: {}", self.bucket)))
            } else if state.failing_keys.contains(key) {
                Err(BucketError::S3Error(format!("AccessDenied: {key}")))
            } else {
                Ok(())
            }
        };

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }
}
