//! In-memory deploy cache

use std::collections::HashSet;

use tokio::sync::Mutex;

use crate::{CacheResult, DeployCache};

/// In-process deploy cache that lives for the lifetime of the value
#[derive(Debug, Default)]
pub struct MemoryDeployCache {
    keys: Mutex<HashSet<String>>,
}

impl MemoryDeployCache {
    /// Creates an empty cache
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a cache pre-populated with the given keys
    #[must_use]
    pub fn with_keys<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            keys: Mutex::new(keys.into_iter().map(Into::into).collect()),
        }
    }

    /// Snapshot of the recorded keys
    pub async fn keys(&self) -> HashSet<String> {
        self.keys.lock().await.clone()
    }
}

#[async_trait::async_trait]
impl DeployCache for MemoryDeployCache {
    async fn contains(&self, cache_key: &str) -> CacheResult<bool> {
        Ok(self.keys.lock().await.contains(cache_key))
    }

    async fn add(&self, cache_key: &str) -> CacheResult<()> {
        self.keys.lock().await.insert(cache_key.to_string());
        Ok(())
    }

    async fn len(&self) -> CacheResult<usize> {
        Ok(self.keys.lock().await.len())
    }

    async fn clear(&self) -> CacheResult<()> {
        self.keys.lock().await.clear();
        Ok(())
    }
}
