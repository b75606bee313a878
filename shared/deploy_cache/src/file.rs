//! Deploy cache persisted as JSON lines

use std::collections::HashSet;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::{CacheError, CacheResult, DeployCache};

const CACHE_FILE_EXTENSION: &str = "jsonl";

/// Deploy cache persisted as an append-only JSON lines file
///
/// Each line holds one JSON-encoded cache key. The whole file is loaded when
/// the cache is opened; every `add` appends and flushes a line before
/// returning, so a key that was reported as recorded survives a crash.
#[derive(Debug)]
pub struct FileDeployCache {
    path: PathBuf,
    keys: Mutex<HashSet<String>>,
}

impl FileDeployCache {
    /// Opens the cache for `namespace` inside `cache_dir`
    ///
    /// The namespace is usually the target bucket name, so that each bucket
    /// keeps its own record of deployed files.
    ///
    /// # Errors
    ///
    /// Returns `CacheError::Io` if the directory cannot be created or the
    /// existing cache file cannot be read
    pub async fn open(cache_dir: impl AsRef<Path>, namespace: &str) -> CacheResult<Self> {
        let file_name = format!("{}.{CACHE_FILE_EXTENSION}", sanitize_namespace(namespace));
        Self::open_path(cache_dir.as_ref().join(file_name)).await
    }

    /// Opens the cache stored at an explicit file path
    ///
    /// # Errors
    ///
    /// Returns `CacheError::Io` if the parent directory cannot be created or
    /// the file exists but cannot be read
    pub async fn open_path(path: impl Into<PathBuf>) -> CacheResult<Self> {
        let path = path.into();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| CacheError::io(parent, e))?;
        }

        let keys = match fs::read_to_string(&path).await {
            Ok(contents) => parse_keys(&path, &contents),
            Err(e) if e.kind() == ErrorKind::NotFound => HashSet::new(),
            Err(e) => return Err(CacheError::io(&path, e)),
        };

        debug!("Opened deploy cache {} with {} keys", path.display(), keys.len());

        Ok(Self {
            path,
            keys: Mutex::new(keys),
        })
    }

    /// Location of the cache file
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait::async_trait]
impl DeployCache for FileDeployCache {
    async fn contains(&self, cache_key: &str) -> CacheResult<bool> {
        Ok(self.keys.lock().await.contains(cache_key))
    }

    async fn add(&self, cache_key: &str) -> CacheResult<()> {
        // Held across the write so appends from concurrent uploads never interleave
        let mut keys = self.keys.lock().await;
        if keys.contains(cache_key) {
            return Ok(());
        }

        let mut line = serde_json::to_string(cache_key)?;
        line.push('\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(|e| CacheError::io(&self.path, e))?;
        file.write_all(line.as_bytes())
            .await
            .map_err(|e| CacheError::io(&self.path, e))?;
        file.flush()
            .await
            .map_err(|e| CacheError::io(&self.path, e))?;

        keys.insert(cache_key.to_string());
        Ok(())
    }

    async fn len(&self) -> CacheResult<usize> {
        Ok(self.keys.lock().await.len())
    }

    async fn clear(&self) -> CacheResult<()> {
        let mut keys = self.keys.lock().await;
        match fs::remove_file(&self.path).await {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(CacheError::io(&self.path, e)),
        }
        keys.clear();
        Ok(())
    }
}

fn parse_keys(path: &Path, contents: &str) -> HashSet<String> {
    contents
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .filter_map(|(idx, line)| match serde_json::from_str::<String>(line) {
            Ok(key) => Some(key),
            Err(e) => {
                warn!(
                    "Skipping malformed deploy cache entry at {}:{}: {}",
                    path.display(),
                    idx + 1,
                    e
                );
                None
            }
        })
        .collect()
}

fn sanitize_namespace(namespace: &str) -> String {
    let sanitized: String = namespace
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();

    if sanitized.is_empty() {
        "default".to_string()
    } else {
        sanitized
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_namespace() {
        assert_eq!(sanitize_namespace("my-site.example.com"), "my-site.example.com");
        assert_eq!(sanitize_namespace("a/b\\c d"), "a_b_c_d");
        assert_eq!(sanitize_namespace(""), "default");
    }

    #[test]
    fn test_parse_keys_skips_malformed_lines() {
        let contents = "\"index.html\"\nnot json\n\n\"assets/style.css\"\n";
        let keys = parse_keys(Path::new("cache.jsonl"), contents);

        assert_eq!(keys.len(), 2);
        assert!(keys.contains("index.html"));
        assert!(keys.contains("assets/style.css"));
    }
}
