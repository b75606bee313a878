//! Recursive listing of the files in a rendered site

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::warn;
use walkdir::WalkDir;

/// Errors that can occur when starting a walk
#[derive(Error, Debug)]
pub enum WalkError {
    /// The root does not exist or is not a directory
    #[error("Site directory not found: {}", .0.display())]
    NotFound(PathBuf),
}

/// A local file that can be deployed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployableFile {
    /// Absolute path on the local filesystem
    pub path: PathBuf,
    /// Path relative to the site root, `/` separated, no leading slash
    pub cache_key: String,
}

impl DeployableFile {
    /// Object key in the bucket, with an optional prefix
    #[must_use]
    pub fn remote_key(&self, prefix: Option<&str>) -> String {
        remote_object_key(prefix, &self.cache_key)
    }
}

/// Normalizes a root-relative path into a cache key
///
/// Backslashes become forward slashes and leading slashes are stripped, so
/// the same file produces the same key on every platform.
#[must_use]
pub fn normalize_cache_key(relative: &str) -> String {
    relative.replace('\\', "/").trim_start_matches('/').to_string()
}

/// Builds the remote object key for a cache key
///
/// A prefix that is empty once surrounding slashes are trimmed is treated as
/// no prefix.
#[must_use]
pub fn remote_object_key(prefix: Option<&str>, cache_key: &str) -> String {
    match prefix.map(|p| p.trim_matches('/')).filter(|p| !p.is_empty()) {
        Some(prefix) => format!("{prefix}/{cache_key}"),
        None => cache_key.to_string(),
    }
}

/// Lazy iterator over every regular file below a site root
///
/// Symlinks are followed. Entries that cannot be read are logged and skipped.
/// Iteration order follows the filesystem and must not be relied upon.
pub struct FileWalker {
    root: PathBuf,
    entries: walkdir::IntoIter,
}

impl FileWalker {
    /// Starts a walk below `root`
    ///
    /// # Errors
    ///
    /// Returns `WalkError::NotFound` if `root` is missing or not a directory
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, WalkError> {
        let root = root.into();
        if !root.is_dir() {
            return Err(WalkError::NotFound(root));
        }
        let Ok(root) = root.canonicalize() else {
            return Err(WalkError::NotFound(root));
        };

        let entries = WalkDir::new(&root).follow_links(true).into_iter();
        Ok(Self { root, entries })
    }

    // Object keys are UTF-8, so names that are not cannot be deployed
    fn to_deployable(&self, path: &Path) -> Option<DeployableFile> {
        let relative = path.strip_prefix(&self.root).ok()?.to_str()?;
        let cache_key = normalize_cache_key(relative);
        if cache_key.is_empty() {
            return None;
        }

        Some(DeployableFile {
            path: path.to_path_buf(),
            cache_key,
        })
    }
}

impl Iterator for FileWalker {
    type Item = DeployableFile;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let entry = match self.entries.next()? {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Skipping unreadable entry in site directory: {}", e);
                    continue;
                }
            };

            if !entry.file_type().is_file() {
                continue;
            }

            match self.to_deployable(entry.path()) {
                Some(file) => return Some(file),
                None => warn!("Trying to deploy unknown file: {}", entry.path().display()),
            }
        }
    }
}
