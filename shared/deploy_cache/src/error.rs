//! Error types for deploy cache operations

use std::path::PathBuf;

use thiserror::Error;

/// Result type for deploy cache operations
pub type CacheResult<T> = Result<T, CacheError>;

/// Errors that can occur during deploy cache operations
#[derive(Error, Debug)]
pub enum CacheError {
    /// Failed to read or write the cache file
    #[error("Failed to access deploy cache at {}: {source}", path.display())]
    Io {
        /// Path of the cache file
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Failed to encode a cache key
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

impl CacheError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
