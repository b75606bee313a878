//! Deploy cache for the static site deployer
//!
//! The deploy cache remembers which files (by cache key) have already been
//! confirmed uploaded, so that repeated deploys of an unchanged site tree do
//! not upload anything. Keys are only ever added by the deployer; clearing the
//! cache is an operator action.

#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    dead_code
)]

mod error;
mod file;
mod memory;

pub use error::{CacheError, CacheResult};
pub use file::FileDeployCache;
pub use memory::MemoryDeployCache;

/// Set of cache keys already deployed to a target
///
/// Implementations must be safe to share between concurrent upload tasks.
#[async_trait::async_trait]
pub trait DeployCache: Send + Sync {
    /// Returns `true` if the key was recorded by a previous upload
    ///
    /// # Errors
    ///
    /// Returns `CacheError` if the backing store cannot be read
    async fn contains(&self, cache_key: &str) -> CacheResult<bool>;

    /// Records a key as deployed
    ///
    /// Adding a key that is already present is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `CacheError` if the backing store cannot be written
    async fn add(&self, cache_key: &str) -> CacheResult<()>;

    /// Number of recorded keys
    ///
    /// # Errors
    ///
    /// Returns `CacheError` if the backing store cannot be read
    async fn len(&self) -> CacheResult<usize>;

    /// Forgets every recorded key
    ///
    /// # Errors
    ///
    /// Returns `CacheError` if the backing store cannot be removed
    async fn clear(&self) -> CacheResult<()>;
}
