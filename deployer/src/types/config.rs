//! Typed deployer configuration
//!
//! Configuration is read once from a TOML file, then environment variable
//! overrides are applied and the result is validated. Everything downstream
//! works with these structs rather than looking options up by name.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::engine::DEFAULT_CONCURRENCY;

/// Default config file looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "deployer.toml";
/// Default directory for deploy cache files
pub const DEFAULT_CACHE_DIR: &str = ".deploy-cache";

/// Overrides the production bucket
pub const ENV_BUCKET: &str = "AWS_S3_BUCKET";
/// Overrides the staging bucket
pub const ENV_BUCKET_STAGING: &str = "AWS_S3_BUCKET_STAGING";
/// Overrides the preview bucket
pub const ENV_BUCKET_PREVIEW: &str = "AWS_S3_BUCKET_PREVIEW";
/// Overrides the S3 access key id
pub const ENV_ACCESS_KEY_ID: &str = "S3_ACCESS_KEY_ID";
/// Overrides the S3 secret access key
pub const ENV_SECRET_ACCESS_KEY: &str = "S3_SECRET_ACCESS_KEY";
/// Overrides the CloudFront distribution id
pub const ENV_DISTRIBUTION_ID: &str = "CF_DISTRIBUTION_ID";

/// Result type for configuration loading
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors that can occur while loading configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("Failed to read config file {}: {source}", path.display())]
    Io {
        /// Path of the config file
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid TOML or has unknown keys
    #[error("Invalid config file: {0}")]
    Parse(#[from] toml::de::Error),

    /// Unknown deploy environment name
    #[error("Unknown deploy environment: {0} (expected production, staging or preview)")]
    UnknownEnvironment(String),

    /// Upload concurrency must be at least one
    #[error("Invalid concurrency: {0} (must be at least 1)")]
    InvalidConcurrency(usize),
}

/// Root configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DeployConfig {
    /// Target bucket and credentials
    pub s3: S3Config,
    /// Buckets forced by the staging and preview environments
    pub environments: EnvironmentBuckets,
    /// CloudFront invalidation settings
    pub cdn: CdnConfig,
    /// Local deploy settings
    pub deploy: DeploySettings,
}

/// `[s3]` section
#[derive(Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct S3Config {
    /// Production bucket name
    pub bucket: Option<String>,
    /// Bucket region
    pub region: Option<String>,
    /// Static access key id
    pub access_key_id: Option<String>,
    /// Static secret access key, already decrypted
    pub secret_access_key: Option<String>,
    /// Named credentials profile
    pub profile: Option<String>,
    /// Optional path prefix inside the bucket
    pub remote_path: Option<String>,
    /// Custom endpoint, e.g. `LocalStack` or `MinIO`
    pub endpoint_url: Option<String>,
    /// Use path-style addressing
    pub force_path_style: bool,
}

/// `[environments]` section
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EnvironmentBuckets {
    /// Bucket used for `--env staging`
    pub staging_bucket: Option<String>,
    /// Bucket used for `--env preview`
    pub preview_bucket: Option<String>,
}

/// `[cdn]` section
#[derive(Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CdnConfig {
    /// CloudFront distribution to invalidate
    pub distribution_id: Option<String>,
    /// Region for the CloudFront client
    pub region: Option<String>,
    /// Named credentials profile for CloudFront
    pub profile: Option<String>,
    /// Static access key id for CloudFront
    pub access_key_id: Option<String>,
    /// Static secret access key for CloudFront
    pub secret_access_key: Option<String>,
    /// Invalidate after every successful deploy command
    pub invalidate_after_deploy: bool,
}

/// `[deploy]` section
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DeploySettings {
    /// Rendered site directory
    pub site_path: Option<PathBuf>,
    /// Number of concurrent uploads
    pub concurrency: usize,
    /// Directory holding deploy cache files
    pub cache_dir: PathBuf,
}

impl Default for DeploySettings {
    fn default() -> Self {
        Self {
            site_path: None,
            concurrency: DEFAULT_CONCURRENCY,
            cache_dir: PathBuf::from(DEFAULT_CACHE_DIR),
        }
    }
}

impl DeployConfig {
    /// Parses and validates a TOML document
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Parse` for invalid TOML or unknown keys and
    /// `ConfigError::InvalidConcurrency` if `deploy.concurrency` is zero
    pub fn from_toml_str(contents: &str) -> ConfigResult<Self> {
        let config: Self = toml::from_str(contents)?;
        config.normalized().validated()
    }

    /// Loads the configuration with environment overrides applied
    ///
    /// With no explicit path, `deployer.toml` in the working directory is used
    /// when present and defaults otherwise. An explicit path must exist.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file cannot be read, parsed or validated
    pub fn load(path: Option<&Path>) -> ConfigResult<Self> {
        let (path, required) = match path {
            Some(path) => (path.to_path_buf(), true),
            None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
        };

        let config = match std::fs::read_to_string(&path) {
            Ok(contents) => Self::from_toml_str(&contents)?,
            Err(e) if e.kind() == ErrorKind::NotFound && !required => {
                debug!("No config file at {}, using defaults", path.display());
                Self::default()
            }
            Err(source) => return Err(ConfigError::Io { path, source }),
        };

        config
            .with_overrides(|key| std::env::var(key).ok())
            .validated()
    }

    /// Applies overrides from a variable lookup
    ///
    /// Blank override values are ignored.
    #[must_use]
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| non_blank(lookup(key));

        if let Some(bucket) = get(ENV_BUCKET) {
            self.s3.bucket = Some(bucket);
        }
        if let Some(bucket) = get(ENV_BUCKET_STAGING) {
            self.environments.staging_bucket = Some(bucket);
        }
        if let Some(bucket) = get(ENV_BUCKET_PREVIEW) {
            self.environments.preview_bucket = Some(bucket);
        }
        if let Some(key_id) = get(ENV_ACCESS_KEY_ID) {
            self.s3.access_key_id = Some(key_id);
        }
        if let Some(secret) = get(ENV_SECRET_ACCESS_KEY) {
            self.s3.secret_access_key = Some(secret);
        }
        if let Some(distribution_id) = get(ENV_DISTRIBUTION_ID) {
            self.cdn.distribution_id = Some(distribution_id);
        }

        self
    }

    /// Validates value ranges
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidConcurrency` if `deploy.concurrency` is zero
    pub fn validated(self) -> ConfigResult<Self> {
        if self.deploy.concurrency == 0 {
            return Err(ConfigError::InvalidConcurrency(self.deploy.concurrency));
        }
        Ok(self)
    }

    // Empty strings mean "unset", as the options are edited as free text
    fn normalized(mut self) -> Self {
        let s3 = &mut self.s3;
        for field in [
            &mut s3.bucket,
            &mut s3.region,
            &mut s3.access_key_id,
            &mut s3.secret_access_key,
            &mut s3.profile,
            &mut s3.remote_path,
            &mut s3.endpoint_url,
        ] {
            *field = non_blank(field.take());
        }

        let cdn = &mut self.cdn;
        for field in [
            &mut cdn.distribution_id,
            &mut cdn.region,
            &mut cdn.profile,
            &mut cdn.access_key_id,
            &mut cdn.secret_access_key,
        ] {
            *field = non_blank(field.take());
        }

        let envs = &mut self.environments;
        for field in [&mut envs.staging_bucket, &mut envs.preview_bucket] {
            *field = non_blank(field.take());
        }

        self
    }
}

// Secrets stay out of logs
impl std::fmt::Debug for S3Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("S3Config")
            .field("bucket", &self.bucket)
            .field("region", &self.region)
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &redacted(self.secret_access_key.as_ref()))
            .field("profile", &self.profile)
            .field("remote_path", &self.remote_path)
            .field("endpoint_url", &self.endpoint_url)
            .field("force_path_style", &self.force_path_style)
            .finish()
    }
}

impl std::fmt::Debug for CdnConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CdnConfig")
            .field("distribution_id", &self.distribution_id)
            .field("region", &self.region)
            .field("profile", &self.profile)
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &redacted(self.secret_access_key.as_ref()))
            .field("invalidate_after_deploy", &self.invalidate_after_deploy)
            .finish()
    }
}

fn redacted(secret: Option<&String>) -> Option<&'static str> {
    secret.map(|_| "<redacted>")
}

pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
