//! Resolved deploy and invalidation targets

use tracing::warn;

use super::{DeployConfig, DeployEnvironment};

/// Where AWS credentials come from
#[derive(Clone, PartialEq, Eq)]
pub enum CredentialSource {
    /// Explicit key pair
    Static {
        /// Access key id
        access_key_id: String,
        /// Secret access key
        secret_access_key: String,
    },
    /// Named profile from the shared AWS config files
    Profile(String),
    /// Environment variables, shared files, or an instance role
    Ambient,
}

impl CredentialSource {
    /// Picks the credential source by priority
    ///
    /// A complete static key pair wins over a profile; with neither, ambient
    /// credentials are used. A half-configured key pair is ignored.
    #[must_use]
    pub fn resolve(
        access_key_id: Option<&str>,
        secret_access_key: Option<&str>,
        profile: Option<&str>,
    ) -> Self {
        match (access_key_id, secret_access_key) {
            (Some(access_key_id), Some(secret_access_key)) => {
                return Self::Static {
                    access_key_id: access_key_id.to_string(),
                    secret_access_key: secret_access_key.to_string(),
                };
            }
            (Some(_), None) | (None, Some(_)) => {
                warn!("Ignoring incomplete static credentials, both access key id and secret are required");
            }
            (None, None) => {}
        }

        profile.map_or(Self::Ambient, |name| Self::Profile(name.to_string()))
    }

    const fn is_static(&self) -> bool {
        matches!(self, Self::Static { .. })
    }
}

impl std::fmt::Debug for CredentialSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Static { access_key_id, .. } => f
                .debug_struct("Static")
                .field("access_key_id", access_key_id)
                .field("secret_access_key", &"<redacted>")
                .finish(),
            Self::Profile(name) => f.debug_tuple("Profile").field(name).finish(),
            Self::Ambient => f.write_str("Ambient"),
        }
    }
}

/// Bucket a deploy run writes to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployTarget {
    /// Bucket name, empty when nothing is configured
    pub bucket: String,
    /// Bucket region
    pub region: Option<String>,
    /// Credentials used by the S3 client
    pub credentials: CredentialSource,
    /// Path prefix inside the bucket
    pub remote_prefix: Option<String>,
    /// Custom S3 endpoint
    pub endpoint_url: Option<String>,
    /// Use path-style addressing
    pub force_path_style: bool,
}

impl DeployTarget {
    /// Resolves the target for an environment
    ///
    /// Staging and preview always use their dedicated bucket. A missing
    /// bucket is not rejected here; the first S3 call reports it.
    #[must_use]
    pub fn resolve(config: &DeployConfig, environment: DeployEnvironment) -> Self {
        let bucket = match environment {
            DeployEnvironment::Production => config.s3.bucket.clone(),
            DeployEnvironment::Staging => config.environments.staging_bucket.clone(),
            DeployEnvironment::Preview => config.environments.preview_bucket.clone(),
        };

        let bucket = bucket.unwrap_or_else(|| {
            warn!("No bucket configured for environment {}", environment);
            String::new()
        });

        Self {
            bucket,
            region: config.s3.region.clone(),
            credentials: CredentialSource::resolve(
                config.s3.access_key_id.as_deref(),
                config.s3.secret_access_key.as_deref(),
                config.s3.profile.as_deref(),
            ),
            remote_prefix: config
                .s3
                .remote_path
                .as_deref()
                .map(|p| p.trim_matches('/').to_string())
                .filter(|p| !p.is_empty()),
            endpoint_url: config.s3.endpoint_url.clone(),
            force_path_style: config.s3.force_path_style,
        }
    }
}

/// CloudFront distribution to invalidate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CdnTarget {
    /// Distribution id, `None` disables invalidation
    pub distribution_id: Option<String>,
    /// Region for the CloudFront client
    pub region: Option<String>,
    /// Credentials used by the CloudFront client
    pub credentials: CredentialSource,
}

impl CdnTarget {
    /// Resolves the invalidation target
    ///
    /// CloudFront keys win, then the S3 keys, then the CloudFront profile,
    /// then ambient credentials.
    #[must_use]
    pub fn resolve(config: &DeployConfig) -> Self {
        let cdn = &config.cdn;
        let own = CredentialSource::resolve(
            cdn.access_key_id.as_deref(),
            cdn.secret_access_key.as_deref(),
            None,
        );

        let credentials = if own.is_static() {
            own
        } else {
            let shared = CredentialSource::resolve(
                config.s3.access_key_id.as_deref(),
                config.s3.secret_access_key.as_deref(),
                None,
            );
            if shared.is_static() {
                shared
            } else {
                cdn.profile
                    .clone()
                    .map_or(CredentialSource::Ambient, CredentialSource::Profile)
            }
        };

        Self {
            distribution_id: cdn.distribution_id.clone(),
            region: cdn.region.clone(),
            credentials,
        }
    }
}
