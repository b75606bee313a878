//! Deploy environment selector

use std::str::FromStr;

use strum::Display;

use super::ConfigError;

/// Which bucket a deploy run targets
///
/// Staging and preview deploys go to their dedicated buckets; production uses
/// the bucket from the `[s3]` section.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum DeployEnvironment {
    /// Stored bucket
    #[default]
    Production,
    /// Staging bucket
    Staging,
    /// Preview bucket
    Preview,
}

impl FromStr for DeployEnvironment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "production" | "prod" => Ok(Self::Production),
            "staging" => Ok(Self::Staging),
            "preview" => Ok(Self::Preview),
            other => Err(ConfigError::UnknownEnvironment(other.to_string())),
        }
    }
}
