//! Configuration and the targets resolved from it

mod config;
mod environment;
mod target;

pub use config::{
    CdnConfig, ConfigError, ConfigResult, DeployConfig, DeploySettings, EnvironmentBuckets,
    S3Config,
};
pub(crate) use config::non_blank;
pub use environment::DeployEnvironment;
pub use target::{CdnTarget, CredentialSource, DeployTarget};
