//! Static site deployer for S3 website buckets

#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    dead_code
)]

/// AWS client construction
pub mod aws;

/// S3 bucket provisioning and uploads
pub mod bucket;

/// CloudFront invalidation
pub mod cdn;

/// Command line arguments
pub mod cli;

/// Command handlers behind the CLI
pub mod commands;

/// Content type lookup by file extension
pub mod content_type;

/// Deploy orchestration
pub mod engine;

/// Configuration and resolved targets
pub mod types;

/// Site directory traversal
pub mod walker;

pub use engine::{DeploySummary, Deployer};
