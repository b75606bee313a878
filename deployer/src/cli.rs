//! Command line interface definition

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::types::DeployEnvironment;

/// Deploys a rendered static site to an S3 website bucket
#[derive(Debug, Parser)]
#[command(name = "deployer", version, about)]
pub struct Cli {
    /// Config file, `deployer.toml` in the working directory by default
    #[arg(long, global = true, env = "DEPLOYER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log output format
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text, env = "LOG_FORMAT")]
    pub log_format: LogFormat,

    /// Command to run
    #[command(subcommand)]
    pub command: Command,
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human readable lines
    Text,
    /// One JSON object per line
    Json,
}

/// Top level commands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Upload new files of the site to the bucket
    Deploy(DeployArgs),
    /// Invalidate every path of the configured CloudFront distribution
    Invalidate,
    /// Inspect or reset the deploy cache
    Cache {
        /// Cache action
        #[command(subcommand)]
        action: CacheAction,
    },
}

/// Arguments of `deploy`
#[derive(Debug, Args)]
pub struct DeployArgs {
    /// Site directory, overrides `deploy.site_path`
    #[arg(long)]
    pub path: Option<PathBuf>,

    /// Target environment
    #[arg(long, default_value = "production")]
    pub env: DeployEnvironment,

    /// Invalidate the CloudFront distribution afterwards
    #[arg(long)]
    pub invalidate: bool,

    /// Exit with an error when any file failed to upload
    #[arg(long)]
    pub strict: bool,

    /// Concurrent uploads, overrides `deploy.concurrency`
    #[arg(long, value_parser = clap::value_parser!(u16).range(1..))]
    pub concurrency: Option<u16>,
}

/// Actions of `cache`
#[derive(Debug, Subcommand)]
pub enum CacheAction {
    /// Forget every deployed file so the next deploy uploads everything
    Clear(CacheArgs),
    /// Print how many files are recorded as deployed
    Status(CacheArgs),
}

/// Arguments shared by cache actions
#[derive(Debug, Args)]
pub struct CacheArgs {
    /// Environment whose bucket cache to use
    #[arg(long, default_value = "production")]
    pub env: DeployEnvironment,
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_deploy() {
        let cli = Cli::try_parse_from([
            "deployer",
            "--log-format",
            "json",
            "deploy",
            "--path",
            "public",
            "--env",
            "Staging",
            "--invalidate",
            "--concurrency",
            "4",
        ])
        .unwrap();

        assert_eq!(cli.log_format, LogFormat::Json);
        let Command::Deploy(args) = cli.command else {
            panic!("expected deploy command");
        };
        assert_eq!(args.path, Some(PathBuf::from("public")));
        assert_eq!(args.env, DeployEnvironment::Staging);
        assert!(args.invalidate);
        assert!(!args.strict);
        assert_eq!(args.concurrency, Some(4));
    }

    #[test]
    fn test_deploy_defaults_to_production() {
        let cli = Cli::try_parse_from(["deployer", "deploy"]).unwrap();
        let Command::Deploy(args) = cli.command else {
            panic!("expected deploy command");
        };
        assert_eq!(args.env, DeployEnvironment::Production);
        assert_eq!(args.concurrency, None);
    }

    #[test]
    fn test_rejects_unknown_environment_and_zero_concurrency() {
        assert!(Cli::try_parse_from(["deployer", "deploy", "--env", "qa"]).is_err());
        assert!(Cli::try_parse_from(["deployer", "deploy", "--concurrency", "0"]).is_err());
    }

    #[test]
    fn test_parse_cache_status() {
        let cli = Cli::try_parse_from(["deployer", "cache", "status", "--env", "preview"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Cache {
                action: CacheAction::Status(CacheArgs {
                    env: DeployEnvironment::Preview
                })
            }
        ));
    }
}
