use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use deployer::cli::{CacheAction, Cli, Command, LogFormat};
use deployer::commands;
use deployer::types::DeployConfig;

const DEFAULT_TRACING_LEVEL: &str = "info";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // RUST_LOG wins, then TRACING_LEVEL
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(
            std::env::var("TRACING_LEVEL").unwrap_or_else(|_| DEFAULT_TRACING_LEVEL.to_string()),
        )
    });

    match cli.log_format {
        LogFormat::Json => fmt().json().with_env_filter(filter).init(),
        LogFormat::Text => fmt().with_env_filter(filter).init(),
    }

    let config = DeployConfig::load(cli.config.as_deref())?;

    match cli.command {
        Command::Deploy(args) => {
            let cancel = CancellationToken::new();

            let signal_cancel = cancel.clone();
            tokio::spawn(async move {
                match tokio::signal::ctrl_c().await {
                    Ok(()) => {
                        warn!("Received Ctrl+C, finishing uploads in flight");
                        signal_cancel.cancel();
                    }
                    Err(e) => {
                        error!("Failed to listen for Ctrl+C: {}", e);
                    }
                }
            });

            let summary = commands::deploy(&config, &args, &cancel).await?;
            info!(
                uploaded = summary.uploaded,
                skipped = summary.skipped,
                failed = summary.failed,
                cancelled = summary.cancelled,
                "Deploy summary"
            );

            if args.strict {
                anyhow::ensure!(summary.failed == 0, "{} file(s) failed to deploy", summary.failed);
                anyhow::ensure!(!summary.cancelled, "Deploy was cancelled");
            }
        }
        Command::Invalidate => {
            commands::invalidate(&config).await;
        }
        Command::Cache { action } => match action {
            CacheAction::Status(args) => {
                let count = commands::cache_status(&config, args.env).await?;
                println!("{count}");
            }
            CacheAction::Clear(args) => commands::cache_clear(&config, args.env).await?,
        },
    }

    Ok(())
}
