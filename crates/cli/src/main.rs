//! # Map Sync CLI
//!
//! `map-sync run` 驱动同步引擎（mock 驾驶或录制回放），
//! `validate` / `info` 检查蓝图。

mod cli;
mod commands;
mod error;
mod pipeline;

use anyhow::Result;
use clap::Parser;
use observability::ObservabilityConfig;
use tracing::{error, info};

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    observability::init_with_config(
        ObservabilityConfig::from_verbosity(cli.verbose, cli.quiet)
            .with_log_format(cli.log_format.into()),
    )?;
    info!(version = env!("CARGO_PKG_VERSION"), "map-sync starting");

    execute(&cli.command).await.inspect_err(|e| {
        error!(error = %e, "Command failed");
    })
}

async fn execute(command: &Commands) -> Result<()> {
    match command {
        Commands::Run(args) => commands::run_pipeline(args).await,
        Commands::Validate(args) => commands::run_validate(args),
        Commands::Info(args) => commands::run_info(args),
    }
}
