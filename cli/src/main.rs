mod cli;
mod commands;

use anyhow::{Context as _, Result};
use clap::Parser;
use nerdmath_config::AppConfig;
use nerdmath_observability::{init_tracing, TracingConfig};

use cli::Cli;
use commands::Context;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.env_file {
        Some(path) => AppConfig::from_env_file(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => AppConfig::from_env().context("Failed to load configuration")?,
    };

    init_tracing(TracingConfig::for_service("nerdmath-cli").to_stderr());
    tracing::debug!(command = ?cli.command, "Running command");

    let ctx = Context { config, json: cli.json };
    commands::run(&ctx, cli.command).await
}
