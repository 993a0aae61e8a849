use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

mod commands;
mod output;
mod runtime;

use commands::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = config::load(cli.config.as_deref())?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.observability.logging_level));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    match cli.command {
        Commands::Classify(args) => commands::classify::run(args, &config, cli.json),
        Commands::Plan(args) => commands::plan::run(args, &config, cli.json),
        Commands::Report(args) => commands::report::run(args, &config, cli.json).await,
        Commands::Alerts(args) => commands::alerts::run(args, &config, cli.json).await,
    }
}
