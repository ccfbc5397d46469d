//! Hostage Chess referee - command line entry point.

#![warn(missing_docs)]

use anyhow::Result;
use clap::Parser;
use hostage_referee::{Cli, RefereeConfig, run};
use tracing::{debug, instrument};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => RefereeConfig::from_file(path)?,
        None => RefereeConfig::default(),
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.log_filter())),
        )
        .with_writer(std::io::stderr)
        .init();

    execute(&cli, &config)
}

#[instrument(skip_all, fields(command = ?cli.command))]
fn execute(cli: &Cli, config: &RefereeConfig) -> Result<()> {
    debug!(?config, "Running command");
    let output = run(&cli.command, config)?;
    println!("{}", output);
    Ok(())
}
