//! freefall - CLI entry point wiring the demo work to the file status store.

mod cli;
mod demo;

use std::process::ExitCode;

use clap::Parser;
use eyre::{Result, WrapErr};
use freefall_core::config::FreefallConfig;
use freefall_core::impls::FileStatusStore;
use freefall_core::FreefallBuilder;
use tracing::info;

use crate::cli::Cli;
use crate::demo::DemoWork;

fn setup_logging(verbose: bool) -> Result<()> {
    let level = if verbose { tracing::Level::DEBUG } else { tracing::Level::INFO };

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .try_init()
        .map_err(|e| eyre::eyre!("Failed to setup logging: {e}"))?;

    info!("Logging initialized (verbose: {})", verbose);
    Ok(())
}

async fn run(cli: Cli) -> Result<()> {
    let config = FreefallConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;

    let driver = FreefallBuilder::new(DemoWork::new(&cli.archive), FileStatusStore::new())
        .config(config)
        .build()
        .context("Invalid configuration")?;

    let summary = driver
        .download(cli.names)
        .await
        .context("Batch stopped")?;

    println!("{summary}");
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    if let Err(e) = setup_logging(cli.verbose) {
        eprintln!("{e:?}");
        return ExitCode::FAILURE;
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:?}");
            ExitCode::FAILURE
        }
    }
}
