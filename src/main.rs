use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use kmt_collab::{Collab, FileStorage, LocalDatabase};
use log::error;

use crate::{cli::Cli, config::AppConfig};

mod cli;
mod config;
mod logging;

async fn run(cli: Cli) -> Result<()> {
    let config = AppConfig::from_env()?;

    let storage = FileStorage::open(&config.data_path)
        .with_context(|| format!("Could not open {}", config.data_path.display()))?;
    let database = LocalDatabase::open(storage, &config.academy)?;

    let collab = Collab::new(database, config.academy);

    collab.auth.restore().await?;

    cli::execute(cli.command, &collab).await
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = logging::init_logger(cli.verbose) {
        eprintln!("Could not set up logging: {e}");
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e.to_string().bold());

            for cause in e.chain().skip(1) {
                error!("Caused by: {}", cause);
            }

            ExitCode::FAILURE
        }
    }
}
