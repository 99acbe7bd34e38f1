mod cli;
mod tables;

use clap::{Parser, crate_version};
use irrigo::prelude::*;
use tracing_subscriber::EnvFilter;

use crate::cli::Args;

fn main() -> Result {
    let _ = dotenvy::dotenv();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .without_time()
        .compact()
        .init();
    info!(version = crate_version!(), "starting…");

    Args::parse().command.run()?;

    info!("done!");
    Ok(())
}
