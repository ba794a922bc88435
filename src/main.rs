#![recursion_limit = "256"]

mod cli;
mod application;
mod domain;
mod data;
mod ml;
mod infra;

use anyhow::Result;
use cli::Cli;
use clap::Parser;

fn main() -> Result<()> {
    let command = Cli::parse().into_command();

    // Held until exit so the file writer flushes
    let _log_guard = infra::logging::init(command.output_dir(), command.log_file_name())?;

    if let Err(err) = command.run() {
        tracing::error!("{err:#}");
        return Err(err);
    }
    Ok(())
}
