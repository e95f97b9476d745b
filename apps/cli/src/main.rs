//! composefn CLI - build function responses from request documents.
//!
//! Reads a `RunFunctionRequest` as JSON, applies context writes,
//! requirements and results, and prints the resulting response.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli)
}
