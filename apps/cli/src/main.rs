//! Eloquent CLI - read a directory tree and run it through plugins.
//!
//! Ships with a regex lint plugin as a working example of the plugin API.

mod commands;
mod lint;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
