//! CopyCraft CLI: research-to-article writing wizard.
//!
//! Walks a topic through headline research, outlining, and styling into a
//! finished long-form article with cited sources.

mod commands;
mod session;

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
