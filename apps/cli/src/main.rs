//! ContractForge CLI — one-shot batch contract generator.
//!
//! Drafts state medical-transportation contracts from configuration records,
//! using an external text-generation API for prose and an external
//! HTML-to-PDF tool for rendering.

mod commands;

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
