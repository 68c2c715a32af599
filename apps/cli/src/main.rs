//! contactpipe CLI — spreadsheet-to-CRM contact pipeline.
//!
//! Ingests tabular contact rows from a spreadsheet source, deduplicates and
//! normalizes them into canonical contacts, and delivers them to a CRM via
//! batched upserts.

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
