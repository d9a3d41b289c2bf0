//! AssessRank CLI: assessment recommendations for hiring queries.
//!
//! Ranks catalog assessments semantically when an embedding key is
//! configured and by keyword scoring otherwise.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
