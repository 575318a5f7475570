//! IndexNow CLI — notify search engines about every URL in a sitemap.
//!
//! Verifies the site's key file, resolves the sitemap tree into a URL list,
//! and submits it to each IndexNow-compatible provider.

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
