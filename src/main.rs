use anyhow::Result;
use clap::Parser;
use downtidy::cli::{Cli, run_cli};

fn main() -> Result<()> {
    let cli = Cli::parse();
    cli.setup_logging();

    tracing::debug!("Starting with {:?}", cli);
    run_cli(&cli)
}
