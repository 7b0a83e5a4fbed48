mod cli;

use clap::Parser;
use miette::Result;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    // Skip warnings should be visible without RUST_LOG
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = cli::Cli::parse();
    cli::run(&cli)?;
    Ok(())
}
