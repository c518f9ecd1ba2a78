use anyhow::Result;
use clap::Parser;
use ctr_afm::cli::Cli;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("ctr_afm=info")),
        )
        .init();

    Cli::parse().run()
}
