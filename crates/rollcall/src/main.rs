mod cli;

use anyhow::Result;
use clap::Parser;

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = cli::context::load_config(&cli)?;

    match cli.command {
        Commands::Members => cli::members::run(&config).await,
        Commands::Votes => cli::votes::run(&config).await,
        Commands::Resolve { all } => cli::resolve::run(&config, all).await,
        Commands::Education { no_votesmart } => cli::education::run(&config, !no_votesmart).await,
        Commands::Aggregate => cli::aggregate::run(&config).await,
    }
}
