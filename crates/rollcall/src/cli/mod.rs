pub mod aggregate;
pub mod context;
pub mod education;
pub mod members;
pub mod report;
pub mod resolve;
pub mod votes;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "rollcall",
    about = "US House record reconciliation and ETL pipeline",
    version
)]
pub struct Cli {
    /// JSON config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
    /// Primary store database path
    #[arg(long, global = true)]
    pub primary: Option<PathBuf>,
    /// Secondary store database path
    #[arg(long, global = true)]
    pub secondary: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Ingest House members for the configured congresses
    Members,
    /// Ingest the configured roll-call votes
    Votes,
    /// Resolve knowledge graph ids and reference URLs
    Resolve {
        /// Re-resolve representatives that already have a URL
        #[arg(long)]
        all: bool,
    },
    /// Scrape education history into the primary store
    Education {
        /// Skip the Vote Smart fallback
        #[arg(long)]
        no_votesmart: bool,
    },
    /// Aggregate the primary store into the secondary store
    Aggregate,
}
