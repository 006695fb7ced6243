//! Doppel CLI: the main entry point.
//!
//! Commands:
//! - `onboard`  Write the default config
//! - `gateway`  Start the HTTP server
//! - `reply`    One-shot reply for a profile file and a query
//! - `doctor`   Diagnose configuration and provider health

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(
    name = "doppel",
    about = "Doppel: persona-consistent replies for your digital clone",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Write the default configuration file
    Onboard,

    /// Start the HTTP gateway server
    Gateway {
        /// Override the port
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Synthesize a single reply and print it as JSON
    Reply {
        /// Clone profile file (.json or .toml)
        #[arg(short, long)]
        profile: PathBuf,

        /// The query to answer
        #[arg(short, long)]
        query: String,
    },

    /// Diagnose system health
    Doctor,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Onboard => commands::onboard::run().await?,
        Commands::Gateway { port } => commands::gateway::run(port).await?,
        Commands::Reply { profile, query } => commands::reply::run(&profile, query).await?,
        Commands::Doctor => commands::doctor::run().await?,
    }

    Ok(())
}
