//! streamlens CLI — the main entry point.
//!
//! Commands:
//! - `serve`  — Start the HTTP Q&A gateway
//! - `doctor` — Check configuration and credentials

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "streamlens",
    about = "streamlens — session-aware Q&A over Twitch chat logs",
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
    /// Start the HTTP gateway server
    Serve {
        /// Override the port
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Check configuration and credentials
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
        .init();

    match cli.command {
        Commands::Serve { port } => commands::serve::run(port).await?,
        Commands::Doctor => commands::doctor::run().await?,
    }

    Ok(())
}
