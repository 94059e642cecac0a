//! Vigil CLI
//!
//! Command-line interface for the Vigil telemetry API.
//!
//! # Usage
//!
//! ```bash
//! vigil --help
//! vigil health
//! vigil snapshot
//! vigil dashboard --interval-ms 2000 --window 20
//! ```

#![deny(unsafe_code)]

mod client;
mod dashboard;

use anyhow::Result;
use clap::{Parser, Subcommand};
use client::ApiClient;
use dashboard::{
    DashboardPoller, Render, TerminalRenderer, DEFAULT_POLL_INTERVAL_MS, DEFAULT_WINDOW,
};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Vigil CLI - telemetry API command-line interface
#[derive(Parser)]
#[command(name = "vigil")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// API server URL
    #[arg(
        short,
        long,
        env = "VIGIL_API_URL",
        default_value = "http://localhost:3001"
    )]
    api_url: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Check API server health
    Health,
    /// Print the current snapshot as JSON
    Snapshot,
    /// Live terminal dashboard
    Dashboard {
        /// Delay between polls, in milliseconds
        #[arg(
            long,
            default_value_t = DEFAULT_POLL_INTERVAL_MS,
            value_parser = clap::value_parser!(u64).range(1..)
        )]
        interval_ms: u64,

        /// Number of samples shown per chart
        #[arg(long, default_value_t = DEFAULT_WINDOW)]
        window: usize,

        /// Render a single frame and exit
        #[arg(long)]
        once: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Diagnostics go to stderr, frames to stdout
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Health) => {
            let client = ApiClient::new(&cli.api_url)?;
            let health = client.health().await?;
            println!(
                "{} is {} (version {}, at {})",
                health.service, health.status, health.version, health.timestamp
            );
        }
        Some(Commands::Snapshot) => {
            let client = ApiClient::new(&cli.api_url)?;
            let snapshot = client.snapshot().await?;
            println!("{}", serde_json::to_string_pretty(&snapshot)?);
        }
        Some(Commands::Dashboard {
            interval_ms,
            window,
            once,
        }) => {
            let client = ApiClient::new(&cli.api_url)?;
            let mut poller = DashboardPoller::new(client.clone(), window);

            if once {
                // A single frame propagates fetch errors
                let snapshot = client.snapshot().await?;
                poller.apply(&snapshot);
                TerminalRenderer::new(std::io::stdout()).render(&poller.frame())?;
            } else {
                let mut renderer = TerminalRenderer::stdout();
                tokio::select! {
                    result = poller.run(&mut renderer, Duration::from_millis(interval_ms)) => result?,
                    _ = tokio::signal::ctrl_c() => {}
                }
            }
        }
        None => {
            println!("Vigil CLI v{}", env!("CARGO_PKG_VERSION"));
            println!("Use --help for usage information");
        }
    }

    Ok(())
}
