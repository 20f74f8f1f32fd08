//! tavernd_init - One-time database initialization tool
//!
//! Creates a fresh server database, optionally seeded with the reference
//! sessions.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Tavern database initialization tool
#[derive(Parser, Debug)]
#[command(
    name = "tavernd_init",
    version,
    about = "Initialize a new tavern database"
)]
struct Args {
    /// Path to SQLite database file to create (must not exist)
    #[arg(short, long)]
    database: PathBuf,

    /// Do not store the reference sessions
    #[arg(long)]
    no_seed: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tavernd=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Parse CLI arguments
    let args = Args::parse();

    tavernd::init::init_database(&args.database, !args.no_seed).await?;

    Ok(())
}
